//! Error types for the session protocol peer

use thiserror::Error;

/// Session peer errors
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Malformed pairing URI
    #[error("Invalid pairing URI: {0}")]
    InvalidUri(String),

    /// Socket-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed inbound protocol message. These are logged and dropped by
    /// the receive loop, never surfaced to the host.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure propagated from the provider layer
    #[error(transparent)]
    Core(#[from] portal_wallet_core::Error),
}

impl From<serde_json::Error> for ConnectError {
    fn from(err: serde_json::Error) -> Self {
        ConnectError::Serialization(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ConnectError>;
