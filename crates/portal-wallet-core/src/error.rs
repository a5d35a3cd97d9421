//! Error types for wallet SDK operations

use crate::chain::Namespace;
use thiserror::Error;

/// Result type alias for wallet SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during wallet SDK operations
#[derive(Debug, Error)]
pub enum Error {
    // ============ Validation Errors ============
    /// Malformed chain identifier (bad namespace or empty reference)
    #[error("Invalid chain identifier: {0}")]
    InvalidChain(String),

    /// Chain identifier is well-formed but not configured
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    /// Method not in the namespace's supported-method set
    #[error("Unsupported method for {namespace}: {method}")]
    UnsupportedMethod {
        namespace: Namespace,
        method: String,
    },

    /// Request parameters failed validation
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Signing-class method requested with no address known for the namespace
    #[error("No address configured for namespace {0}")]
    NoAddress(Namespace),

    // ============ Lifecycle Errors ============
    /// Share generation did not produce usable shares for every namespace
    #[error("Cannot create wallet: {0}")]
    CannotCreateWallet(String),

    /// Eject failed. The device share set may be partially consumed; this is
    /// fatal and must never be retried automatically.
    #[error("Eject failed (non-retryable): {0}")]
    EjectFailed(String),

    // ============ Collaborator Errors ============
    /// Opaque failure from the native signing capability
    #[error("Signer error: {0}")]
    Signer(String),

    /// Socket/HTTP failure, not distinguished further at this layer
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend accepted the request but reported a failure
    #[error("API error: {0}")]
    Api(String),

    // ============ Serialization Errors ============
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Check if this error may be safely retried by the caller.
    ///
    /// Retry policy itself is the caller's responsibility; the SDK never
    /// retries internally. Signing and eject operations are not idempotent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Api(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
