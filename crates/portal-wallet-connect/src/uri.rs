//! Pairing URI parsing
//!
//! Sessions start from a pairing URI of the shape
//! `wc:<topic>@<version>?relay-protocol=<proto>&symKey=<hex>`. Malformed
//! URIs are rejected with a typed error; nothing is defaulted silently.

use crate::error::{ConnectError, Result};

/// A parsed pairing URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingUri {
    /// Session topic
    pub topic: String,
    /// Protocol version
    pub version: u8,
    /// Relay protocol name
    pub relay_protocol: String,
    /// Symmetric key for the session envelope (hex)
    pub sym_key: String,
}

impl PairingUri {
    /// Parse a pairing URI string
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("wc:")
            .ok_or_else(|| ConnectError::InvalidUri(format!("missing wc: scheme: {}", uri)))?;

        let (head, query) = rest
            .split_once('?')
            .ok_or_else(|| ConnectError::InvalidUri("missing query parameters".into()))?;

        let (topic, version) = head
            .split_once('@')
            .ok_or_else(|| ConnectError::InvalidUri("missing protocol version".into()))?;

        if topic.is_empty() {
            return Err(ConnectError::InvalidUri("empty topic".into()));
        }

        let version: u8 = version
            .parse()
            .map_err(|_| ConnectError::InvalidUri(format!("invalid version: {}", version)))?;

        let mut relay_protocol = None;
        let mut sym_key = None;

        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("relay-protocol", value)) => relay_protocol = Some(value.to_string()),
                Some(("symKey", value)) => sym_key = Some(value.to_string()),
                // Unknown parameters are tolerated for forward compatibility
                Some(_) | None => {}
            }
        }

        let sym_key =
            sym_key.ok_or_else(|| ConnectError::InvalidUri("missing symKey parameter".into()))?;

        if hex::decode(&sym_key).is_err() {
            return Err(ConnectError::InvalidUri("symKey is not hex".into()));
        }

        Ok(Self {
            topic: topic.to_string(),
            version,
            relay_protocol: relay_protocol
                .ok_or_else(|| ConnectError::InvalidUri("missing relay-protocol".into()))?,
            sym_key,
        })
    }
}
