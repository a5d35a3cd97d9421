//! Namespace-qualified chain identifiers
//!
//! Chains are referenced by `"<namespace>:<reference>"` strings
//! (e.g. `eip155:11155111`, `solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp`).
//! Malformed identifiers are rejected at the parse boundary, never silently
//! defaulted.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported chain families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Ethereum and EVM-compatible chains
    Eip155,
    /// Solana
    Solana,
}

impl Namespace {
    /// Get all supported namespaces
    pub fn all() -> [Namespace; 2] {
        [Namespace::Eip155, Namespace::Solana]
    }

    /// Namespace prefix as it appears in chain identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Eip155 => "eip155",
            Namespace::Solana => "solana",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eip155" => Ok(Namespace::Eip155),
            "solana" => Ok(Namespace::Solana),
            other => Err(Error::InvalidChain(format!(
                "unknown namespace: {}",
                other
            ))),
        }
    }
}

/// A namespace-qualified chain reference
///
/// Invariants: the namespace is one of the supported families and the
/// reference is non-empty. Both are enforced by [`ChainRef::parse`]; a
/// `ChainRef` value is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainRef {
    namespace: Namespace,
    reference: String,
}

impl ChainRef {
    /// Parse a `"<namespace>:<reference>"` string
    pub fn parse(s: &str) -> Result<Self> {
        let (ns, reference) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidChain(format!("missing namespace separator: {}", s)))?;

        let namespace = ns.parse::<Namespace>()?;

        if reference.is_empty() {
            return Err(Error::InvalidChain(format!("empty chain reference: {}", s)));
        }

        Ok(Self {
            namespace,
            reference: reference.to_string(),
        })
    }

    /// Build a chain reference from parts
    pub fn new(namespace: Namespace, reference: impl Into<String>) -> Result<Self> {
        let reference = reference.into();
        if reference.is_empty() {
            return Err(Error::InvalidChain("empty chain reference".into()));
        }
        Ok(Self {
            namespace,
            reference,
        })
    }

    /// The chain family this reference belongs to
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The namespace-relative reference (chain id digits for EVM, genesis
    /// hash prefix for Solana)
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Check if this is a Solana chain
    pub fn is_solana(&self) -> bool {
        self.namespace == Namespace::Solana
    }

    /// Check if this is an EVM chain
    pub fn is_evm(&self) -> bool {
        self.namespace == Namespace::Eip155
    }

    /// Human-readable name for well-known chains
    pub fn name(&self) -> &'static str {
        match (self.namespace, self.reference.as_str()) {
            (Namespace::Eip155, "1") => "Ethereum Mainnet",
            (Namespace::Eip155, "11155111") => "Ethereum Sepolia",
            (Namespace::Eip155, "137") => "Polygon",
            (Namespace::Eip155, "10") => "Optimism",
            (Namespace::Eip155, "42161") => "Arbitrum One",
            (Namespace::Eip155, "8453") => "Base",
            (Namespace::Eip155, "84532") => "Base Sepolia",
            (Namespace::Solana, "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp") => "Solana Mainnet",
            (Namespace::Solana, "EtWTRABZaYq6iMfeYKouRu166VU2xqa1") => "Solana Devnet",
            (Namespace::Solana, "4uhcVJyU9pJkvQyS88uRDiswHXSCkY3z") => "Solana Testnet",
            _ => "Unknown Chain",
        }
    }
}

impl fmt::Display for ChainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl TryFrom<String> for ChainRef {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        ChainRef::parse(&s)
    }
}

impl From<ChainRef> for String {
    fn from(chain: ChainRef) -> String {
        chain.to_string()
    }
}
