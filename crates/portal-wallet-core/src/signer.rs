//! Opaque MPC signer capability
//!
//! The actual threshold cryptography lives in a native signing binary. This
//! module defines the capability surface the orchestration layer consumes:
//! four primitive operations, each reporting progress through a caller
//! supplied sink and returning a terminal result or error.

use crate::chain::Namespace;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Named phases reported while a signer operation runs
///
/// Phases advance monotonically; consumers may observe duplicates of the same
/// phase but never a regression. The orchestrator forwards what the signer
/// reports without fabricating or reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MpcPhase {
    GeneratingShare,
    ParsingShare,
    EncryptingShare,
    StoringShare,
    ReadingShare,
    DecryptingShare,
    RecoveringSigningShare,
    RecoveringBackupShare,
    Done,
}

impl MpcPhase {
    /// Wire name of this phase
    pub fn as_str(&self) -> &'static str {
        match self {
            MpcPhase::GeneratingShare => "generatingShare",
            MpcPhase::ParsingShare => "parsingShare",
            MpcPhase::EncryptingShare => "encryptingShare",
            MpcPhase::StoringShare => "storingShare",
            MpcPhase::ReadingShare => "readingShare",
            MpcPhase::DecryptingShare => "decryptingShare",
            MpcPhase::RecoveringSigningShare => "recoveringSigningShare",
            MpcPhase::RecoveringBackupShare => "recoveringBackupShare",
            MpcPhase::Done => "done",
        }
    }
}

impl fmt::Display for MpcPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-way progress stream pushed during signer operations
pub type ProgressSink = Arc<dyn Fn(MpcPhase) + Send + Sync>;

/// A progress sink that discards all phases
pub fn progress_discard() -> ProgressSink {
    Arc::new(|_| {})
}

/// Backup/recovery custody method chosen by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackupMethod {
    GoogleDrive,
    Icloud,
    Password,
    Passkey,
    Local,
}

impl BackupMethod {
    /// Wire name of this method
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupMethod::GoogleDrive => "GOOGLE_DRIVE",
            BackupMethod::Icloud => "ICLOUD",
            BackupMethod::Password => "PASSWORD",
            BackupMethod::Passkey => "PASSKEY",
            BackupMethod::Local => "LOCAL",
        }
    }
}

impl fmt::Display for BackupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated signing share: never a full private key
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SignerShare {
    /// Backend identifier for this share
    #[zeroize(skip)]
    pub id: String,
    /// Address derived for the share's namespace
    #[zeroize(skip)]
    pub address: String,
    /// Opaque serialized share material
    pub share: String,
}

impl fmt::Debug for SignerShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerShare")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("share", &"[REDACTED]")
            .finish()
    }
}

/// Addresses produced for every supported namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddresses {
    /// EVM address (`0x`-prefixed)
    pub eip155: String,
    /// Solana address (base58)
    pub solana: String,
}

/// Result of a backup operation: encrypted share material plus the backend
/// ids that identify it for the storage confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupShares {
    /// Encrypted backup share set
    pub cipher_text: String,
    /// Backend share ids covered by the cipher text
    pub share_ids: Vec<String>,
}

/// Result of a recovery operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveredWallet {
    /// Recovered addresses for both namespaces
    pub addresses: WalletAddresses,
    /// Backend ids of the freshly-rotated signing shares
    pub share_ids: Vec<String>,
}

/// Fully reconstructed keys after an eject
///
/// Holding this value ends the MPC custody model for the wallet.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct EjectedKeys {
    /// Reconstructed EVM private key (hex)
    pub eip155_private_key: String,
    /// Reconstructed Solana private key (base58)
    pub solana_private_key: String,
}

impl fmt::Debug for EjectedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EjectedKeys")
            .field("eip155_private_key", &"[REDACTED]")
            .field("solana_private_key", &"[REDACTED]")
            .finish()
    }
}

/// Opaque capability over the native MPC signing binary
///
/// Implementations run the share-generation/backup/recover/eject primitives
/// and push progress phases into the supplied sink. Every operation is a
/// single invocation; the orchestration layer never retries.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Generate signing shares for every supported namespace
    async fn generate(&self, progress: ProgressSink) -> Result<HashMap<Namespace, SignerShare>>;

    /// Produce an encrypted backup of the signing shares
    async fn backup(&self, method: BackupMethod, progress: ProgressSink) -> Result<BackupShares>;

    /// Rebuild signing shares from a backup cipher text
    async fn recover(
        &self,
        method: BackupMethod,
        cipher_text: &str,
        progress: ProgressSink,
    ) -> Result<RecoveredWallet>;

    /// Irreversibly reconstruct the full keys from device and organization
    /// shares. Terminal for the wallet's MPC shares.
    async fn eject(
        &self,
        method: BackupMethod,
        cipher_text: &str,
        org_backup_shares: &str,
        progress: ProgressSink,
    ) -> Result<EjectedKeys>;
}
