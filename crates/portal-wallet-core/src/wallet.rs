//! Wallet lifecycle orchestration
//!
//! Each flow is a short linear pipeline over the injected signer and backend:
//! a step's failure short-circuits the remaining steps and propagates a typed
//! error. The orchestrator owns no persistent state and never retries; eject
//! in particular is terminal and a retry would be catastrophic.

use crate::api::{RemoteClient, ShareKind, ShareStatus};
use crate::chain::Namespace;
use crate::error::{Error, Result};
use crate::signer::{
    BackupMethod, EjectedKeys, ProgressSink, Signer, WalletAddresses,
};
use std::sync::Arc;
use tracing::{info, warn};

/// One-shot capability confirming off-device durability of a backup share
///
/// Returned by [`WalletOrchestrator::backup_wallet`]. The SDK cannot know
/// whether the caller's own custodian durably stored the cipher text, so the
/// share is not marked stored server-side until the caller invokes
/// [`confirm`](StorageConfirmation::confirm). Consuming `self` makes the
/// at-most-once contract visible in the type: a confirmation cannot be
/// replayed, and dropping it leaves the share unconfirmed server-side.
pub struct StorageConfirmation {
    api: Arc<dyn RemoteClient>,
    share_ids: Vec<String>,
}

impl StorageConfirmation {
    /// Report the backup share as durably stored, exactly once
    pub async fn confirm(self) -> Result<()> {
        self.api
            .update_share_status(
                ShareKind::Backup,
                &self.share_ids,
                ShareStatus::StoredClientBackupShare,
            )
            .await
    }

    /// Backend share ids this confirmation covers
    pub fn share_ids(&self) -> &[String] {
        &self.share_ids
    }
}

impl std::fmt::Debug for StorageConfirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfirmation")
            .field("share_ids", &self.share_ids)
            .finish()
    }
}

/// Result of a backup flow: the cipher text to hand to the caller's custodian
/// plus the deferred storage confirmation
#[derive(Debug)]
pub struct BackupArtifact {
    /// Encrypted backup share set
    pub cipher_text: String,
    /// Deferred side effect; invoke after the cipher text is durably stored
    pub storage_confirm: StorageConfirmation,
}

/// Coordinator for the multi-step wallet lifecycle flows
pub struct WalletOrchestrator {
    signer: Arc<dyn Signer>,
    api: Arc<dyn RemoteClient>,
}

impl WalletOrchestrator {
    /// Create an orchestrator over a signer and backend
    pub fn new(signer: Arc<dyn Signer>, api: Arc<dyn RemoteClient>) -> Self {
        Self { signer, api }
    }

    /// Generate signing shares and return the derived addresses
    ///
    /// Exactly one `Signer::generate` invocation; a share map missing either
    /// namespace fails with [`Error::CannotCreateWallet`].
    pub async fn create_wallet(&self, progress: ProgressSink) -> Result<WalletAddresses> {
        let shares = self.signer.generate(progress).await?;

        let eip155 = shares
            .get(&Namespace::Eip155)
            .filter(|share| !share.address.is_empty())
            .ok_or_else(|| Error::CannotCreateWallet("no eip155 share generated".into()))?;
        let solana = shares
            .get(&Namespace::Solana)
            .filter(|share| !share.address.is_empty())
            .ok_or_else(|| Error::CannotCreateWallet("no solana share generated".into()))?;

        let addresses = WalletAddresses {
            eip155: eip155.address.clone(),
            solana: solana.address.clone(),
        };

        info!(eip155 = %addresses.eip155, solana = %addresses.solana, "wallet created");
        Ok(addresses)
    }

    /// Produce an encrypted backup plus its deferred storage confirmation
    ///
    /// The share-status endpoint is not called here; it is called exactly
    /// once inside the returned confirmation, after the caller has durably
    /// stored the cipher text with its own custodian.
    pub async fn backup_wallet(
        &self,
        method: BackupMethod,
        progress: ProgressSink,
    ) -> Result<BackupArtifact> {
        let backup = self.signer.backup(method, progress).await?;

        info!(method = %method, shares = backup.share_ids.len(), "backup produced");

        Ok(BackupArtifact {
            cipher_text: backup.cipher_text,
            storage_confirm: StorageConfirmation {
                api: Arc::clone(&self.api),
                share_ids: backup.share_ids,
            },
        })
    }

    /// Rebuild signing shares from a backup and return the addresses
    ///
    /// Unlike backup there is no deferred confirmation: recovery implies the
    /// backup share already existed durably, so the rotated share status is
    /// persisted immediately.
    pub async fn recover_wallet(
        &self,
        method: BackupMethod,
        cipher_text: &str,
        progress: ProgressSink,
    ) -> Result<WalletAddresses> {
        let recovered = self.signer.recover(method, cipher_text, progress).await?;

        self.api
            .update_share_status(
                ShareKind::Signing,
                &recovered.share_ids,
                ShareStatus::StoredClient,
            )
            .await?;

        info!(method = %method, "wallet recovered");
        Ok(recovered.addresses)
    }

    /// Irreversibly reconstruct the full private keys
    ///
    /// Terminal for the wallet's MPC shares. A failure is surfaced as the
    /// non-retryable [`Error::EjectFailed`]; the orchestrator never retries,
    /// because the device share set may already be partially consumed.
    pub async fn eject_wallet(
        &self,
        method: BackupMethod,
        cipher_text: &str,
        org_backup_shares: &str,
        progress: ProgressSink,
    ) -> Result<EjectedKeys> {
        match self
            .signer
            .eject(method, cipher_text, org_backup_shares, progress)
            .await
        {
            Ok(keys) => {
                info!(method = %method, "wallet ejected; MPC custody ended");
                Ok(keys)
            }
            Err(e) => {
                warn!(method = %method, error = %e, "eject failed; not retrying");
                Err(Error::EjectFailed(e.to_string()))
            }
        }
    }
}
