//! Shared test doubles for integration tests

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_wallet_core::{
    AssetBalance, BackupMethod, BackupShares, ChainRef, EjectedKeys, Error, MpcPhase, Namespace,
    ProgressSink, RecoveredWallet, RemoteClient, Result, ShareKind, ShareStatus, Signer,
    SignerShare, TransactionRecord, WalletAddresses,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Signer double driven by a canned share map
pub struct MockSigner {
    pub shares: HashMap<Namespace, SignerShare>,
    pub generate_calls: AtomicU32,
}

impl MockSigner {
    pub fn new(entries: &[(Namespace, &str, &str)]) -> Self {
        let shares = entries
            .iter()
            .map(|(ns, id, address)| {
                (
                    *ns,
                    SignerShare {
                        id: id.to_string(),
                        address: address.to_string(),
                        share: "opaque-share-material".to_string(),
                    },
                )
            })
            .collect();
        Self {
            shares,
            generate_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Signer for MockSigner {
    async fn generate(&self, progress: ProgressSink) -> Result<HashMap<Namespace, SignerShare>> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        progress(MpcPhase::GeneratingShare);
        progress(MpcPhase::StoringShare);
        progress(MpcPhase::Done);
        Ok(self.shares.clone())
    }

    async fn backup(&self, _: BackupMethod, progress: ProgressSink) -> Result<BackupShares> {
        progress(MpcPhase::ReadingShare);
        progress(MpcPhase::EncryptingShare);
        progress(MpcPhase::Done);
        Ok(BackupShares {
            cipher_text: "backup-cipher-text".to_string(),
            share_ids: vec!["backup-1".to_string(), "backup-2".to_string()],
        })
    }

    async fn recover(
        &self,
        _: BackupMethod,
        cipher_text: &str,
        progress: ProgressSink,
    ) -> Result<RecoveredWallet> {
        if cipher_text.is_empty() {
            return Err(Error::Signer("empty cipher text".into()));
        }
        progress(MpcPhase::DecryptingShare);
        progress(MpcPhase::RecoveringSigningShare);
        progress(MpcPhase::Done);
        Ok(RecoveredWallet {
            addresses: WalletAddresses {
                eip155: "0xRecovered".to_string(),
                solana: "SoLRecovered".to_string(),
            },
            share_ids: vec!["recovered-1".to_string()],
        })
    }

    async fn eject(
        &self,
        _: BackupMethod,
        _: &str,
        _: &str,
        progress: ProgressSink,
    ) -> Result<EjectedKeys> {
        progress(MpcPhase::DecryptingShare);
        progress(MpcPhase::Done);
        Ok(EjectedKeys {
            eip155_private_key: "0xprivate".to_string(),
            solana_private_key: "58private".to_string(),
        })
    }
}

/// Backend double recording every call it receives
#[derive(Default)]
pub struct MockRemote {
    pub executed: Mutex<Vec<(String, String, Vec<Value>)>>,
    pub status_updates: Mutex<Vec<(ShareKind, Vec<String>, ShareStatus)>>,
}

impl MockRemote {
    pub fn execute_count(&self) -> usize {
        self.executed.lock().len()
    }

    pub fn status_update_count(&self) -> usize {
        self.status_updates.lock().len()
    }
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn execute(&self, chain: &ChainRef, method: &str, params: Vec<Value>) -> Result<Value> {
        self.executed
            .lock()
            .push((chain.to_string(), method.to_string(), params));
        Ok(json!({ "ok": true }))
    }

    async fn update_share_status(
        &self,
        kind: ShareKind,
        ids: &[String],
        status: ShareStatus,
    ) -> Result<()> {
        self.status_updates.lock().push((kind, ids.to_vec(), status));
        Ok(())
    }

    async fn get_balances(&self, _: &ChainRef, _: &str) -> Result<Vec<AssetBalance>> {
        Ok(Vec::new())
    }

    async fn get_transactions(&self, _: &ChainRef, _: &str) -> Result<Vec<TransactionRecord>> {
        Ok(Vec::new())
    }
}
