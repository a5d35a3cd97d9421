//! Chain-scoped request dispatcher
//!
//! The provider validates namespace-scoped requests against the per-namespace
//! method tables and forwards them to the remote execution backend. It owns
//! the active chain cursor and the per-namespace address book; nothing else
//! writes them.
//!
//! Concurrency: multiple `request` calls may be in flight at once and
//! complete in any order. The provider imposes no queue and no backpressure;
//! callers needing ordering serialize themselves and correlate results by
//! their own identifiers.

use crate::api::RemoteClient;
use crate::chain::{ChainRef, Namespace};
use crate::error::{Error, Result};
use crate::events::{event, EventBus, SubscriptionId};
use crate::rpc::{Eip155Method, Method, RpcRequest};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Request dispatcher for namespace-scoped RPC calls
pub struct Provider {
    remote: Arc<dyn RemoteClient>,
    bus: Arc<EventBus>,
    /// Active chain cursor used to default request context
    chain: RwLock<ChainRef>,
    /// Known addresses per namespace
    addresses: RwLock<HashMap<Namespace, String>>,
    /// Chains the host configured; `None` allows any well-formed chain
    configured_chains: Option<HashSet<ChainRef>>,
    /// Set by the first successful dispatch after cold start
    connected: AtomicBool,
}

impl Provider {
    /// Create a provider over a remote execution backend
    pub fn new(remote: Arc<dyn RemoteClient>, default_chain: ChainRef) -> Self {
        Self {
            remote,
            bus: Arc::new(EventBus::new()),
            chain: RwLock::new(default_chain),
            addresses: RwLock::new(HashMap::new()),
            configured_chains: None,
            connected: AtomicBool::new(false),
        }
    }

    /// Restrict dispatch to an explicit chain set
    ///
    /// Requests for well-formed chains outside the set fail with
    /// [`Error::UnsupportedChain`] before any network call. The default
    /// chain is always part of the set.
    pub fn with_chains(mut self, chains: impl IntoIterator<Item = ChainRef>) -> Self {
        let mut set: HashSet<ChainRef> = chains.into_iter().collect();
        set.insert(self.chain.read().clone());
        self.configured_chains = Some(set);
        self
    }

    /// The instance-owned event bus
    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Register a handler for a provider event
    pub fn on<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.bus.on(event, handler)
    }

    /// Register a handler that fires at most once
    pub fn once<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.bus.once(event, handler)
    }

    /// The active chain cursor
    pub fn chain(&self) -> ChainRef {
        self.chain.read().clone()
    }

    /// Move the active chain cursor and emit `chainChanged`
    pub fn set_chain(&self, chain: ChainRef) {
        let changed = {
            let mut cursor = self.chain.write();
            if *cursor == chain {
                false
            } else {
                *cursor = chain.clone();
                true
            }
        };

        if changed {
            info!(chain = %chain, "active chain changed");
            self.bus
                .emit(event::CHAIN_CHANGED, json!({ "chainId": chain.to_string() }));
        }
    }

    /// The known address for a namespace
    pub fn address(&self, namespace: Namespace) -> Option<String> {
        self.addresses.read().get(&namespace).cloned()
    }

    /// Record the address to use for signing-class methods in a namespace
    pub fn set_address(&self, namespace: Namespace, address: impl Into<String>) {
        self.addresses.write().insert(namespace, address.into());
    }

    /// Record addresses for every namespace at once
    pub fn load_addresses(&self, addresses: &crate::signer::WalletAddresses) {
        let mut book = self.addresses.write();
        book.insert(Namespace::Eip155, addresses.eip155.clone());
        book.insert(Namespace::Solana, addresses.solana.clone());
    }

    /// Validate and dispatch a chain-scoped request
    ///
    /// Validation happens before any network call: a malformed chain id,
    /// unsupported method, or missing signing address resolves synchronously
    /// as a typed failure and never reaches the backend. Nothing is retried.
    pub async fn request(&self, chain: &str, method: &str, params: Vec<Value>) -> Result<Value> {
        let chain = ChainRef::parse(chain)?;
        self.send(RpcRequest::new(chain, method, params)).await
    }

    /// Dispatch an already-parsed request
    pub async fn send(&self, request: RpcRequest) -> Result<Value> {
        let namespace = request.chain.namespace();

        if let Some(chains) = &self.configured_chains {
            if !chains.contains(&request.chain) {
                return Err(Error::UnsupportedChain(request.chain.to_string()));
            }
        }

        let method = Method::resolve(namespace, &request.method).ok_or_else(|| {
            Error::UnsupportedMethod {
                namespace,
                method: request.method.clone(),
            }
        })?;

        if method.requires_signer() && self.address(namespace).is_none() {
            return Err(Error::NoAddress(namespace));
        }

        // Cursor side effects are validated before dispatch so bad params
        // never produce a half-applied switch.
        let switch_target = match method {
            Method::Eip155(Eip155Method::WalletSwitchEthereumChain) => {
                let target = parse_switch_params(&request.params)?;
                if let Some(chains) = &self.configured_chains {
                    if !chains.contains(&target) {
                        return Err(Error::UnsupportedChain(target.to_string()));
                    }
                }
                Some(target)
            }
            _ => None,
        };

        debug!(chain = %request.chain, method = %request.method, "dispatching request");

        let result = self
            .remote
            .execute(&request.chain, &request.method, request.params)
            .await?;

        if !self.connected.swap(true, Ordering::SeqCst) {
            self.bus.emit(
                event::CONNECT,
                json!({ "chainId": request.chain.to_string() }),
            );
        }

        if let Some(target) = switch_target {
            self.set_chain(target);
        }

        Ok(result)
    }

    /// Mark the provider disconnected and emit `disconnect`
    ///
    /// The next successful request emits `connect` again.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.bus.emit(event::DISCONNECT, json!({}));
        }
    }
}

/// Extract the target chain from `wallet_switchEthereumChain` params
/// (`[{ "chainId": "0x..." }]`)
fn parse_switch_params(params: &[Value]) -> Result<ChainRef> {
    let chain_id = params
        .first()
        .and_then(|p| p.get("chainId"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::InvalidParams("missing chainId in switch params".into()))?;

    let hex = chain_id.strip_prefix("0x").unwrap_or(chain_id);
    let id = u64::from_str_radix(hex, 16)
        .map_err(|_| Error::InvalidParams(format!("invalid chainId: {}", chain_id)))?;

    ChainRef::new(Namespace::Eip155, id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AssetBalance, ShareKind, ShareStatus, TransactionRecord};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    /// Backend double that records calls and answers with a canned value
    struct RecordingRemote {
        calls: AtomicU32,
        response: Value,
    }

    impl RecordingRemote {
        fn new(response: Value) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                response,
            })
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteClient for RecordingRemote {
        async fn execute(&self, _: &ChainRef, _: &str, _: Vec<Value>) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }

        async fn update_share_status(&self, _: ShareKind, _: &[String], _: ShareStatus) -> Result<()> {
            Ok(())
        }

        async fn get_balances(&self, _: &ChainRef, _: &str) -> Result<Vec<AssetBalance>> {
            Ok(Vec::new())
        }

        async fn get_transactions(&self, _: &ChainRef, _: &str) -> Result<Vec<TransactionRecord>> {
            Ok(Vec::new())
        }
    }

    fn sepolia() -> ChainRef {
        ChainRef::parse("eip155:11155111").unwrap()
    }

    #[tokio::test]
    async fn test_malformed_chain_never_dispatches() {
        let remote = RecordingRemote::new(json!("0x0"));
        let provider = Provider::new(remote.clone(), sepolia());

        for bad in ["", "eip155", "eip155:", "cosmos:hub"] {
            let result = provider.request(bad, "eth_chainId", vec![]).await;
            assert!(matches!(result, Err(Error::InvalidChain(_))));
        }

        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_method_never_dispatches() {
        let remote = RecordingRemote::new(json!("0x0"));
        let provider = Provider::new(remote.clone(), sepolia());

        let result = provider
            .request("eip155:11155111", "eth_mine", vec![])
            .await;

        assert!(matches!(result, Err(Error::UnsupportedMethod { .. })));
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_signing_method_without_address_never_dispatches() {
        let remote = RecordingRemote::new(json!("0xsig"));
        let provider = Provider::new(remote.clone(), sepolia());

        let result = provider
            .request("eip155:11155111", "personal_sign", vec![json!("0xdead")])
            .await;

        assert!(matches!(result, Err(Error::NoAddress(Namespace::Eip155))));
        assert_eq!(remote.call_count(), 0);

        // Configuring the address unlocks dispatch
        provider.set_address(Namespace::Eip155, "0xABC");
        let result = provider
            .request("eip155:11155111", "personal_sign", vec![json!("0xdead")])
            .await;
        assert_eq!(result.unwrap(), json!("0xsig"));
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_emitted_once_on_first_success() {
        let remote = RecordingRemote::new(json!("0x1"));
        let provider = Provider::new(remote, sepolia());

        let connects = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&connects);
        provider.on(event::CONNECT, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        provider
            .request("eip155:11155111", "eth_chainId", vec![])
            .await
            .unwrap();
        provider
            .request("eip155:11155111", "eth_chainId", vec![])
            .await
            .unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 1);

        // Disconnect resets the latch
        provider.disconnect();
        provider
            .request("eip155:11155111", "eth_chainId", vec![])
            .await
            .unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_switch_chain_moves_cursor_and_emits() {
        let remote = RecordingRemote::new(json!(null));
        let provider = Provider::new(remote, sepolia());

        let changed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let ch = Arc::clone(&changed);
        provider.on(event::CHAIN_CHANGED, move |payload| {
            ch.lock().push(payload["chainId"].as_str().unwrap().to_string());
        });

        provider
            .request(
                "eip155:11155111",
                "wallet_switchEthereumChain",
                vec![json!({ "chainId": "0x1" })],
            )
            .await
            .unwrap();

        assert_eq!(provider.chain(), ChainRef::parse("eip155:1").unwrap());
        assert_eq!(*changed.lock(), vec!["eip155:1".to_string()]);
    }

    #[tokio::test]
    async fn test_switch_chain_bad_params_rejected_before_dispatch() {
        let remote = RecordingRemote::new(json!(null));
        let provider = Provider::new(remote.clone(), sepolia());

        let result = provider
            .request(
                "eip155:11155111",
                "wallet_switchEthereumChain",
                vec![json!({ "chainId": "not-hex" })],
            )
            .await;

        assert!(matches!(result, Err(Error::InvalidParams(_))));
        assert_eq!(remote.call_count(), 0);
        assert_eq!(provider.chain(), sepolia());
    }

    #[tokio::test]
    async fn test_unconfigured_chain_never_dispatches() {
        let remote = RecordingRemote::new(json!("0x0"));
        let provider = Provider::new(remote.clone(), sepolia())
            .with_chains([ChainRef::parse("eip155:1").unwrap()]);

        // Well-formed but outside the configured set
        let result = provider.request("eip155:137", "eth_chainId", vec![]).await;
        assert!(matches!(result, Err(Error::UnsupportedChain(_))));
        assert_eq!(remote.call_count(), 0);

        // Configured chains (including the default) dispatch
        provider
            .request("eip155:1", "eth_chainId", vec![])
            .await
            .unwrap();
        provider
            .request("eip155:11155111", "eth_chainId", vec![])
            .await
            .unwrap();
        assert_eq!(remote.call_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let remote = RecordingRemote::new(json!("0x1"));
        let provider = Arc::new(Provider::new(remote.clone(), sepolia()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let p = Arc::clone(&provider);
                tokio::spawn(async move {
                    p.request("eip155:11155111", "eth_blockNumber", vec![]).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(remote.call_count(), 10);
    }
}
