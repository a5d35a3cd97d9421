//! dApp session protocol peer
//!
//! `PortalConnect` owns the session state machine and the two-phase trust
//! handoff: inbound proposals and signing requests surface to the host as
//! events, and only an explicit host decision (emitted back on the same
//! instance bus, correlation id in the payload) produces an outbound
//! protocol message. Approval policy lives entirely in the host; there is
//! no auto-approve path in this layer.

use crate::error::Result;
use crate::protocol::{self, Inbound, Outbound, SessionProposal, SessionRequest};
use crate::transport::{Transport, WsTransport};
use crate::uri::PairingUri;
use parking_lot::{Mutex, RwLock};
use portal_wallet_core::events::{EventBus, SubscriptionId};
use portal_wallet_core::{ChainRef, Provider, SharedMap};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Event names surfaced to and consumed from the host application
pub mod events {
    pub use portal_wallet_core::events::event::{CHAIN_CHANGED, CONNECT, DISCONNECT};

    /// Inbound session proposal awaiting a host decision
    pub const DAPP_SESSION_REQUESTED: &str = "portalDappSessionRequested";
    /// Host decision: approve the proposal
    pub const DAPP_SESSION_APPROVED: &str = "portalDappSessionApproved";
    /// Host decision: reject the proposal
    pub const DAPP_SESSION_REJECTED: &str = "portalDappSessionRejected";
    /// Inbound signing-class request awaiting a host decision
    pub const SIGNING_REQUESTED: &str = "portalSigningRequested";
    /// Host decision: approve and execute the signing request
    pub const SIGNING_APPROVED: &str = "portalSigningApproved";
    /// Host decision: reject the signing request
    pub const SIGNING_REJECTED: &str = "portalSigningRejected";
}

/// Session connection state
///
/// Owned exclusively by [`PortalConnect`]; transitions are the only mutator.
/// Close is synchronous from the caller's perspective; there is no
/// observable `Closing` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Session peer configuration
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Relay base URL (`wss://...`)
    pub relay_url: String,
}

impl ConnectConfig {
    /// Create a new config
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
        }
    }
}

/// Cached negotiation state kept across `disconnect(false)` for resume
struct SessionCache {
    topic: String,
    sym_key: String,
}

struct ActiveSession {
    topic: String,
    reader: JoinHandle<()>,
}

/// State shared between the peer, its read task, and its decision handlers
struct Inner {
    provider: Arc<Provider>,
    bus: EventBus,
    state: RwLock<SessionState>,
    /// Session-scoped chain cursor
    chain: RwLock<ChainRef>,
    pending_proposals: SharedMap<String, SessionProposal>,
    pending_requests: SharedMap<String, SessionRequest>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl Inner {
    fn send_frame(&self, frame: Outbound) {
        let guard = self.outbound.lock();
        let Some(sender) = guard.as_ref() else {
            warn!("no open transport; dropping outbound frame");
            return;
        };

        match frame.encode() {
            Ok(encoded) => {
                if sender.send(encoded).is_err() {
                    warn!("transport gone; outbound frame dropped");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode outbound frame"),
        }
    }

    /// Drop transport state and cancel outstanding host decisions. Late
    /// decisions for the discarded ids become no-ops.
    fn settle_disconnected(&self, reason: &str) -> bool {
        let was_live = {
            let mut state = self.state.write();
            let was = *state != SessionState::Disconnected;
            *state = SessionState::Disconnected;
            was
        };

        *self.outbound.lock() = None;
        self.pending_proposals.clear();
        self.pending_requests.clear();

        if was_live {
            debug!(reason, "session settled disconnected");
        }
        was_live
    }
}

/// Stateful protocol peer for dApp sessions
pub struct PortalConnect {
    inner: Arc<Inner>,
    transport: Arc<dyn Transport>,
    config: ConnectConfig,
    /// Serializes connect/disconnect so two live transports are impossible
    lifecycle: tokio::sync::Mutex<Option<ActiveSession>>,
    cache: Mutex<Option<SessionCache>>,
}

impl PortalConnect {
    /// Create a peer over the WebSocket transport
    pub fn new(provider: Arc<Provider>, config: ConnectConfig) -> Self {
        Self::with_transport(provider, config, Arc::new(WsTransport::new()))
    }

    /// Create a peer over a custom transport
    pub fn with_transport(
        provider: Arc<Provider>,
        config: ConnectConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let chain = provider.chain();
        let inner = Arc::new(Inner {
            provider,
            bus: EventBus::new(),
            state: RwLock::new(SessionState::Disconnected),
            chain: RwLock::new(chain),
            pending_proposals: SharedMap::new(),
            pending_requests: SharedMap::new(),
            outbound: Mutex::new(None),
        });

        register_decision_handlers(&inner);

        Self {
            inner,
            transport,
            config,
            lifecycle: tokio::sync::Mutex::new(None),
            cache: Mutex::new(None),
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    /// Topic cached for resume, if any
    pub fn cached_topic(&self) -> Option<String> {
        self.cache.lock().as_ref().map(|c| c.topic.clone())
    }

    /// Parse a pairing URI and open the session transport
    ///
    /// Idempotent-by-replacement: connecting while a session is live tears
    /// the prior transport down first. Concurrent `connect`/`disconnect`
    /// calls serialize on the lifecycle lock.
    pub async fn connect(&self, uri: &str) -> Result<()> {
        let pairing = PairingUri::parse(uri)?;
        let mut active = self.lifecycle.lock().await;

        if let Some(prev) = active.take() {
            prev.reader.abort();
            if self.inner.settle_disconnected("replaced by new connect") {
                self.inner
                    .bus
                    .emit(events::DISCONNECT, json!({ "reason": "replaced" }));
            }
            debug!(topic = %prev.topic, "tore down prior transport");
        }

        let resumed = self
            .cache
            .lock()
            .as_ref()
            .map(|c| c.topic == pairing.topic && c.sym_key == pairing.sym_key)
            .unwrap_or(false);

        *self.inner.state.write() = SessionState::Connecting;

        let url = format!("{}?topic={}", self.config.relay_url, pairing.topic);
        let session = match self.transport.open(&url).await {
            Ok(session) => session,
            Err(e) => {
                *self.inner.state.write() = SessionState::Disconnected;
                return Err(e);
            }
        };

        *self.inner.outbound.lock() = Some(session.outbound);
        *self.inner.state.write() = SessionState::Connected;
        *self.cache.lock() = Some(SessionCache {
            topic: pairing.topic.clone(),
            sym_key: pairing.sym_key.clone(),
        });

        info!(topic = %pairing.topic, resumed, "session transport open");
        self.inner.bus.emit(
            events::CONNECT,
            json!({ "topic": pairing.topic, "resumed": resumed }),
        );

        let reader = spawn_reader(Arc::clone(&self.inner), session.inbound);
        *active = Some(ActiveSession {
            topic: pairing.topic,
            reader,
        });

        Ok(())
    }

    /// Close the session and release the transport
    ///
    /// Outstanding proposals awaiting a host decision are discarded; a late
    /// decision for a discarded proposal is a no-op, not an error. With
    /// `clear_session` the cached topic is dropped too, so the next
    /// `connect` starts a fresh negotiation rather than resuming.
    pub async fn disconnect(&self, clear_session: bool) {
        let mut active = self.lifecycle.lock().await;
        if let Some(prev) = active.take() {
            prev.reader.abort();
        }

        let was_live = self.inner.settle_disconnected("explicit disconnect");

        if clear_session {
            *self.cache.lock() = None;
        }

        if was_live {
            self.inner.bus.emit(events::DISCONNECT, json!({}));
        }
    }

    /// Update the session chain cursor and emit `chainChanged`
    ///
    /// Does not renegotiate the transport session.
    pub fn set_chain_id(&self, chain: &str) -> Result<()> {
        let chain = ChainRef::parse(chain).map_err(crate::error::ConnectError::from)?;
        *self.inner.chain.write() = chain.clone();
        self.inner.bus.emit(
            events::CHAIN_CHANGED,
            json!({ "chainId": chain.to_string() }),
        );
        Ok(())
    }

    /// The session chain cursor
    pub fn chain(&self) -> ChainRef {
        self.inner.chain.read().clone()
    }

    /// Register a handler on this instance's bus
    pub fn on<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.bus.on(event, handler)
    }

    /// Register a handler that fires at most once
    pub fn once<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.bus.once(event, handler)
    }

    /// Remove a subscription
    pub fn off(&self, subscription: &SubscriptionId) {
        self.inner.bus.off(subscription)
    }

    /// Emit an event on this instance's bus
    ///
    /// Host decisions (`portalDappSessionApproved`, `portalSigningRejected`,
    /// ...) enter the peer through here.
    pub fn emit(&self, event: &str, payload: Value) {
        self.inner.bus.emit(event, payload)
    }
}

/// Wire the host-decision events to their outbound protocol messages
fn register_decision_handlers(inner: &Arc<Inner>) {
    let handler = Arc::clone(inner);
    inner.bus.on(events::DAPP_SESSION_APPROVED, move |payload| {
        handle_session_decision(&handler, payload, true);
    });

    let handler = Arc::clone(inner);
    inner.bus.on(events::DAPP_SESSION_REJECTED, move |payload| {
        handle_session_decision(&handler, payload, false);
    });

    let handler = Arc::clone(inner);
    inner.bus.on(events::SIGNING_APPROVED, move |payload| {
        handle_signing_decision(&handler, payload, true);
    });

    let handler = Arc::clone(inner);
    inner.bus.on(events::SIGNING_REJECTED, move |payload| {
        handle_signing_decision(&handler, payload, false);
    });
}

fn decision_id(payload: &Value) -> Option<String> {
    payload
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn handle_session_decision(inner: &Arc<Inner>, payload: &Value, approved: bool) {
    let Some(id) = decision_id(payload) else {
        warn!("session decision missing id; ignoring");
        return;
    };

    // at-most-once: the proposal leaves the map with the first decision
    let Some(proposal) = inner.pending_proposals.remove(&id) else {
        debug!(id = %id, "decision for unknown or discarded proposal; ignoring");
        return;
    };

    let frame = if approved {
        let accounts = approved_accounts(&inner.provider, &proposal.chains);
        Outbound::SessionApproved {
            id: proposal.id,
            topic: proposal.topic,
            chains: proposal.chains,
            accounts,
        }
    } else {
        Outbound::SessionRejected {
            id: proposal.id,
            topic: proposal.topic,
        }
    };

    inner.send_frame(frame);
}

/// CAIP-10 account list for the chains the provider has addresses for
fn approved_accounts(provider: &Provider, chains: &[String]) -> Vec<String> {
    chains
        .iter()
        .filter_map(|chain| {
            let parsed = ChainRef::parse(chain).ok()?;
            let address = provider.address(parsed.namespace())?;
            Some(format!("{}:{}", parsed, address))
        })
        .collect()
}

fn handle_signing_decision(inner: &Arc<Inner>, payload: &Value, approved: bool) {
    let Some(id) = decision_id(payload) else {
        warn!("signing decision missing id; ignoring");
        return;
    };

    let Some(request) = inner.pending_requests.remove(&id) else {
        debug!(id = %id, "decision for unknown or discarded request; ignoring");
        return;
    };

    if !approved {
        let error = payload
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("rejected by user")
            .to_string();
        inner.send_frame(Outbound::SigningRejected {
            id: request.id,
            topic: request.topic,
            error,
        });
        return;
    }

    // Execute through the provider and relay the signed result or failure.
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        let chain = request
            .chain_id
            .clone()
            .unwrap_or_else(|| inner.chain.read().to_string());

        match inner
            .provider
            .request(&chain, &request.method, request.params.clone())
            .await
        {
            Ok(result) => inner.send_frame(Outbound::SigningApproved {
                id: request.id,
                topic: request.topic,
                result,
            }),
            Err(e) => {
                warn!(id = %request.id, error = %e, "approved signing request failed");
                inner.send_frame(Outbound::SigningRejected {
                    id: request.id,
                    topic: request.topic,
                    error: e.to_string(),
                });
            }
        }
    });
}

/// Process inbound frames in arrival order until the transport closes
fn spawn_reader(inner: Arc<Inner>, mut inbound: mpsc::UnboundedReceiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = inbound.recv().await {
            handle_frame(&inner, &frame);
        }

        // Transport closed underneath us (abnormal close)
        if inner.settle_disconnected("transport closed") {
            info!("transport closed; session disconnected");
            inner
                .bus
                .emit(events::DISCONNECT, json!({ "reason": "transport closed" }));
        }
    })
}

fn handle_frame(inner: &Arc<Inner>, frame: &str) {
    match protocol::decode_inbound(frame) {
        Ok(Inbound::Proposal(proposal)) => {
            let payload = match serde_json::to_value(&proposal) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "failed to encode proposal payload");
                    return;
                }
            };

            debug!(id = %proposal.id, dapp = %proposal.dapp.name, "session proposed");
            inner.pending_proposals.set(proposal.id.clone(), proposal);
            inner.bus.emit(events::DAPP_SESSION_REQUESTED, payload);
        }
        Ok(Inbound::Request(request)) => {
            let mut payload = match serde_json::to_value(&request) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "failed to encode request payload");
                    return;
                }
            };
            payload["kind"] = json!(request.kind());

            debug!(id = %request.id, method = %request.method, "signing requested");
            inner.pending_requests.set(request.id.clone(), request);
            inner.bus.emit(events::SIGNING_REQUESTED, payload);
        }
        // A malformed message from an untrusted dApp must never destabilize
        // the host app: log and drop, no event, no error surfaced.
        Err(e) => warn!(error = %e, "dropping malformed inbound session message"),
    }
}
