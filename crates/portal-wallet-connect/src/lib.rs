//! # Portal Wallet Connect
//!
//! Stateful protocol peer bridging the wallet to external dApps over a
//! WebSocket relay. The peer negotiates session proposals, forwards signing
//! requests to the host application as events, and relays host decisions
//! back over the transport as protocol messages.
//!
//! ## Trust Handoff
//!
//! ```text
//! dApp ──► Relay ──► PortalConnect ──► Host App
//!                        │                │
//!                        │            Approve/Reject
//!                        │                │
//!                        ◄────────────────┘
//!                        │
//!                        ▼
//!            portal_dappSessionApproved /
//!            portal_signingApproved over the relay
//! ```
//!
//! PortalConnect never makes trust decisions itself: inbound proposals are
//! surfaced as events and only an explicit host decision produces an
//! outbound protocol message. Malformed inbound messages from the untrusted
//! dApp side are logged and dropped, never surfaced.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portal_wallet_connect::{ConnectConfig, PortalConnect, events};
//! use serde_json::json;
//!
//! let connect = PortalConnect::new(provider, ConnectConfig::new("wss://relay.example.com"));
//!
//! connect.on(events::DAPP_SESSION_REQUESTED, move |proposal| {
//!     // Show the proposal to the user, then answer:
//!     connect_handle.emit(events::DAPP_SESSION_APPROVED, json!({ "id": proposal["id"] }));
//! });
//!
//! connect.connect("wc:topic@2?relay-protocol=irn&symKey=...").await?;
//! ```

pub mod connect;
pub mod error;
pub mod memory;
pub mod protocol;
pub mod transport;
pub mod uri;

pub use connect::{events, ConnectConfig, PortalConnect, SessionState};
pub use error::{ConnectError, Result};
pub use memory::MemoryTransport;
pub use protocol::{DappMetadata, Inbound, Outbound, RequestKind, SessionProposal, SessionRequest};
pub use transport::{Transport, TransportSession, WsTransport};
pub use uri::PairingUri;
