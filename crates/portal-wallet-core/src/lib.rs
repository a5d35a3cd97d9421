//! # Portal Wallet Core
//!
//! Core orchestration layer for a mobile multi-chain wallet SDK.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Provider**: validates and dispatches namespace-scoped RPC requests
//!   (`eip155:*`, `solana:*`) to a remote execution backend
//! - **Wallet Orchestrator**: sequences the multi-step wallet lifecycle flows
//!   (create, backup, recover, eject) over an opaque MPC signer
//! - **Event Bus**: instance-owned publish/subscribe registry used by every
//!   stateful component to surface state transitions to the host app
//! - **Collaborator traits**: `Signer` (the native MPC binary) and
//!   `RemoteClient` (the backend API), both injected so hosts and tests can
//!   swap implementations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portal_wallet_core::{
//!     ChainRef, HttpRemoteClient, ApiConfig, Provider, WalletOrchestrator,
//! };
//! use std::sync::Arc;
//!
//! let api = Arc::new(HttpRemoteClient::new(
//!     ApiConfig::new("https://api.example.com").with_bearer_token("..."),
//! )?);
//!
//! // Create a wallet through the native signer
//! let wallet = WalletOrchestrator::new(signer, api.clone());
//! let addresses = wallet.create_wallet(progress).await?;
//!
//! // Dispatch chain-scoped requests
//! let provider = Provider::new(api, ChainRef::parse("eip155:11155111")?);
//! provider.set_address(Namespace::Eip155, addresses.eip155.clone());
//! let balance = provider
//!     .request("eip155:11155111", "eth_getBalance", params)
//!     .await?;
//! ```
//!
//! ## Trust Model
//!
//! The SDK orchestrates; it does not hold keys or implement cryptography.
//! Key material lives behind the `Signer` capability and RPC execution lives
//! behind `RemoteClient`. Signing requests from external dApps always pass
//! through a host decision before anything is relayed (see the
//! `portal-wallet-connect` crate).

pub mod api;
pub mod chain;
pub mod collections;
pub mod error;
pub mod events;
pub mod provider;
pub mod rpc;
pub mod signer;
pub mod wallet;

pub use api::{
    ApiConfig, AssetBalance, HttpRemoteClient, RemoteClient, ShareKind, ShareStatus,
    TransactionRecord,
};
pub use chain::{ChainRef, Namespace};
pub use collections::SharedMap;
pub use error::{Error, Result};
pub use events::{EventBus, SubscriptionId};
pub use provider::Provider;
pub use rpc::{Eip155Method, Method, RpcRequest, SolanaMethod};
pub use signer::{
    BackupMethod, BackupShares, EjectedKeys, MpcPhase, ProgressSink, RecoveredWallet, Signer,
    SignerShare, WalletAddresses,
};
pub use wallet::{BackupArtifact, StorageConfirmation, WalletOrchestrator};

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
