//! Integration tests for provider dispatch and validation
//!
//! These verify the validation-before-network invariant end to end: a
//! request that fails validation must never reach the backend double.

mod common;

use common::MockRemote;
use portal_wallet_core::events::event;
use portal_wallet_core::{ChainRef, Error, Namespace, Provider};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn provider_with(remote: Arc<MockRemote>) -> Provider {
    Provider::new(remote, ChainRef::parse("eip155:11155111").unwrap())
}

#[tokio::test]
async fn well_formed_chains_dispatch_malformed_chains_do_not() {
    let remote = Arc::new(MockRemote::default());
    let provider = provider_with(remote.clone());

    // Recognized namespaces dispatch
    provider
        .request("eip155:11155111", "eth_chainId", vec![])
        .await
        .unwrap();
    provider
        .request(
            "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
            "sol_getLatestBlockhash",
            vec![],
        )
        .await
        .unwrap();
    assert_eq!(remote.execute_count(), 2);

    // Malformed identifiers fail before any network call
    for bad in ["", "eip155", ":", "eip155:", "near:mainnet", "solana:"] {
        let result = provider.request(bad, "eth_chainId", vec![]).await;
        assert!(
            matches!(result, Err(Error::InvalidChain(_))),
            "expected InvalidChain for {:?}",
            bad
        );
    }
    assert_eq!(remote.execute_count(), 2);
}

#[tokio::test]
async fn signing_methods_without_address_never_reach_backend() {
    let remote = Arc::new(MockRemote::default());
    let provider = provider_with(remote.clone());

    for method in [
        "eth_sendTransaction",
        "eth_sign",
        "personal_sign",
        "eth_signTypedData_v3",
        "eth_signTypedData_v4",
    ] {
        let result = provider
            .request("eip155:11155111", method, vec![json!("0x00")])
            .await;
        assert!(
            matches!(result, Err(Error::NoAddress(Namespace::Eip155))),
            "expected NoAddress for {}",
            method
        );
    }

    let result = provider
        .request(
            "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
            "sol_signMessage",
            vec![json!("aGk=")],
        )
        .await;
    assert!(matches!(result, Err(Error::NoAddress(Namespace::Solana))));

    assert_eq!(remote.execute_count(), 0);
}

#[tokio::test]
async fn addresses_unlock_signing_per_namespace() {
    let remote = Arc::new(MockRemote::default());
    let provider = provider_with(remote.clone());

    provider.set_address(Namespace::Eip155, "0xABC");

    provider
        .request("eip155:11155111", "personal_sign", vec![json!("0x00")])
        .await
        .unwrap();

    // The solana namespace is still locked
    let result = provider
        .request(
            "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
            "sol_signTransaction",
            vec![json!("dHg=")],
        )
        .await;
    assert!(matches!(result, Err(Error::NoAddress(Namespace::Solana))));

    assert_eq!(remote.execute_count(), 1);
}

#[tokio::test]
async fn lifecycle_events_fire_on_transitions() {
    let remote = Arc::new(MockRemote::default());
    let provider = provider_with(remote);

    let connects = Arc::new(AtomicU32::new(0));
    let disconnects = Arc::new(AtomicU32::new(0));

    let c = Arc::clone(&connects);
    provider.on(event::CONNECT, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    let d = Arc::clone(&disconnects);
    provider.on(event::DISCONNECT, move |_| {
        d.fetch_add(1, Ordering::SeqCst);
    });

    provider
        .request("eip155:11155111", "eth_blockNumber", vec![])
        .await
        .unwrap();
    provider
        .request("eip155:11155111", "eth_blockNumber", vec![])
        .await
        .unwrap();
    provider.disconnect();
    provider.disconnect(); // idempotent

    assert_eq!(connects.load(Ordering::SeqCst), 1);
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn switch_chain_emits_chain_changed_with_new_cursor() {
    let remote = Arc::new(MockRemote::default());
    let provider = provider_with(remote);

    let changed = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let ch = Arc::clone(&changed);
    provider.on(event::CHAIN_CHANGED, move |payload| {
        ch.lock()
            .push(payload["chainId"].as_str().unwrap().to_string());
    });

    provider
        .request(
            "eip155:11155111",
            "wallet_switchEthereumChain",
            vec![json!({ "chainId": "0xaa36a7" })],
        )
        .await
        .unwrap();

    // 0xaa36a7 == 11155111: cursor unchanged, no event
    assert!(changed.lock().is_empty());

    provider
        .request(
            "eip155:11155111",
            "wallet_switchEthereumChain",
            vec![json!({ "chainId": "0x2105" })],
        )
        .await
        .unwrap();

    assert_eq!(*changed.lock(), vec!["eip155:8453".to_string()]);
    assert_eq!(provider.chain(), ChainRef::parse("eip155:8453").unwrap());
}

#[tokio::test]
async fn concurrent_requests_complete_independently() {
    let remote = Arc::new(MockRemote::default());
    let provider = Arc::new(provider_with(remote.clone()));
    provider.set_address(Namespace::Eip155, "0xABC");

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let p = Arc::clone(&provider);
            tokio::spawn(async move {
                let method = if i % 2 == 0 {
                    "eth_blockNumber"
                } else {
                    "personal_sign"
                };
                p.request("eip155:11155111", method, vec![json!(i)]).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(remote.execute_count(), 20);
}
