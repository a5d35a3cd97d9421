//! In-memory transport for testing and local development
//!
//! Plays the relay's side of the session: tests inject inbound frames and
//! observe what the peer sent, without a socket.

use crate::error::Result;
use crate::transport::{Transport, TransportSession};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Default)]
struct MemoryState {
    opened: AtomicUsize,
    urls: Mutex<Vec<String>>,
    /// Sender for the current session's inbound channel
    peer: Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Frames the peer sent outbound
    sent: Mutex<Vec<String>>,
}

/// In-memory [`Transport`] double
///
/// Cloning yields a handle to the same underlying state, so a test can keep
/// one handle while the peer owns the other.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<MemoryState>,
}

impl MemoryTransport {
    /// Create a new in-memory transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a frame as if the relay delivered it
    ///
    /// Returns false when no session is open.
    pub fn push_inbound(&self, frame: impl Into<String>) -> bool {
        match self.state.peer.lock().as_ref() {
            Some(sender) => sender.send(frame.into()).is_ok(),
            None => false,
        }
    }

    /// Close the relay side of the current session
    pub fn close(&self) {
        *self.state.peer.lock() = None;
    }

    /// Frames the peer sent outbound, in order
    pub fn sent(&self) -> Vec<String> {
        self.state.sent.lock().clone()
    }

    /// How many sessions have been opened
    pub fn open_count(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// URLs passed to `open`, in order
    pub fn urls(&self) -> Vec<String> {
        self.state.urls.lock().clone()
    }

    /// Wait until at least `count` outbound frames have been captured
    pub async fn wait_sent(&self, count: usize, timeout: std::time::Duration) -> Vec<String> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            if std::time::Instant::now() > deadline {
                return sent;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, url: &str) -> Result<TransportSession> {
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.urls.lock().push(url.to_string());
        *self.state.peer.lock() = Some(in_tx);

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                state.sent.lock().push(frame);
            }
        });

        Ok(TransportSession {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let transport = MemoryTransport::new();
        let mut session = transport.open("memory://relay").await.unwrap();

        assert!(transport.push_inbound("hello"));
        assert_eq!(session.inbound.recv().await.unwrap(), "hello");

        session.outbound.send("world".to_string()).unwrap();
        let sent = transport
            .wait_sent(1, std::time::Duration::from_secs(1))
            .await;
        assert_eq!(sent, vec!["world".to_string()]);
    }

    #[tokio::test]
    async fn test_close_ends_inbound() {
        let transport = MemoryTransport::new();
        let mut session = transport.open("memory://relay").await.unwrap();

        transport.close();
        assert_eq!(session.inbound.recv().await, None);
        assert!(!transport.push_inbound("late"));
    }

    #[tokio::test]
    async fn test_open_replaces_peer() {
        let transport = MemoryTransport::new();
        let _first = transport.open("memory://a").await.unwrap();
        let mut second = transport.open("memory://b").await.unwrap();

        assert_eq!(transport.open_count(), 2);
        assert_eq!(transport.urls(), vec!["memory://a", "memory://b"]);

        // Frames land in the most recent session
        transport.push_inbound("frame");
        assert_eq!(second.inbound.recv().await.unwrap(), "frame");
    }
}
