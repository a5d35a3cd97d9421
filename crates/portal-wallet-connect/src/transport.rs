//! Session transport abstraction
//!
//! The peer talks to the relay through a [`Transport`], which opens a
//! [`TransportSession`] of paired channels. The WebSocket implementation
//! pumps frames between the socket and the channels on spawned tasks, so the
//! receive side arrives on an implementation-chosen task and the session
//! layer never touches the socket directly. An in-memory implementation
//! lives in [`crate::memory`] for tests and local development.

use crate::error::{ConnectError, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info};

/// An open transport session
///
/// Dropping either half tears the session down: the write pump exits when
/// `outbound` closes and the session layer observes closure when `inbound`
/// yields `None`.
pub struct TransportSession {
    /// Frames to send to the relay
    pub outbound: mpsc::UnboundedSender<String>,
    /// Frames received from the relay, in arrival order
    pub inbound: mpsc::UnboundedReceiver<String>,
}

/// Transport capable of opening relay sessions
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session to the given relay URL
    async fn open(&self, url: &str) -> Result<TransportSession>;
}

/// WebSocket transport over tokio-tungstenite
#[derive(Debug, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Create a new WebSocket transport
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, url: &str) -> Result<TransportSession> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| ConnectError::Transport(format!("WebSocket connection failed: {}", e)))?;

        info!(url = %url, "connected to session relay");

        let (mut write, mut read) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        // Write pump: drains the outbound channel into the socket and sends
        // a close frame when the session layer drops its sender.
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    error!(error = %e, "WebSocket send failed");
                    break;
                }
            }
            let _ = write.send(Message::Close(None)).await;
            debug!("write pump finished");
        });

        // Read pump: forwards text frames in arrival order until the socket
        // closes or the session layer drops its receiver.
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(text.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("WebSocket closed by relay");
                        break;
                    }
                    Ok(Message::Ping(_)) => {
                        debug!("received ping");
                    }
                    Err(e) => {
                        error!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
            debug!("read pump finished");
        });

        Ok(TransportSession {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
