//! WebSocket transport.
//!
//! Wraps a `tokio-tungstenite` client stream into the crate's transport
//! contracts. The socket is split once at connect time: the sink half goes
//! behind an async mutex so concurrent senders serialize only on the actual
//! write, while the stream half is handed to the dispatch loop as its sole
//! owner.
//!
//! Only text frames carry protocol traffic. Ping, Pong and Binary frames
//! are ignored; a Close frame or stream end terminates delivery.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::error::{Error, Result};

use super::{TransportRx, TransportTx};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Factory for the WebSocket transport halves.
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Establishes the duplex channel to a `ws://` endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`] if the handshake fails.
    pub async fn connect(url: &str) -> Result<(WsTx, WsRx)> {
        let (stream, _response) = connect_async(url).await?;
        debug!(url, "WebSocket connected");

        let (sink, stream) = stream.split();
        Ok((
            WsTx {
                sink: Mutex::new(sink),
            },
            WsRx { stream },
        ))
    }
}

// ============================================================================
// WsTx
// ============================================================================

/// Outbound WebSocket half, shareable across sender tasks.
pub struct WsTx {
    sink: Mutex<SplitSink<WsStream, Message>>,
}

#[async_trait]
impl TransportTx for WsTx {
    async fn send_raw(&self, text: String) -> Result<()> {
        self.sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| Error::transport(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.sink.lock().await.close().await {
            debug!(error = %e, "WebSocket close failed");
        }
    }
}

// ============================================================================
// WsRx
// ============================================================================

/// Inbound WebSocket half, owned by the dispatch loop.
pub struct WsRx {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl TransportRx for WsRx {
    async fn next_message(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.to_string())),

                Some(Ok(Message::Close(_))) => {
                    debug!("WebSocket closed by remote");
                    return None;
                }

                // Ignore Ping, Pong, Binary, Frame
                Some(Ok(_)) => {}

                Some(Err(e)) => return Some(Err(Error::connection_lost(e.to_string()))),

                None => {
                    debug!("WebSocket stream ended");
                    return None;
                }
            }
        }
    }
}
