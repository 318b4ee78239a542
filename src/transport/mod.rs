//! Transport layer for the CDP channel.
//!
//! The connection core is transport-agnostic: it sends through a
//! [`TransportTx`] shared by every caller and drains inbound text through a
//! [`TransportRx`] owned exclusively by the dispatch loop. Framing and
//! encryption are the transport's business; the core only sees whole text
//! documents.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `ws` | WebSocket transport via `tokio-tungstenite` |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket transport implementation.
pub mod ws;

// ============================================================================
// Re-exports
// ============================================================================

pub use ws::{WebSocketTransport, WsRx, WsTx};

// ============================================================================
// Contracts
// ============================================================================

/// Outbound half of a duplex channel.
///
/// Shared by all sender tasks. A failed send surfaces synchronously to the
/// caller that attempted it; the channel itself may or may not survive.
#[async_trait]
pub trait TransportTx: Send + Sync + 'static {
    /// Transmits one raw text document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the write
    /// fails.
    async fn send_raw(&self, text: String) -> Result<()>;

    /// Closes the outbound half. Best effort; errors are swallowed.
    async fn close(&self);
}

/// Inbound half of a duplex channel.
///
/// Owned exclusively by the connection's dispatch loop, which is the only
/// consumer; delivery is therefore effectively single-threaded.
#[async_trait]
pub trait TransportRx: Send + 'static {
    /// Waits for the next inbound text document.
    ///
    /// Returns `None` once the channel has closed cleanly, or `Some(Err)`
    /// on an unrecoverable transport failure.
    async fn next_message(&mut self) -> Option<Result<String>>;
}
