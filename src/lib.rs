//! Chrome DevTools Protocol connection engine.
//!
//! This crate drives a Chromium-family browser through the CDP: JSON
//! documents exchanged over a persistent WebSocket. It provides the
//! protocol connection layer that higher-level automation APIs build on:
//!
//! - **Request/response correlation**: every command gets a monotonic id;
//!   many concurrent callers share one physical connection and each
//!   receives exactly the response matching its own id.
//! - **Event demultiplexing**: unsolicited browser notifications are
//!   classified against a closed event-type table and fanned out to
//!   subscribers in registration order.
//! - **Single dispatch loop**: one sequential task owns all inbound
//!   processing per connection, making resolution race-free and
//!   arrival-ordered.
//! - **Deterministic cleanup**: caller timeouts never cancel in-flight
//!   requests; a periodic sweep bounds the pending table, and closing the
//!   connection fails every outstanding request so nobody hangs.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use chrome_cdp::{ChromeOptions, Launcher, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let browser = Launcher::launch(
//!         ChromeOptions::new("/usr/bin/chromium").with_headless(),
//!     )
//!     .await?;
//!
//!     let version = browser
//!         .connection()
//!         .send("Browser.getVersion", json!({}), Duration::from_secs(30))
//!         .await?;
//!     println!("product: {}", version["product"]);
//!
//!     browser.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | Connection core: id allocator, pending table, dispatch loop |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | Typed event emitter |
//! | [`launcher`] | Browser process launcher and scoped [`Browser`] owner |
//! | [`promise`] | Single-assignment async result slot |
//! | [`protocol`] | Wire codec and event-type enumeration |
//! | [`transport`] | Transport contracts and WebSocket implementation |

// ============================================================================
// Modules
// ============================================================================

/// Connection core: correlation, dispatch loop, send/submit API.
pub mod connection;

/// Error types and result aliases.
pub mod error;

/// Typed event emitter.
pub mod events;

/// Browser process launcher.
pub mod launcher;

/// Single-assignment asynchronous result slot.
pub mod promise;

/// CDP wire protocol types and codec.
pub mod protocol;

/// Transport contracts and WebSocket transport.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{Connection, DEFAULT_COMMAND_TIMEOUT, ResponseFuture};

// Error types
pub use error::{Error, Result};

// Event emitter
pub use events::EventEmitter;

// Launcher types
pub use launcher::{Browser, ChromeOptions, Launcher};

// Promise primitive
pub use promise::Promise;

// Protocol types
pub use protocol::{CdpEvent, CdpEventType, ErrorObject, InboundMessage, Response};

// Transport types
pub use transport::{TransportRx, TransportTx, WebSocketTransport};
