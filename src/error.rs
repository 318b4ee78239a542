//! Error types for the CDP connection engine.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chrome_cdp::{Connection, Result};
//!
//! async fn example(connection: &Connection) -> Result<()> {
//!     let version = connection
//!         .send("Browser.getVersion", serde_json::json!({}), timeout)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Transport | [`Error::Transport`], [`Error::ConnectionLost`], [`Error::WebSocket`] |
//! | Connection | [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::MalformedMessage`] |
//! | Execution | [`Error::RequestTimeout`], [`Error::Timeout`] |
//! | Launcher | [`Error::Launch`], [`Error::BrowserNotFound`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Per-message transport failure.
    ///
    /// Returned when a single send or receive fails. Only the affected
    /// request is failed; the connection keeps operating.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the I/O failure.
        message: String,
    },

    /// Unrecoverable transport failure.
    ///
    /// Returned when the underlying channel breaks and the dispatch loop
    /// terminates. All pending requests are failed with this error.
    #[error("Connection lost: {message}")]
    ConnectionLost {
        /// Description of the fatal failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Timeout establishing the connection or waiting for the endpoint.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Operation attempted on, or pending during, a closed connection.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Error response returned by the browser.
    ///
    /// Carries the server's error code and message verbatim.
    #[error("Protocol error {code}: {message}")]
    Protocol {
        /// CDP error code (e.g. -32000).
        code: i64,
        /// Error message from the browser.
        message: String,
    },

    /// Inbound document is neither a valid response nor a notification.
    ///
    /// Contained to the single offending message; the connection is not
    /// torn down.
    #[error("Malformed message: {message}")]
    MalformedMessage {
        /// Description of what was wrong with the document.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// No response received within the caller's deadline.
    ///
    /// The in-flight request stays valid; a late response is consumed and
    /// discarded by the dispatch loop.
    #[error("Request {id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Correlation id of the timed-out request.
        id: u64,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Generic wait expiry.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Launcher Errors
    // ========================================================================
    /// Browser binary not found at path.
    #[error("Browser not found at: {path}")]
    BrowserNotFound {
        /// Path where the browser binary was expected.
        path: PathBuf,
    },

    /// Failed to launch or bootstrap the browser process.
    #[error("Failed to launch browser: {message}")]
    Launch {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a per-message transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a fatal connection-lost error.
    #[inline]
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error from a server error object.
    #[inline]
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Creates a malformed message error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(id: u64, timeout_ms: u64) -> Self {
        Self::RequestTimeout { id, timeout_ms }
    }

    /// Creates a generic timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a browser not found error.
    #[inline]
    pub fn browser_not_found(path: impl Into<PathBuf>) -> Self {
        Self::BrowserNotFound { path: path.into() }
    }

    /// Creates a launch error.
    #[inline]
    pub fn launch(message: impl Into<String>) -> Self {
        Self::Launch {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::Timeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionLost { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a server-reported protocol error.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
