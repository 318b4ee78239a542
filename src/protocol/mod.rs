//! CDP wire protocol types.
//!
//! This module defines the message shapes exchanged with the browser and
//! the codec that produces and classifies them. It carries no knowledge of
//! individual command semantics; the typed schema layer lives above this
//! crate.
//!
//! # Message Flow
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | envelope | Local → Browser | Command request (`id`, `method`, `params`) |
//! | [`Response`] | Browser → Local | Command reply, matched by `id` |
//! | [`CdpEvent`] | Browser → Local | Unsolicited notification |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Envelope encoding and inbound classification |
//! | `event` | Closed [`CdpEventType`] enumeration |

// ============================================================================
// Submodules
// ============================================================================

/// Envelope encoding and inbound document classification.
pub mod message;

/// CDP notification type enumeration.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::CdpEventType;
pub use message::{CdpEvent, ErrorObject, InboundMessage, Response, decode, encode_command};
