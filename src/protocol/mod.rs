//! Wire formats spoken by the bridge.
//!
//! # Protocol Overview
//!
//! | Message Type | Side | Purpose |
//! |--------------|------|---------|
//! | [`Packet`] | stdio | One JSON line: event name + payload |
//! | [`EnginePacket`] | socket | Engine.IO frame (open, heartbeat, message) |
//! | [`SocketPacket`] | socket | Socket.IO packet inside an Engine.IO message |
//!
//! [`ServerEvent`] is the closed set of event names forwarded from the
//! socket to stdout.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `engine` | Engine.IO frame codec |
//! | `event` | Forwarded event names |
//! | `packet` | Line protocol framing |
//! | `socket` | Socket.IO packet codec |

// ============================================================================
// Submodules
// ============================================================================

/// Engine.IO frame codec.
pub mod engine;

/// Forwarded server event names.
pub mod event;

/// Line protocol framing.
pub mod packet;

/// Socket.IO packet codec.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

pub use engine::{EnginePacket, Handshake};
pub use event::ServerEvent;
pub use packet::Packet;
pub use socket::{ROOT_NAMESPACE, SocketPacket};
