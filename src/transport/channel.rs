//! The channel capability seen by the bridge.
//!
//! The bridge never touches connection internals. It only needs to emit a
//! named event and to register a handler per event name; [`Channel`] is
//! that seam, implemented by [`Connection`](super::Connection) and by test
//! doubles.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called with the event payload each time the event is delivered.
/// Handlers run on the channel's event loop and must not block.
pub type EventHandler = Box<dyn Fn(Value) + Send + Sync>;

// ============================================================================
// ChannelState
// ============================================================================

/// Lifecycle of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Dialing, handshaking or waiting to reconnect.
    Connecting,
    /// Namespace connected; emits go out immediately.
    Open,
    /// Gone for good.
    Closed,
}

// ============================================================================
// Channel
// ============================================================================

/// Send/subscribe capability of an event channel.
pub trait Channel {
    /// Emits `event` with `payload`.
    ///
    /// While the channel is still connecting the emit is buffered by the
    /// transport and flushed once it opens.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) if the channel is gone
    /// - [`Error::ReservedEvent`](crate::Error::ReservedEvent) if the transport reserves the name
    fn send(&self, event: &str, payload: Value) -> Result<()>;

    /// Registers `handler` for `event`, replacing any earlier handler.
    fn subscribe(&self, event: &str, handler: EventHandler);
}
