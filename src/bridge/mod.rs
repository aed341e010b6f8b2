//! Protocol bridge between the line protocol and the channel.
//!
//! # Data Flow
//!
//! ```text
//! stdin line ─► Packet::from_line ─► Channel::send ─► server
//! server ─► subscribed handler ─► Packet::to_line ─► writer task ─► stdout
//! ```
//!
//! Subscriptions are registered once, before the inbound loop starts, for
//! each configured [`ServerEvent`](crate::protocol::ServerEvent).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `inbound` | Line loop and its termination reasons |
//! | `outbound` | Event subscriptions and the stdout writer |

// ============================================================================
// Imports
// ============================================================================

use tokio::io::AsyncBufRead;

use crate::config::BridgeOptions;
use crate::protocol::ServerEvent;
use crate::transport::Channel;

// ============================================================================
// Submodules
// ============================================================================

/// Inbound line loop.
pub mod inbound;

/// Outbound event dispatch.
pub mod outbound;

// ============================================================================
// Re-exports
// ============================================================================

pub use inbound::{Termination, run_inbound};
pub use outbound::{OutboundSink, subscribe_outbound, write_lines};

// ============================================================================
// Bridge
// ============================================================================

/// Translates between line-delimited packets and channel events.
pub struct Bridge<C> {
    /// Channel used for both directions.
    channel: C,
    /// Server events forwarded to the outbound stream.
    events: Vec<ServerEvent>,
    /// Log every packet crossing the bridge.
    log_packets: bool,
}

impl<C: Channel> Bridge<C> {
    /// Creates a bridge over `channel`.
    #[must_use]
    pub fn new(channel: C, options: &BridgeOptions) -> Self {
        Self {
            channel,
            events: options.events.clone(),
            log_packets: options.log_packets,
        }
    }

    /// Returns the underlying channel.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Returns the forwarded event names.
    #[inline]
    #[must_use]
    pub fn events(&self) -> &[ServerEvent] {
        &self.events
    }

    /// Subscribes each forwarded event, writing deliveries to `sink`.
    ///
    /// Call once, before [`Bridge::run_inbound`].
    pub fn subscribe_outbound(&self, sink: &OutboundSink) {
        subscribe_outbound(&self.channel, &self.events, sink, self.log_packets);
    }

    /// Runs the inbound line loop until it terminates.
    pub async fn run_inbound<R>(&self, reader: R) -> Termination
    where
        R: AsyncBufRead + Unpin,
    {
        run_inbound(reader, &self.channel, self.log_packets).await
    }
}

// ============================================================================
// Test Support
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
