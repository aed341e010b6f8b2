//! Inbound line loop: stdin lines → channel emits.
//!
//! The loop has two states, reading and terminated. Every well-formed line
//! becomes exactly one [`Channel::send`]; the first line that is not a
//! packet, the end of input, a read error or a rejected send ends the loop
//! for good. Nothing is written back for any of these.

// ============================================================================
// Imports
// ============================================================================

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace};

use crate::error::Error;
use crate::protocol::Packet;
use crate::transport::Channel;

// ============================================================================
// Termination
// ============================================================================

/// Why the inbound loop stopped.
#[derive(Debug)]
pub enum Termination {
    /// The inbound stream ended.
    EndOfInput,
    /// A line was not valid JSON or not packet-shaped.
    Malformed(Error),
    /// The inbound stream failed (including invalid UTF-8).
    ReadFailed(Error),
    /// The channel refused an emit.
    SendFailed(Error),
}

impl Termination {
    /// Returns `true` if the input simply ran out.
    #[inline]
    #[must_use]
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput)
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Forwards every line of `reader` to `channel` until termination.
///
/// Lines are forwarded in read order. The payload is passed through
/// untouched.
pub async fn run_inbound<R, C>(reader: R, channel: &C, log_packets: bool) -> Termination
where
    R: AsyncBufRead + Unpin,
    C: Channel + ?Sized,
{
    let mut lines = reader.lines();
    let mut forwarded: u64 = 0;

    let termination = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Termination::EndOfInput,
            Err(e) => break Termination::ReadFailed(e.into()),
        };

        let packet = match Packet::from_line(&line) {
            Ok(packet) => packet,
            Err(e) => break Termination::Malformed(e),
        };

        if log_packets {
            debug!(packet = %packet.packet, data = %packet.data, "C -> S");
        } else {
            trace!(packet = %packet.packet, "Forwarding line");
        }

        if let Err(e) = channel.send(&packet.packet, packet.data) {
            break Termination::SendFailed(e);
        }
        forwarded += 1;
    };

    debug!(forwarded, ?termination, "Inbound loop terminated");
    termination
}

// ============================================================================
// Tests
// ============================================================================
