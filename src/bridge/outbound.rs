//! Outbound event dispatch: channel events → stdout lines.
//!
//! Every forwarded event is turned into one [`Packet`] line and queued on a
//! single writer task, so lines leave in the order the channel delivered
//! them no matter which task ran the handler.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::protocol::{Packet, ServerEvent};
use crate::transport::Channel;

// ============================================================================
// OutboundSink
// ============================================================================

/// Queue of serialized lines feeding the outbound stream.
#[derive(Debug, Clone)]
pub struct OutboundSink {
    tx: mpsc::UnboundedSender<String>,
}

impl OutboundSink {
    /// Creates a sink and the receiving end of its queue.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Creates a sink whose lines are written to `writer` by a spawned task.
    ///
    /// The task ends once every sink clone is dropped, or on the first
    /// write error.
    pub fn spawn<W>(writer: W) -> (Self, JoinHandle<Result<()>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, rx) = Self::channel();
        let handle = tokio::spawn(write_lines(rx, writer));
        (sink, handle)
    }

    /// Queues one packet.
    ///
    /// Returns `false` if the packet could not be serialized or the writer
    /// is gone.
    pub fn push(&self, packet: &Packet) -> bool {
        let line = match packet.to_line() {
            Ok(line) => line,
            Err(e) => {
                warn!(packet = %packet.packet, error = %e, "Failed to serialize packet");
                return false;
            }
        };

        if self.tx.send(line).is_err() {
            warn!(packet = %packet.packet, "Outbound writer closed");
            return false;
        }

        true
    }
}

/// Writes queued lines until the queue closes.
///
/// Each line is flushed on its own.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the writer fails.
pub async fn write_lines<W>(mut rx: mpsc::UnboundedReceiver<String>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        trace!(bytes = line.len(), "Line written");
    }

    debug!("Outbound queue closed");
    Ok(())
}

// ============================================================================
// Subscription
// ============================================================================

/// Subscribes once to each event, forwarding deliveries to `sink`.
pub fn subscribe_outbound<C>(
    channel: &C,
    events: &[ServerEvent],
    sink: &OutboundSink,
    log_packets: bool,
) where
    C: Channel + ?Sized,
{
    for &event in events {
        let sink = sink.clone();
        let name = event.as_str();

        channel.subscribe(
            name,
            Box::new(move |data: Value| {
                let packet = Packet::new(name, data);
                if log_packets {
                    debug!(packet = name, data = %packet.data, "S -> C");
                }
                sink.push(&packet);
            }),
        );
    }

    debug!(count = events.len(), "Subscribed to server events");
}

// ============================================================================
// Tests
// ============================================================================
