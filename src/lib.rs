//! Packet bridge - newline-delimited JSON on stdio to a Socket.IO channel.
//!
//! This library lets a process that only speaks line-delimited JSON over
//! its standard streams take part in a Socket.IO event protocol.
//!
//! # Architecture
//!
//! The bridge sits between a host process and one Socket.IO server:
//!
//! - **Inbound (stdin → server)**: each line `{"packet": name, "data": value}`
//!   is emitted as event `name` with payload `value`
//! - **Outbound (server → stdout)**: each delivered event from a fixed set is
//!   written as one line of the same shape
//!
//! Key design principles:
//!
//! - Exactly one channel per process, owned by [`Connection`]
//! - The bridge only sees the [`Channel`] capability (send + subscribe)
//! - Malformed input stops the inbound loop silently (fail-fast)
//! - Transport errors are events like any other (`error`, `connect_error`)
//!
//! # Quick Start
//!
//! ```no_run
//! use packet_bridge::{Bridge, BridgeOptions, Connection, OutboundSink, Result};
//! use tokio::io::{BufReader, stdin, stdout};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let options = BridgeOptions::from_env();
//!     let connection = Connection::open(options.channel.clone())?;
//!
//!     let (sink, _writer) = OutboundSink::spawn(stdout());
//!     let bridge = Bridge::new(connection.clone(), &options);
//!     bridge.subscribe_outbound(&sink);
//!
//!     bridge.run_inbound(BufReader::new(stdin())).await;
//!     connection.closed().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Inbound line loop and outbound event dispatch |
//! | [`config`] | [`BridgeOptions`], [`ChannelOptions`], [`TransportVariant`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Line packets, event names, Engine.IO and Socket.IO codecs |
//! | [`transport`] | Socket.IO connection (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Protocol bridge.
///
/// - [`Bridge`] - Ties a [`Channel`] to the standard streams
/// - [`OutboundSink`] - Ordered single-writer queue for stdout
pub mod bridge;

/// Configuration.
///
/// Use [`BridgeOptions::from_env`] to read `SERVER`, `MODERN` and `LOG`.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Wire formats.
///
/// Line packets on stdio, Engine.IO frames and Socket.IO packets on the socket.
pub mod protocol;

/// Socket.IO transport layer.
///
/// Internal module owning the websocket connection and its event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{Bridge, OutboundSink, Termination};

// Configuration types
pub use config::{BridgeOptions, ChannelOptions, TransportVariant};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{Packet, ServerEvent};

// Transport types
pub use transport::{Channel, ChannelState, Connection, EventHandler};
