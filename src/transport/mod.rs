//! Socket.IO transport layer.
//!
//! This module owns the single connection between the bridge and the
//! Socket.IO server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Bridge         │                              │  Socket.IO      │
//! │                 │    WebSocket (Engine.IO)     │  Server         │
//! │  Channel trait  │◄────────────────────────────►│                 │
//! │  → Connection   │   ws(s)://host/socket.io/    │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Endpoint::resolve` - Turn `SERVER` into a websocket URL and namespace
//! 2. `Connection::open` - Spawn the event loop; state `Connecting`
//! 3. Engine.IO open + Socket.IO connect; state `Open`
//! 4. Emits and events flow; lost sessions reconnect
//! 5. `Connection::shutdown` or server disconnect; state `Closed`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Send/subscribe capability used by the bridge |
//! | `connection` | WebSocket connection and event loop |
//! | `endpoint` | Server URL resolution |

// ============================================================================
// Submodules
// ============================================================================

/// Send/subscribe capability.
pub mod channel;

/// WebSocket connection and event loop.
pub mod connection;

/// Server URL resolution.
pub mod endpoint;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{Channel, ChannelState, EventHandler};
pub use connection::Connection;
pub use endpoint::Endpoint;
