//! Bridge and channel configuration.
//!
//! One configuration surface covers both transport variants. The variant
//! decides the default server, the Engine.IO protocol revision and the
//! connection details; the forwarded event list is configured alongside it.
//!
//! # Example
//!
//! ```ignore
//! use packet_bridge::{BridgeOptions, ServerEvent, TransportVariant};
//!
//! let options = BridgeOptions::new(TransportVariant::Modern)
//!     .with_server("https://game.example.com")
//!     .with_events(ServerEvent::reduced());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::protocol::ServerEvent;

// ============================================================================
// Constants
// ============================================================================

/// Default server for the legacy variant.
pub const LEGACY_DEFAULT_SERVER: &str = "http://localhost:3000";

/// Default server for the modern variant.
pub const MODERN_DEFAULT_SERVER: &str = "https://blockly.kbylabs.com";

/// Port the modern variant always connects to.
pub const MODERN_PORT: u16 = 443;

/// Engine.IO endpoint path.
pub const ENGINE_PATH: &str = "/socket.io/";

/// Names a Socket.IO v4 client refuses to emit.
const MODERN_RESERVED_EVENTS: &[&str] = &[
    "connect",
    "connect_error",
    "disconnect",
    "disconnecting",
    "newListener",
    "removeListener",
];

/// Names a Socket.IO v2 client emits locally instead of sending.
const LEGACY_RESERVED_EVENTS: &[&str] = &[
    "connect",
    "connect_error",
    "connect_timeout",
    "connecting",
    "disconnect",
    "error",
    "reconnect",
    "reconnect_attempt",
    "reconnect_failed",
    "reconnect_error",
    "reconnecting",
    "ping",
    "pong",
];

// ============================================================================
// TransportVariant
// ============================================================================

/// Which Socket.IO generation the channel speaks.
///
/// Exactly one variant is active per process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransportVariant {
    /// Socket.IO v2 over Engine.IO 3, plain address, scheme default port.
    #[default]
    Legacy,
    /// Socket.IO v4 over Engine.IO 4, secure websocket on port 443.
    Modern,
}

impl TransportVariant {
    /// Engine.IO protocol revision sent as the `EIO` query parameter.
    #[inline]
    #[must_use]
    pub const fn engine_protocol(self) -> u8 {
        match self {
            Self::Legacy => 3,
            Self::Modern => 4,
        }
    }

    /// Server used when `SERVER` is unset.
    #[inline]
    #[must_use]
    pub const fn default_server(self) -> &'static str {
        match self {
            Self::Legacy => LEGACY_DEFAULT_SERVER,
            Self::Modern => MODERN_DEFAULT_SERVER,
        }
    }

    /// Whether the client drives the heartbeat (Engine.IO 3).
    #[inline]
    #[must_use]
    pub const fn client_pings(self) -> bool {
        matches!(self, Self::Legacy)
    }

    /// Whether the root namespace needs an explicit connect packet.
    #[inline]
    #[must_use]
    pub const fn connects_root_explicitly(self) -> bool {
        matches!(self, Self::Modern)
    }

    /// Whether the variant forces `wss` on port 443.
    #[inline]
    #[must_use]
    pub const fn forces_secure(self) -> bool {
        matches!(self, Self::Modern)
    }

    /// Event under which the server's error packet is delivered.
    #[inline]
    #[must_use]
    pub const fn error_event(self) -> &'static str {
        match self {
            Self::Legacy => "error",
            Self::Modern => "connect_error",
        }
    }

    /// Returns `true` if `event` is reserved by this variant's client.
    #[must_use]
    pub fn is_reserved(self, event: &str) -> bool {
        let reserved = match self {
            Self::Legacy => LEGACY_RESERVED_EVENTS,
            Self::Modern => MODERN_RESERVED_EVENTS,
        };
        reserved.contains(&event)
    }
}

// ============================================================================
// ChannelOptions
// ============================================================================

/// Connection settings for the channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Server URL as configured.
    pub server: String,

    /// Transport variant.
    pub variant: TransportVariant,

    /// Reconnect after a lost session or failed dial.
    pub reconnection: bool,

    /// Give up after this many consecutive failed attempts (`None` = never).
    pub reconnection_attempts: Option<u32>,

    /// First reconnect delay.
    pub reconnection_delay: Duration,

    /// Upper bound for the reconnect delay.
    pub reconnection_delay_max: Duration,

    /// Bound on dial plus handshake.
    pub connect_timeout: Duration,
}

impl ChannelOptions {
    /// Creates options for the variant with its default server.
    #[must_use]
    pub fn new(variant: TransportVariant) -> Self {
        Self {
            server: variant.default_server().to_string(),
            variant,
            reconnection: true,
            reconnection_attempts: None,
            reconnection_delay: Duration::from_millis(1000),
            reconnection_delay_max: Duration::from_millis(5000),
            connect_timeout: Duration::from_millis(20_000),
        }
    }

    /// Sets the server URL.
    #[inline]
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Enables or disables reconnection.
    #[inline]
    #[must_use]
    pub fn with_reconnection(mut self, enabled: bool) -> Self {
        self.reconnection = enabled;
        self
    }

    /// Caps the number of consecutive reconnect attempts.
    #[inline]
    #[must_use]
    pub fn with_reconnection_attempts(mut self, attempts: u32) -> Self {
        self.reconnection_attempts = Some(attempts);
        self
    }

    /// Sets the reconnect delay bounds.
    #[inline]
    #[must_use]
    pub fn with_reconnection_delay(mut self, delay: Duration, max: Duration) -> Self {
        self.reconnection_delay = delay;
        self.reconnection_delay_max = max;
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Delay before reconnect attempt number `attempt` (zero-based).
    ///
    /// Doubles from `reconnection_delay` up to `reconnection_delay_max`.
    #[must_use]
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.reconnection_delay
            .saturating_mul(factor)
            .min(self.reconnection_delay_max)
    }

    /// Returns `true` if another attempt is allowed after `failures` failures.
    #[inline]
    #[must_use]
    pub fn may_reconnect(&self, failures: u32) -> bool {
        self.reconnection
            && self
                .reconnection_attempts
                .is_none_or(|limit| failures < limit)
    }
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self::new(TransportVariant::default())
    }
}

// ============================================================================
// BridgeOptions
// ============================================================================

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Channel settings.
    pub channel: ChannelOptions,

    /// Server events forwarded to stdout.
    pub events: Vec<ServerEvent>,

    /// Log every packet crossing the bridge.
    pub log_packets: bool,
}

impl BridgeOptions {
    /// Creates options for the variant with the standard event set.
    #[must_use]
    pub fn new(variant: TransportVariant) -> Self {
        Self {
            channel: ChannelOptions::new(variant),
            events: ServerEvent::standard(),
            log_packets: false,
        }
    }

    /// Sets the server URL.
    #[inline]
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.channel.server = server.into();
        self
    }

    /// Replaces the forwarded event set.
    #[inline]
    #[must_use]
    pub fn with_events(mut self, events: impl IntoIterator<Item = ServerEvent>) -> Self {
        self.events = events.into_iter().collect();
        self
    }

    /// Enables packet logging.
    #[inline]
    #[must_use]
    pub fn with_packet_logging(mut self, enabled: bool) -> Self {
        self.log_packets = enabled;
        self
    }

    /// Returns the transport variant.
    #[inline]
    #[must_use]
    pub fn variant(&self) -> TransportVariant {
        self.channel.variant
    }
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::new(TransportVariant::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
