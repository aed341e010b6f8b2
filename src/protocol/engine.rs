//! Engine.IO packet codec (websocket transport).
//!
//! Over a websocket every text frame is one Engine.IO packet: a single
//! type digit followed by an optional payload.
//!
//! | Type | Name | Payload |
//! |------|------|---------|
//! | `0` | open | handshake JSON |
//! | `1` | close | - |
//! | `2` | ping | optional probe text |
//! | `3` | pong | optional probe text |
//! | `4` | message | Socket.IO packet |
//! | `5` | upgrade | - |
//! | `6` | noop | - |
//!
//! Protocol 3 and 4 use the same text encoding on a websocket; they differ
//! in who sends pings, which is handled by the connection.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

// ============================================================================
// Handshake
// ============================================================================

/// Payload of the Engine.IO open packet.
///
/// # Format
///
/// ```json
/// {"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine.IO session id.
    pub sid: String,

    /// Transports the server would upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,

    /// Heartbeat interval in milliseconds.
    pub ping_interval: u64,

    /// Heartbeat grace period in milliseconds.
    pub ping_timeout: u64,

    /// Maximum payload size in bytes (protocol 4 only).
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// Time after which a silent server is considered gone.
    #[inline]
    #[must_use]
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }

    /// Interval at which a protocol 3 client pings.
    #[inline]
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval)
    }
}

// ============================================================================
// EnginePacket
// ============================================================================

/// A decoded Engine.IO packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    /// Session opened.
    Open(Handshake),
    /// Session closed by the peer.
    Close,
    /// Heartbeat probe.
    Ping(String),
    /// Heartbeat reply.
    Pong(String),
    /// Socket.IO payload.
    Message(String),
    /// Transport upgrade (unused on websocket-only sessions).
    Upgrade,
    /// No operation.
    Noop,
}

impl EnginePacket {
    /// Decodes one websocket text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] for an empty frame or unknown packet type
    /// - [`Error::Json`] for an open packet with an invalid handshake
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::protocol("empty engine.io frame"))?;
        let payload = chars.as_str();

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(payload)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(payload.to_string())),
            '3' => Ok(Self::Pong(payload.to_string())),
            '4' => Ok(Self::Message(payload.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(Error::protocol(format!(
                "unknown engine.io packet type: {other}"
            ))),
        }
    }

    /// Encodes a client-side packet as a websocket text frame.
    ///
    /// Open packets are server-only and encode as their type digit alone.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Open(_) => "0".to_string(),
            Self::Close => "1".to_string(),
            Self::Ping(probe) => format!("2{probe}"),
            Self::Pong(probe) => format!("3{probe}"),
            Self::Message(payload) => format!("4{payload}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
