//! Socket.IO packet codec.
//!
//! A Socket.IO packet rides inside an Engine.IO message:
//!
//! ```text
//! <type>[<attachments>-][<namespace>,][<ack id>][<json>]
//! ```
//!
//! | Type | Name | JSON |
//! |------|------|------|
//! | `0` | connect | optional auth / handshake data |
//! | `1` | disconnect | - |
//! | `2` | event | `["name", arg, ...]` |
//! | `3` | ack | `[arg, ...]` |
//! | `4` | error / connect_error | error data |
//! | `5` | binary event | unsupported |
//! | `6` | binary ack | unsupported |
//!
//! The root namespace `/` is never written out.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// The default namespace.
pub const ROOT_NAMESPACE: &str = "/";

// ============================================================================
// SocketPacket
// ============================================================================

/// A decoded Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace connect request (client) or acknowledgement (server).
    Connect {
        /// Target namespace.
        nsp: String,
        /// Handshake data, if any.
        data: Option<Value>,
    },

    /// Namespace disconnect.
    Disconnect {
        /// Target namespace.
        nsp: String,
    },

    /// Named event.
    Event {
        /// Target namespace.
        nsp: String,
        /// Acknowledgement id requested by the sender.
        id: Option<u64>,
        /// Event name.
        name: String,
        /// Event arguments after the name.
        args: Vec<Value>,
    },

    /// Acknowledgement of an earlier event.
    Ack {
        /// Target namespace.
        nsp: String,
        /// Acknowledged id.
        id: u64,
        /// Reply arguments.
        args: Vec<Value>,
    },

    /// Error packet (`connect_error` in protocol 5, `error` in protocol 4).
    Error {
        /// Target namespace.
        nsp: String,
        /// Error data, if any.
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Creates an event packet for the given namespace.
    #[inline]
    #[must_use]
    pub fn event(nsp: impl Into<String>, name: impl Into<String>, data: Value) -> Self {
        Self::Event {
            nsp: nsp.into(),
            id: None,
            name: name.into(),
            args: vec![data],
        }
    }

    /// Creates a connect request for the given namespace.
    #[inline]
    #[must_use]
    pub fn connect(nsp: impl Into<String>) -> Self {
        Self::Connect {
            nsp: nsp.into(),
            data: None,
        }
    }

    /// Creates a disconnect packet for the given namespace.
    #[inline]
    #[must_use]
    pub fn disconnect(nsp: impl Into<String>) -> Self {
        Self::Disconnect { nsp: nsp.into() }
    }

    /// Returns the namespace the packet belongs to.
    #[must_use]
    pub fn nsp(&self) -> &str {
        match self {
            Self::Connect { nsp, .. }
            | Self::Disconnect { nsp }
            | Self::Event { nsp, .. }
            | Self::Ack { nsp, .. }
            | Self::Error { nsp, .. } => nsp,
        }
    }

    /// Decodes the payload of an Engine.IO message.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] for unknown types, binary packets or a bad event array
    /// - [`Error::Json`] if the JSON part does not parse
    pub fn decode(payload: &str) -> Result<Self> {
        let mut chars = payload.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::protocol("empty socket.io packet"))?;
        let rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(Error::protocol(
                "binary socket.io packets are not supported",
            ));
        }

        let (nsp, rest) = split_namespace(rest);
        let (id, json) = split_ack_id(rest)?;
        let data = if json.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(json)?)
        };

        match kind {
            '0' => Ok(Self::Connect { nsp, data }),
            '1' => Ok(Self::Disconnect { nsp }),
            '2' => {
                let (name, args) = split_event_array(data)?;
                Ok(Self::Event {
                    nsp,
                    id,
                    name,
                    args,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| Error::protocol("ack without id"))?;
                let args = match data {
                    Some(Value::Array(args)) => args,
                    _ => return Err(Error::protocol("ack payload is not an array")),
                };
                Ok(Self::Ack { nsp, id, args })
            }
            '4' => Ok(Self::Error { nsp, data }),
            other => Err(Error::protocol(format!(
                "unknown socket.io packet type: {other}"
            ))),
        }
    }

    /// Encodes the packet as an Engine.IO message payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if a payload cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        let (kind, id, json) = match self {
            Self::Connect { data, .. } => ('0', None, data.as_ref().map(serde_json::to_string)),
            Self::Disconnect { .. } => ('1', None, None),
            Self::Event { id, name, args, .. } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                ('2', *id, Some(serde_json::to_string(&array)))
            }
            Self::Ack { id, args, .. } => ('3', Some(*id), Some(serde_json::to_string(args))),
            Self::Error { data, .. } => ('4', None, data.as_ref().map(serde_json::to_string)),
        };

        let mut out = String::new();
        out.push(kind);

        let nsp = self.nsp();
        if nsp != ROOT_NAMESPACE && !nsp.is_empty() {
            out.push_str(nsp);
            out.push(',');
        }

        if let Some(id) = id {
            out.push_str(&id.to_string());
        }

        if let Some(json) = json {
            out.push_str(&json?);
        }

        Ok(out)
    }
}

// ============================================================================
// Decoding Helpers
// ============================================================================

/// Splits a leading `/namespace,` off the packet body.
fn split_namespace(rest: &str) -> (String, &str) {
    if !rest.starts_with('/') {
        return (ROOT_NAMESPACE.to_string(), rest);
    }

    match rest.find(',') {
        Some(end) => (rest[..end].to_string(), &rest[end + 1..]),
        None => (rest.to_string(), ""),
    }
}

/// Splits leading ack id digits off the packet body.
fn split_ack_id(rest: &str) -> Result<(Option<u64>, &str)> {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Ok((None, rest));
    }

    let id = rest[..digits]
        .parse()
        .map_err(|_| Error::protocol("ack id out of range"))?;
    Ok((Some(id), &rest[digits..]))
}

/// Splits an event array into its name and arguments.
fn split_event_array(data: Option<Value>) -> Result<(String, Vec<Value>)> {
    let Some(Value::Array(mut array)) = data else {
        return Err(Error::protocol("event payload is not an array"));
    };

    if array.is_empty() {
        return Err(Error::protocol("event array is empty"));
    }

    match array.remove(0) {
        Value::String(name) => Ok((name, array)),
        _ => Err(Error::protocol("event name is not a string")),
    }
}

// ============================================================================
// Tests
// ============================================================================
