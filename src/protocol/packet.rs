//! Line-delimited packet framing.
//!
//! Every line on stdin and stdout is exactly one [`Packet`]:
//!
//! ```json
//! {"packet":"move","data":{"x":1,"y":2}}
//! ```
//!
//! Lines are parsed strictly. Anything that is not a JSON object with a
//! non-empty string `packet` and a `data` member is rejected, and the
//! caller decides what rejection means (the inbound loop stops).

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Packet
// ============================================================================

/// One record of the line protocol: an event name plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Event name.
    pub packet: String,

    /// Event payload, passed through untouched.
    pub data: Value,
}

impl Packet {
    /// Creates a new packet.
    #[inline]
    #[must_use]
    pub fn new(packet: impl Into<String>, data: Value) -> Self {
        Self {
            packet: packet.into(),
            data,
        }
    }

    /// Parses one line (without its trailing newline) into a packet.
    ///
    /// Extra members besides `packet` and `data` are ignored.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the line is not valid JSON
    /// - [`Error::MalformedPacket`] if the value does not have the packet shape
    pub fn from_line(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)?;

        let Value::Object(mut fields) = value else {
            return Err(Error::malformed_packet("not a JSON object"));
        };

        let packet = match fields.remove("packet") {
            Some(Value::String(name)) if !name.is_empty() => name,
            Some(Value::String(_)) => return Err(Error::malformed_packet("empty packet name")),
            Some(_) => return Err(Error::malformed_packet("packet is not a string")),
            None => return Err(Error::malformed_packet("missing packet")),
        };

        let data = fields
            .remove("data")
            .ok_or_else(|| Error::malformed_packet("missing data"))?;

        Ok(Self { packet, data })
    }

    /// Serializes the packet as a single newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload cannot be serialized.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_from_line_move() {
        let packet = Packet::from_line(r#"{"packet":"move","data":{"x":1,"y":2}}"#)
            .expect("valid packet");

        assert_eq!(packet.packet, "move");
        assert_eq!(packet.data, json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_from_line_null_data() {
        let packet = Packet::from_line(r#"{"packet":"get_ready","data":null}"#)
            .expect("null data is a value");
        assert_eq!(packet.data, Value::Null);
    }

    #[test]
    fn test_from_line_ignores_extra_fields() {
        let packet = Packet::from_line(r#"{"data":[1,2],"packet":"look","seq":7}"#)
            .expect("valid packet");
        assert_eq!(packet, Packet::new("look", json!([1, 2])));
    }

    #[test]
    fn test_from_line_not_json() {
        let err = Packet::from_line("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_line_empty_line() {
        assert!(matches!(Packet::from_line(""), Err(Error::Json(_))));
    }

    #[test]
    fn test_from_line_wrong_shapes() {
        for line in [
            "42",
            r#"["move", {}]"#,
            r#"{"data":{}}"#,
            r#"{"packet":7,"data":{}}"#,
            r#"{"packet":"","data":{}}"#,
            r#"{"packet":"move"}"#,
        ] {
            let err = Packet::from_line(line).unwrap_err();
            assert!(
                matches!(err, Error::MalformedPacket { .. }),
                "{line} should be malformed, got {err}"
            );
        }
    }

    #[test]
    fn test_to_line_exact_format() {
        let line = Packet::new("move_rec", json!({"ok": true}))
            .to_line()
            .expect("serializable");
        assert_eq!(line, "{\"packet\":\"move_rec\",\"data\":{\"ok\":true}}\n");
    }

    #[test]
    fn test_to_line_preserves_key_order() {
        let data: Value = serde_json::from_str(r#"{"z":1,"a":2,"m":3}"#).expect("valid json");
        let line = Packet::new("new_board", data)
            .to_line()
            .expect("serializable");
        assert_eq!(
            line,
            "{\"packet\":\"new_board\",\"data\":{\"z\":1,\"a\":2,\"m\":3}}\n"
        );
    }

    #[test]
    fn test_to_line_escapes_embedded_newlines() {
        let line = Packet::new("error", json!("line one\nline two"))
            .to_line()
            .expect("serializable");
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_line_round_trip() {
        let board = json!({"board": [[0, 1], [2, 3]], "turn": 1});
        let original = Packet::new("match_init_rec", board);
        let line = original.to_line().expect("serializable");
        let parsed = Packet::from_line(line.trim_end_matches('\n')).expect("parsable");
        assert_eq!(parsed, original);
    }
}
