//! Engine.IO v3 and Socket.IO packet codec.
//!
//! Engine.IO frames are a single type digit followed by a payload. A
//! `message` frame (`4`) carries a Socket.IO packet, itself a type digit, an
//! optional `/namespace,` prefix, an optional ack id, and a JSON body:
//!
//! ```text
//! 0{"sid":"abc","pingInterval":25000,"pingTimeout":60000}   open
//! 2 / 3                                                     ping / pong
//! 40                                                        socket connect
//! 42["call",{"calls":{...}}]                                 socket event
//! 44"not authorized"                                        socket error
//! ```

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::{StreamError, StreamResult};

/// Engine.IO protocol revision spoken by the feed.
pub const ENGINE_IO_VERSION: &str = "3";

/// Parameters from the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    /// Session id.
    pub sid: String,
    /// Client ping period in milliseconds.
    pub ping_interval: u64,
    /// Grace period for the pong in milliseconds.
    pub ping_timeout: u64,
}

impl OpenInfo {
    /// Ping period.
    #[must_use]
    pub const fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval)
    }

    /// Time after a ping without a pong before the session is considered dead.
    #[must_use]
    pub const fn pong_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// Engine.IO frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Session opened.
    Open(OpenInfo),
    /// Transport close.
    Close,
    /// Ping with optional probe data.
    Ping(String),
    /// Pong with optional probe data.
    Pong(String),
    /// Socket.IO payload.
    Message(SocketPacket),
    /// Transport upgrade.
    Upgrade,
    /// No-op.
    Noop,
}

impl EnginePacket {
    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Protocol`] on an empty frame, an unknown type
    /// digit, or an undecodable body.
    pub fn decode(frame: &str) -> StreamResult<Self> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| StreamError::Protocol("empty frame".into()))?;
        let body = chars.as_str();
        match kind {
            '0' => serde_json::from_str(body)
                .map(Self::Open)
                .map_err(|e| StreamError::Protocol(format!("bad open packet: {e}"))),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(body.to_string())),
            '3' => Ok(Self::Pong(body.to_string())),
            '4' => SocketPacket::decode(body).map(Self::Message),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(StreamError::Protocol(format!("unknown engine packet type {other:?}"))),
        }
    }

    /// Encode as a text frame.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Open(info) => format!(
                "0{}",
                serde_json::json!({
                    "sid": info.sid,
                    "pingInterval": info.ping_interval,
                    "pingTimeout": info.ping_timeout,
                })
            ),
            Self::Close => "1".into(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(packet) => format!("4{}", packet.encode()),
            Self::Upgrade => "5".into(),
            Self::Noop => "6".into(),
        }
    }
}

/// Socket.IO packet on the default namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace joined.
    Connect,
    /// Namespace left.
    Disconnect,
    /// Named event with its arguments.
    Event {
        /// Event name.
        name: String,
        /// Event arguments.
        args: Vec<Value>,
    },
    /// Acknowledgement.
    Ack(Vec<Value>),
    /// Namespace error, usually an authorization failure.
    Error(Value),
}

impl SocketPacket {
    /// Decode the body of an Engine.IO message frame.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Protocol`] when the packet type is unknown or
    /// an event body is not a JSON array starting with a string.
    pub fn decode(body: &str) -> StreamResult<Self> {
        let mut chars = body.chars();
        let kind = chars
            .next()
            .ok_or_else(|| StreamError::Protocol("empty socket packet".into()))?;
        let rest = strip_ack_id(strip_namespace(chars.as_str()));

        match kind {
            '0' => Ok(Self::Connect),
            '1' => Ok(Self::Disconnect),
            '2' | '5' => {
                let mut items = parse_array(rest)?;
                if items.is_empty() {
                    return Err(StreamError::Protocol("event without a name".into()));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(StreamError::Protocol("event name is not a string".into()));
                };
                Ok(Self::Event { name, args: items })
            }
            '3' | '6' => parse_array(rest).map(Self::Ack),
            '4' => {
                let data = if rest.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(rest).unwrap_or_else(|_| Value::String(rest.to_string()))
                };
                Ok(Self::Error(data))
            }
            other => Err(StreamError::Protocol(format!("unknown socket packet type {other:?}"))),
        }
    }

    /// Encode as a message frame body.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Connect => "0".into(),
            Self::Disconnect => "1".into(),
            Self::Event { name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                format!("2{}", Value::Array(items))
            }
            Self::Ack(args) => format!("3{}", Value::Array(args.clone())),
            Self::Error(data) => format!("4{data}"),
        }
    }

    /// Human-readable message carried by an error packet.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let Self::Error(data) = self else {
            return None;
        };
        Some(match data {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| data.to_string(), str::to_string),
            Value::Null => "unauthorized".to_string(),
            other => other.to_string(),
        })
    }
}

fn strip_namespace(rest: &str) -> &str {
    if rest.starts_with('/') {
        rest.split_once(',').map_or("", |(_, tail)| tail)
    } else {
        rest
    }
}

fn strip_ack_id(rest: &str) -> &str {
    rest.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn parse_array(rest: &str) -> StreamResult<Vec<Value>> {
    match serde_json::from_str(rest) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(StreamError::Protocol("packet body is not an array".into())),
        Err(e) => Err(StreamError::Protocol(format!("bad packet body: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_open_packet() {
        let packet =
            EnginePacket::decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":5000}"#)
                .unwrap();
        let EnginePacket::Open(info) = packet else {
            panic!("expected open");
        };
        assert_eq!(info.sid, "abc");
        assert_eq!(info.ping_interval(), Duration::from_secs(25));
        assert_eq!(info.pong_deadline(), Duration::from_secs(30));
    }

    #[test]
    fn decodes_event_with_payload() {
        let packet = EnginePacket::decode(r#"42["call",{"calls":{"calls":[]}}]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                name: "call".into(),
                args: vec![json!({"calls": {"calls": []}})],
            })
        );
    }

    #[test]
    fn strips_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/live,17["call",1]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                name: "call".into(),
                args: vec![json!(1)],
            }
        );
    }

    #[test]
    fn error_packet_messages() {
        let plain = SocketPacket::decode(r#"4"Not authorized""#).unwrap();
        assert_eq!(plain.error_message().as_deref(), Some("Not authorized"));

        let object = SocketPacket::decode(r#"4{"message":"bad token"}"#).unwrap();
        assert_eq!(object.error_message().as_deref(), Some("bad token"));

        let bare = SocketPacket::decode("4").unwrap();
        assert_eq!(bare.error_message().as_deref(), Some("unauthorized"));

        assert_eq!(SocketPacket::Connect.error_message(), None);
    }

    #[test]
    fn control_frames() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::decode("3probe").unwrap(), EnginePacket::Pong("probe".into()));
        assert_eq!(EnginePacket::decode("40").unwrap(), EnginePacket::Message(SocketPacket::Connect));
        assert_eq!(EnginePacket::decode("41").unwrap(), EnginePacket::Message(SocketPacket::Disconnect));
        assert_eq!(EnginePacket::Ping(String::new()).encode(), "2");
        assert_eq!(EnginePacket::Message(SocketPacket::Disconnect).encode(), "41");
    }

    #[test]
    fn rejects_garbage() {
        assert!(EnginePacket::decode("").is_err());
        assert!(EnginePacket::decode("9").is_err());
        assert!(EnginePacket::decode("0not-json").is_err());
        assert!(EnginePacket::decode("42{}").is_err());
        assert!(EnginePacket::decode("42[5]").is_err());
        assert!(EnginePacket::decode("42[]").is_err());
    }

    #[test]
    fn event_encoding_matches_wire_format() {
        let packet = EnginePacket::Message(SocketPacket::Event {
            name: "call".into(),
            args: vec![json!({"a": 1})],
        });
        assert_eq!(packet.encode(), r#"42["call",{"a":1}]"#);
        assert_eq!(EnginePacket::decode(&packet.encode()).unwrap(), packet);
    }
}
