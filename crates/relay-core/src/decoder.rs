//! Event decoder — classifies raw inbound frames.
//!
//! Decoding never fails the caller: a frame that cannot be understood is
//! reported as ignored and dropped, so older clients survive newer backends.

use relay_types::protocol::ServerEvent;
use serde_json::Value;

/// Result of decoding one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(ServerEvent),
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not JSON, not an object, or a known kind with missing/invalid fields
    Malformed,
    /// A `type` this client does not know
    UnknownKind(String),
}

/// Decode one raw text frame.
pub fn decode_frame(raw: &str) -> Decoded {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => decode_value(value),
        Err(e) => {
            log::debug!("Dropping non-JSON frame: {}", e);
            Decoded::Ignored(IgnoreReason::Malformed)
        }
    }
}

/// Decode an already-parsed record (live frame or history entry).
pub fn decode_value(value: Value) -> Decoded {
    let kind = match value.get("type").and_then(Value::as_str) {
        Some(kind) => kind.to_string(),
        None => {
            log::debug!("Dropping frame without a type tag");
            return Decoded::Ignored(IgnoreReason::Malformed);
        }
    };

    match serde_json::from_value::<ServerEvent>(value) {
        Ok(ServerEvent::Unknown) => {
            log::debug!("Ignoring unknown event kind {:?}", kind);
            Decoded::Ignored(IgnoreReason::UnknownKind(kind))
        }
        Ok(event) => Decoded::Event(event),
        Err(e) => {
            log::debug!("Dropping malformed {:?} frame: {}", kind, e);
            Decoded::Ignored(IgnoreReason::Malformed)
        }
    }
}

impl Decoded {
    pub fn into_event(self) -> Option<ServerEvent> {
        match self {
            Decoded::Event(event) => Some(event),
            Decoded::Ignored(_) => None,
        }
    }
}
