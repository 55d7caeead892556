//! Decoded messages and payloads.
//!
//! - [`Payload`]: a frame payload, parsed as JSON when possible
//! - [`Message`]: headers, payload and declared length of one frame
//! - [`EventInfo`]: the well-known event headers pulled out of a message

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::headers::Headers;

/// Well-known header names, each with its colon-prefixed variant.
pub mod header_names {
    pub const EVENT_TYPE: &str = ":event-type";
    pub const EVENT_TYPE_BARE: &str = "event-type";
    pub const CONTENT_TYPE: &str = ":content-type";
    pub const CONTENT_TYPE_BARE: &str = "content-type";
    pub const MESSAGE_TYPE: &str = ":message-type";
    pub const MESSAGE_TYPE_BARE: &str = "message-type";
}

/// Payload of a decoded frame.
///
/// Non-empty payloads are decoded as UTF-8 text, with invalid sequences
/// replaced by U+FFFD and a leading byte order mark removed. Text that parses
/// as JSON becomes [`Payload::Json`]. Anything else is kept as
/// [`Payload::Raw`] bytes, unchanged.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Payload {
    /// The frame carried no payload bytes.
    #[default]
    Empty,
    /// Payload parsed as JSON.
    Json(Value),
    /// Payload that is not JSON.
    Raw(Bytes),
}

impl Payload {
    /// Interpret payload bytes. Never fails: unparseable bytes stay raw.
    pub fn from_bytes(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Payload::Empty;
        }

        let text = String::from_utf8_lossy(&bytes);
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);

        match serde_json::from_str::<Value>(text) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Raw(bytes),
        }
    }

    /// Check if the frame carried no payload.
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Get the JSON value, if the payload parsed as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Get the raw bytes, if the payload did not parse as JSON.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Payload::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Deserialize the payload into a typed value.
    ///
    /// JSON payloads deserialize from the parsed value. Raw and empty payloads
    /// are handed to `serde_json` as-is, so they produce its parse error.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self {
            Payload::Json(value) => T::deserialize(value),
            Payload::Raw(bytes) => serde_json::from_slice(bytes),
            Payload::Empty => serde_json::from_slice(&[]),
        }
    }
}

/// One decoded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    headers: Headers,
    payload: Payload,
    total_length: u32,
}

impl Message {
    /// Create a message from decoded parts.
    pub fn new(headers: Headers, payload: Payload, total_length: u32) -> Self {
        Self {
            headers,
            payload,
            total_length,
        }
    }

    /// Get all string-valued headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Get the payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Get the declared length of the frame this message came from.
    pub fn total_length(&self) -> u32 {
        self.total_length
    }

    /// Consume the message and return `(headers, payload, total_length)`.
    pub fn into_parts(self) -> (Headers, Payload, u32) {
        (self.headers, self.payload, self.total_length)
    }
}

/// Event headers extracted from a [`Message`].
///
/// Each field prefers the colon-prefixed header (`:event-type`) and falls
/// back to the bare name (`event-type`).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct EventInfo {
    pub event_type: Option<String>,
    pub content_type: Option<String>,
    pub message_type: Option<String>,
    pub payload: Payload,
}

impl EventInfo {
    fn lookup(headers: &Headers, prefixed: &str, bare: &str) -> Option<String> {
        headers
            .get(prefixed)
            .filter(|value| !value.is_empty())
            .or_else(|| headers.get(bare))
            .cloned()
    }
}

impl From<Message> for EventInfo {
    fn from(message: Message) -> Self {
        use header_names::*;

        let (headers, payload, _) = message.into_parts();
        Self {
            event_type: Self::lookup(&headers, EVENT_TYPE, EVENT_TYPE_BARE),
            content_type: Self::lookup(&headers, CONTENT_TYPE, CONTENT_TYPE_BARE),
            message_type: Self::lookup(&headers, MESSAGE_TYPE, MESSAGE_TYPE_BARE),
            payload,
        }
    }
}

/// Extract the event, content and message type headers from a message.
///
/// The payload is cloned through unchanged.
pub fn extract_event_info(message: &Message) -> EventInfo {
    EventInfo::from(message.clone())
}
