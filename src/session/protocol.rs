use crate::room::Frame;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const MISSING_JOIN_FIELDS: &str = "Missing roomId/userId";
pub const JOIN_FIRST: &str = "Join first";

/// Client → Server message types
///
/// Fields are kept loosely typed so that shape problems surface as
/// protocol errors (or silent drops) rather than parse failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "JOIN")]
    Join {
        #[serde(rename = "roomId", default)]
        room_id: Option<Value>,
        #[serde(rename = "userId", default)]
        user_id: Option<Value>,
    },
    /// Playback sync (play/pause/seek/...), forwarded opaquely
    #[serde(rename = "EVENT")]
    Event {
        #[serde(default)]
        event: Value,
    },
    #[serde(rename = "CHAT")]
    Chat {
        #[serde(default)]
        text: Option<Value>,
    },
    #[serde(rename = "PING")]
    Ping {},
}

impl ClientMessage {
    /// Parse a text frame. Anything that is not a known message is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Server → Client message types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "HELLO")]
    Hello { ts: i64 },
    #[serde(rename = "JOINED", rename_all = "camelCase")]
    Joined { room_id: String, user_id: String },
    #[serde(rename = "USER_JOINED", rename_all = "camelCase")]
    UserJoined { user_id: String },
    #[serde(rename = "USER_LEFT", rename_all = "camelCase")]
    UserLeft { user_id: String },
    #[serde(rename = "EVENT")]
    Event { from: String, event: Value },
    #[serde(rename = "CHAT")]
    Chat { from: String, text: String, ts: i64 },
    #[serde(rename = "PONG")]
    Pong { ts: i64 },
    #[serde(rename = "ERROR")]
    Error { message: String },
}

impl ServerMessage {
    pub fn hello() -> Self {
        Self::Hello { ts: now_millis() }
    }

    pub fn pong() -> Self {
        Self::Pong { ts: now_millis() }
    }

    pub fn chat(from: &str, text: String) -> Self {
        Self::Chat {
            from: from.to_string(),
            text,
            ts: now_millis(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }

    /// Serialize into a shareable text frame
    pub fn encode(&self) -> anyhow::Result<Frame> {
        let json = serde_json::to_string(self)?;
        Ok(Arc::from(json))
    }
}

/// Unix epoch milliseconds
fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Read a scalar field as text.
///
/// Strings pass through, non-zero numbers and `true` are stringified;
/// everything else (null, false, 0, arrays, objects) reads as empty.
pub fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// Trim and cap chat text at `max_chars` characters; `None` if nothing is left
pub fn normalize_chat(text: &str, max_chars: usize) -> Option<String> {
    let text: String = text.trim().chars().take(max_chars).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
