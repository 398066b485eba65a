//! Wire protocol spoken over the session WebSocket.
//!
//! One JSON object per frame, discriminated by its `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentType;

/// Commands sent from the client to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Open (or resume) a backend agent session
    #[serde(rename_all = "camelCase")]
    Connect {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        agent_type: Option<AgentType>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        session_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        project_path: Option<String>,
    },
    /// A user prompt
    Message { content: String },
    /// Ask the backend to stop the current agent turn
    Interrupt,
}

/// Events received from the backend.
///
/// `Unknown` absorbs event kinds added by newer backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected,

    #[serde(rename_all = "camelCase")]
    SessionStarted {
        session_id: String,
        #[serde(default)]
        agent_session_id: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },

    /// Joined a session the backend already runs; replay may follow
    #[serde(rename_all = "camelCase")]
    SessionJoined {
        session_id: String,
        #[serde(default)]
        agent_session_id: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },

    System {
        #[serde(default)]
        content: Value,
    },

    #[serde(rename_all = "camelCase")]
    User {
        content: String,
        #[serde(default)]
        message_id: Option<String>,
        #[serde(default)]
        timestamp: Option<Value>,
    },

    #[serde(rename_all = "camelCase")]
    ToolUse {
        tool_id: String,
        tool_name: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        message_id: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        message_id: Option<String>,
    },

    /// Assistant text delta
    #[serde(rename_all = "camelCase")]
    Assistant {
        #[serde(default)]
        content: String,
        #[serde(default)]
        message_id: Option<String>,
    },

    Done,

    Error {
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },

    #[serde(other)]
    Unknown,
}

/// Event kind tag, used in dedup keys and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connected,
    SessionStarted,
    SessionJoined,
    System,
    User,
    ToolUse,
    ToolResult,
    Assistant,
    Done,
    Error,
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::SessionStarted => "session_started",
            EventKind::SessionJoined => "session_joined",
            EventKind::System => "system",
            EventKind::User => "user",
            EventKind::ToolUse => "tool_use",
            EventKind::ToolResult => "tool_result",
            EventKind::Assistant => "assistant",
            EventKind::Done => "done",
            EventKind::Error => "error",
            EventKind::Unknown => "unknown",
        }
    }
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::Connected => EventKind::Connected,
            ServerEvent::SessionStarted { .. } => EventKind::SessionStarted,
            ServerEvent::SessionJoined { .. } => EventKind::SessionJoined,
            ServerEvent::System { .. } => EventKind::System,
            ServerEvent::User { .. } => EventKind::User,
            ServerEvent::ToolUse { .. } => EventKind::ToolUse,
            ServerEvent::ToolResult { .. } => EventKind::ToolResult,
            ServerEvent::Assistant { .. } => EventKind::Assistant,
            ServerEvent::Done => EventKind::Done,
            ServerEvent::Error { .. } => EventKind::Error,
            ServerEvent::Unknown => EventKind::Unknown,
        }
    }

    pub fn message_id(&self) -> Option<&str> {
        match self {
            ServerEvent::User { message_id, .. }
            | ServerEvent::ToolUse { message_id, .. }
            | ServerEvent::ToolResult { message_id, .. }
            | ServerEvent::Assistant { message_id, .. } => message_id.as_deref(),
            _ => None,
        }
    }

    /// Human-readable text of an `error` event, whichever field carried it.
    pub fn error_text(&self) -> Option<&str> {
        match self {
            ServerEvent::Error { content, message } => content
                .as_deref()
                .or(message.as_deref())
                .or(Some("Unknown error")),
            _ => None,
        }
    }
}

/// Render a JSON timestamp (string or epoch number) as text.
pub fn timestamp_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
