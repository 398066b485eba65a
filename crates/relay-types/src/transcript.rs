use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A sub-unit of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    #[serde(rename_all = "camelCase")]
    ToolUse {
        tool_id: String,
        tool_name: String,
        input: Value,
    },
    /// Output of a tool; linked to its `ToolUse` by `tool_id` only
    #[serde(rename_all = "camelCase")]
    ToolResult { tool_id: String, output: Value },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }

    /// An empty text part is a placeholder awaiting the next delta.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Part::Text { text } if text.is_empty())
    }

    pub fn tool_id(&self) -> Option<&str> {
        match self {
            Part::ToolUse { tool_id, .. } | Part::ToolResult { tool_id, .. } => Some(tool_id),
            Part::Text { .. } => None,
        }
    }
}

/// One completed exchange unit in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub id: String,
    pub role: Role,
    /// Concatenation of all text parts, in order
    pub text: String,
    pub parts: Vec<Part>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: flatten_text(&parts),
            parts,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn assistant(parts: Vec<Part>) -> Self {
        Self::new(Role::Assistant, parts)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Part::text(text)])
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Concatenate the text parts of a turn, skipping tool parts.
pub fn flatten_text(parts: &[Part]) -> String {
    parts.iter().filter_map(Part::as_text).collect()
}

/// A tool invocation joined with its result, if one has arrived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallView {
    pub tool_id: String,
    pub tool_name: String,
    pub input: Value,
    pub output: Option<Value>,
}

/// Parse a backend timestamp (RFC 3339 or epoch milliseconds).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}
