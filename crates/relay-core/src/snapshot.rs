//! Read-only projection of a session controller for the host renderer.

use relay_types::{
    session::{ConnectionState, Session},
    transcript::{Part, ToolCallView, Turn},
};
use serde::{Deserialize, Serialize};

use crate::pagination::PaginationCursor;

/// The assistant turn still being streamed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InProgressView {
    /// Parts so far, without empty placeholders
    pub parts: Vec<Part>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSnapshot {
    pub session: Session,
    pub connection: ConnectionState,
    pub streaming: bool,
    pub model: String,
    pub can_change_model: bool,
    pub can_send: bool,
    pub can_load_history: bool,
    pub turns: Vec<Turn>,
    pub in_progress: Option<InProgressView>,
    /// Every tool invocation in the transcript joined with its result
    pub tool_calls: Vec<ToolCallView>,
    pub history: PaginationCursor,
    pub loading_history: bool,
}

impl TranscriptSnapshot {
    pub fn to_json(&self) -> relay_types::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
