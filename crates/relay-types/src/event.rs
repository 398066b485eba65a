use serde::{Deserialize, Serialize};

use crate::session::ConnectionState;
use crate::transcript::Turn;

/// Events emitted by a session controller.
/// The view drains these for reactive updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// The duplex connection moved to a new state
    ConnectionChanged { state: ConnectionState },

    /// The backend confirmed (or replaced) the logical session
    #[serde(rename_all = "camelCase")]
    SessionIdentified {
        session_id: String,
        agent_session_id: Option<String>,
    },

    /// A completed turn was appended to the transcript
    TurnCommitted { turn: Turn },

    /// The in-progress assistant turn changed; `text` is its flattened preview
    StreamUpdated { text: String },

    /// The agent started or stopped producing a response
    StreamingChanged { streaming: bool },

    /// Older history was spliced in before the transcript head
    #[serde(rename_all = "camelCase")]
    HistoryMerged { added: usize, has_more: bool },

    /// The selected model changed
    #[serde(rename_all = "camelCase")]
    ModelChanged { model: String, fresh_session: bool },
}
