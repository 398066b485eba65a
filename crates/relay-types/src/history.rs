use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentType;

/// Request for one page of older transcript history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub workspace: String,
    pub session_id: String,
    pub agent_type: AgentType,
    pub limit: usize,
    /// Number of records already consumed, counted from the newest
    pub offset: usize,
}

/// One page of raw history records, oldest first.
///
/// Records keep the shape of the live `user` / `assistant` / `tool_use` /
/// `tool_result` events and are decoded individually, so one malformed
/// record never fails the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub has_more: bool,
}
