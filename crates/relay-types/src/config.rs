use serde::{Deserialize, Serialize};

use crate::agent::AgentType;
use crate::error::ClientError;
use crate::Result;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

/// Top-level client configuration, supplied by the host shell as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Base URL of the orchestration server, e.g. `https://box.local:3001`
    pub server_url: String,
    pub workspace: String,
    pub project_path: Option<String>,
    pub agent_type: AgentType,
    /// Model to request; `None` lets the backend choose
    pub model: Option<String>,
    /// Backend session to resume when the view opens
    pub resume_session_id: Option<String>,
    pub history_page_size: usize,
    pub system_events: SystemEventConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3001".to_string(),
            workspace: String::new(),
            project_path: None,
            agent_type: AgentType::default(),
            model: None,
            resume_session_id: None,
            history_page_size: DEFAULT_PAGE_SIZE,
            system_events: SystemEventConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "server URL must be http(s): {:?}",
                self.server_url
            )));
        }
        if self.workspace.trim().is_empty() {
            return Err(ClientError::Config("workspace is required".to_string()));
        }
        if self.history_page_size == 0 || self.history_page_size > MAX_PAGE_SIZE {
            return Err(ClientError::Config(format!(
                "history page size must be within 1..={}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    fn base(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    /// WebSocket endpoint for agent sessions
    pub fn ws_url(&self) -> String {
        let base = self.base();
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/ws/agent", ws_base)
    }

    /// History endpoint for one session
    pub fn history_url(&self, session_id: &str) -> String {
        format!("{}/api/sessions/{}/messages", self.base(), session_id)
    }

    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.agent_type.default_model())
    }
}

/// Policy for backend `system` events.
///
/// Which system messages count as status noise is heuristic, so the
/// patterns are configuration rather than code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemEventConfig {
    /// Object keys whose string value is a continuation (backend session) id
    pub continuation_keys: Vec<String>,
    /// Regex with one capture group extracting a continuation id from text
    pub continuation_pattern: Option<String>,
    /// Regexes matching human-readable status strings to hide
    pub status_patterns: Vec<String>,
    /// Show system text matching none of the above as a system turn
    pub show_unmatched: bool,
}

impl Default for SystemEventConfig {
    fn default() -> Self {
        Self {
            continuation_keys: vec![
                "sessionId".to_string(),
                "session_id".to_string(),
                "agentSessionId".to_string(),
            ],
            continuation_pattern: Some(r"(?i)^\s*session id:\s*(\S+)\s*$".to_string()),
            status_patterns: vec![
                r"(?i)^\s*session (started|resumed|joined|created)\b".to_string(),
                r"(?i)^\s*(starting|resuming|initializing|connecting)\b".to_string(),
                r"(?i)^\s*(connected|ready)\.?\s*$".to_string(),
                r"(?i)^\s*using model\b".to_string(),
            ],
            show_unmatched: true,
        }
    }
}
