use serde::{Deserialize, Serialize};

use crate::agent::AgentType;

/// One conversation with one agent inside one workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Assigned once the backend confirms the session
    pub local_id: Option<String>,
    /// Set once the underlying agent process starts or resumes
    pub agent_session_id: Option<String>,
    pub workspace: String,
    pub agent_type: AgentType,
    /// Last lifecycle status reported by the backend
    pub status: Option<String>,
}

impl Session {
    pub fn new(workspace: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            local_id: None,
            agent_session_id: None,
            workspace: workspace.into(),
            agent_type,
            status: None,
        }
    }

    /// Resume an existing backend session.
    pub fn resume(
        workspace: impl Into<String>,
        agent_type: AgentType,
        agent_session_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_session_id: Some(agent_session_id.into()),
            ..Self::new(workspace, agent_type)
        }
    }

    /// Identifier the history endpoint knows this conversation by.
    pub fn history_id(&self) -> Option<&str> {
        self.agent_session_id
            .as_deref()
            .or(self.local_id.as_deref())
    }
}

/// Lifecycle of the duplex connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn accepts_input(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }

    pub fn label(&self) -> &str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Connected",
            ConnectionState::Closed => "Closed",
            ConnectionState::Errored => "Connection error",
        }
    }
}
