use serde::{Deserialize, Serialize};

/// The coding-agent backends a workspace can host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Claude,
    Codex,
    Gemini,
}

impl Default for AgentType {
    fn default() -> Self {
        AgentType::Claude
    }
}

impl AgentType {
    pub fn all() -> &'static [AgentType] {
        &[AgentType::Claude, AgentType::Codex, AgentType::Gemini]
    }

    pub fn label(&self) -> &str {
        match self {
            AgentType::Claude => "Claude",
            AgentType::Codex => "Codex",
            AgentType::Gemini => "Gemini",
        }
    }

    /// Wire name, as sent in `connect` and history requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Claude => "claude",
            AgentType::Codex => "codex",
            AgentType::Gemini => "gemini",
        }
    }

    pub fn default_model(&self) -> &str {
        match self {
            AgentType::Claude => "sonnet",
            AgentType::Codex => "gpt-5-codex",
            AgentType::Gemini => "gemini-2.5-pro",
        }
    }

    /// The backend pins the model to a session once it exists; the client
    /// must not switch models on a live session of this kind.
    pub fn locks_model_per_session(&self) -> bool {
        matches!(self, AgentType::Codex)
    }
}
