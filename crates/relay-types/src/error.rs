use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not valid in the controller's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Model cannot be changed for an existing {agent} session")]
    ModelLocked { agent: String },

    #[error("A history page request is already in flight")]
    PaginationInFlight,
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}
