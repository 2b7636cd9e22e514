//! Error types for the planner client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced to the board and its callers
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// No response was received
    #[error("Network error while trying to {action}")]
    Network {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    /// A success response whose body could not be read
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The addressed task is not on the board
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// A local board operation was rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// Create an Api error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a Network error
    pub fn network(action: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            action: action.into(),
            source,
        }
    }

    /// HTTP status, when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound(_)) || self.status() == Some(404)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<weekplan_core::Error> for ClientError {
    fn from(err: weekplan_core::Error) -> Self {
        match err {
            weekplan_core::Error::TaskNotFound(key) => Self::TaskNotFound(key),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}
