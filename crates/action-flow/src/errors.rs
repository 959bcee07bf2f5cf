//! Flow error types

use sockpuppet_core_types::ContentId;
use thiserror::Error;

/// Errors of the platform surface and the playback protocol
#[derive(Debug, Error)]
pub enum FlowError {
    /// Content item removed, restricted or impossible to open
    #[error("Content {id} unavailable: {reason}")]
    Unavailable { id: ContentId, reason: String },

    /// A page the surface depends on could not be loaded
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Invalid surface input (empty query, empty handle)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The browser session is gone; nothing further can run on it
    #[error("Session lost: {0}")]
    SessionLost(String),

    /// Action primitive error
    #[error("Action primitive error: {0}")]
    ActionError(String),
}

impl FlowError {
    pub fn unavailable(id: &ContentId, reason: impl Into<String>) -> Self {
        FlowError::Unavailable {
            id: id.clone(),
            reason: reason.into(),
        }
    }

    /// Item-level condition; the enclosing loop skips the item.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FlowError::Unavailable { .. })
    }
}

impl From<action_primitives::ActionError> for FlowError {
    fn from(err: action_primitives::ActionError) -> Self {
        match err {
            action_primitives::ActionError::NavTimeout(message)
            | action_primitives::ActionError::InvalidTarget(message) => {
                FlowError::Navigation(message)
            }
            action_primitives::ActionError::SessionLost(message) => FlowError::SessionLost(message),
            other => FlowError::ActionError(other.to_string()),
        }
    }
}
