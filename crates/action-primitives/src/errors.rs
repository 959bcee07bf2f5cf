//! Error types for interaction operations

use action_locator::StrategyFailure;
use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

/// Errors surfaced by the interaction engine.
///
/// Only a few operations can fail at all: navigation, and clicks whose every
/// fallback raised. Extraction, overlay handling and waits degrade to empty
/// results instead.
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Navigation timed out waiting for page load
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// Element is not clickable (hidden, disabled, or not interactable)
    #[error("Element not clickable: {0}")]
    NotClickable(String),

    /// Every fallback of an operation raised
    #[error("All {} strategies for {operation} failed", failures.len())]
    Exhausted {
        operation: String,
        failures: Vec<StrategyFailure>,
    },

    /// Element handle belongs to a page that has been replaced
    #[error("Stale handle: {0}")]
    StaleHandle(String),

    /// Target URL is unusable
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// CDP communication or protocol error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Browser session is gone
    #[error("Session lost: {0}")]
    SessionLost(String),
}

impl ActionError {
    pub fn is_session_lost(&self) -> bool {
        matches!(self, ActionError::SessionLost(_))
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActionError::NavTimeout(_) | ActionError::NotClickable(_) | ActionError::CdpIo(_)
        )
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::SessionLost(_) => 3,
            ActionError::NavTimeout(_) | ActionError::CdpIo(_) | ActionError::Exhausted { .. } => 2,
            ActionError::StaleHandle(_) | ActionError::NotClickable(_) => 1,
            ActionError::InvalidTarget(_) => 0,
        }
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        match err.kind {
            AdapterErrorKind::NavTimeout => ActionError::NavTimeout(message),
            AdapterErrorKind::StaleHandle => ActionError::StaleHandle(message),
            AdapterErrorKind::NotInteractable | AdapterErrorKind::TargetNotFound => {
                ActionError::NotClickable(message)
            }
            AdapterErrorKind::Launch
            | AdapterErrorKind::SessionLost
            | AdapterErrorKind::Internal => {
                ActionError::SessionLost(message)
            }
            AdapterErrorKind::CdpIo | AdapterErrorKind::Script => ActionError::CdpIo(message),
        }
    }
}
