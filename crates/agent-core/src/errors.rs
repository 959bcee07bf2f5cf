use std::path::PathBuf;

use action_flow::FlowError;
use sockpuppet_core_types::SourceError;
use thiserror::Error;

/// Errors emitted by the agent-core crate.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent cannot run at all (argument record unreadable, browser
    /// session could not start or was lost).
    #[error("fatal agent error: {0}")]
    Fatal(String),

    /// A step is missing a parameter it needs.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Platform or playback failure inside a step.
    #[error(transparent)]
    Flow(FlowError),

    /// Training data could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Writing a durable record failed.
    #[error("failed to persist {path}: {message}")]
    Persist { path: PathBuf, message: String },
}

impl AgentError {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    pub fn persist(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Persist {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Fatal errors end the step sequence; everything else only ends a step.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AgentError::Fatal(_))
    }
}

impl From<FlowError> for AgentError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::SessionLost(message) => AgentError::Fatal(format!("session lost: {message}")),
            other => AgentError::Flow(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_sessions_are_fatal() {
        let err = AgentError::from(FlowError::SessionLost("browser exited".into()));
        assert!(err.is_fatal());
        assert!(!AgentError::from(FlowError::Navigation("timeout".into())).is_fatal());
    }
}
