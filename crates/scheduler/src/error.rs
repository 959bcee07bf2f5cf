use std::path::PathBuf;

use agent_core::AgentError;
use sockpuppet_core_types::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("cannot count active agents: {0}")]
    Probe(String),
    #[error("failed to launch agent {agent}: {message}")]
    Launch { agent: String, message: String },
    #[error("io error at '{path}': {message}")]
    Io { path: PathBuf, message: String },
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("invalid batch config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl SchedulerError {
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe(message.into())
    }

    pub fn launch(agent: impl ToString, message: impl ToString) -> Self {
        Self::Launch {
            agent: agent.to_string(),
            message: message.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Probe failures never abort a batch; the gate treats them as "full".
    pub fn is_probe(&self) -> bool {
        matches!(self, Self::Probe(_))
    }
}
