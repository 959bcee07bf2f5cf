//! Shared value types for the audit agents.
//!
//! Everything here is plain data plus the narrow collaborator traits that the
//! upper layers call through (channel/video sources and the metadata service).

mod action;
mod cohort;
mod content;
mod metadata;
mod sources;

pub use action::*;
pub use cohort::*;
pub use content::*;
pub use metadata::*;
pub use sources::*;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque agent identifier, unique within one batch run.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Compose an id from a cohort label and a test seed, followed by a short
    /// random suffix: `label,seed,1a2b3c4d`.
    pub fn compose(label: &str, seed: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{label},{seed},{}", &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading cohort label when the id was produced by [`AgentId::compose`].
    pub fn cohort(&self) -> Option<&str> {
        self.0.split(',').next().filter(|label| !label.is_empty())
    }

    /// File-system safe form used for per-agent output and profile paths.
    pub fn file_name(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '\0' => '_',
                other => other,
            })
            .collect()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
