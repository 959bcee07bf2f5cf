use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cohort::CohortSpec;

/// Errors raised by training-data collaborators.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source '{path}' could not be read: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("source '{path}' is missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("malformed row {row} in '{path}': {message}")]
    Malformed {
        path: PathBuf,
        row: usize,
        message: String,
    },
}

impl SourceError {
    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// One row of a channel table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub handle: String,
    pub label: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ChannelRecord {
    pub fn new(handle: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            label: label.into(),
            name: None,
        }
    }

    /// Handle with the leading `@` the platform expects.
    pub fn normalized_handle(&self) -> String {
        normalize_handle(&self.handle)
    }
}

/// Prefix `@` when absent and trim whitespace.
pub fn normalize_handle(handle: &str) -> String {
    let trimmed = handle.trim();
    if trimmed.starts_with('@') {
        trimmed.to_string()
    } else {
        format!("@{trimmed}")
    }
}

/// Read access to (handle, label) pairs.
pub trait ChannelSource: Send + Sync {
    fn channels(&self) -> Result<Vec<ChannelRecord>, SourceError>;

    /// Rows whose label belongs to the given cohort, in table order.
    fn channels_for(&self, cohort: &CohortSpec) -> Result<Vec<ChannelRecord>, SourceError> {
        Ok(self
            .channels()?
            .into_iter()
            .filter(|record| cohort.matches(&record.label))
            .collect())
    }
}

/// Per-cohort video id pools plus the shared test-seed pool.
pub trait VideoSource: Send + Sync {
    fn videos_for(&self, cohort: &CohortSpec) -> Result<Vec<String>, SourceError>;

    fn seeds(&self) -> Result<Vec<String>, SourceError>;
}

/// In-memory source, handy for embedding and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticChannels(pub Vec<ChannelRecord>);

impl ChannelSource for StaticChannels {
    fn channels(&self) -> Result<Vec<ChannelRecord>, SourceError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_gain_at_prefix_once() {
        assert_eq!(normalize_handle("chan"), "@chan");
        assert_eq!(normalize_handle(" @chan "), "@chan");
    }

    #[test]
    fn channels_filter_by_cohort_aliases() {
        let source = StaticChannels(vec![
            ChannelRecord::new("a", "gauche"),
            ChannelRecord::new("b", "droite"),
            ChannelRecord::new("c", "Gauche"),
        ]);
        let left = CohortSpec::new("Left", &["gauche"]);
        let handles: Vec<_> = source
            .channels_for(&left)
            .unwrap()
            .into_iter()
            .map(|r| r.handle)
            .collect();
        assert_eq!(handles, ["a", "c"]);
    }
}
