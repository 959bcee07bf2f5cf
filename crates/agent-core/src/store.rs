//! Durable per-agent records
//!
//! `<root>/agents/<id>.json` on completion, `<root>/failures/<id>.json` on a
//! fatal error. Files are written to a temporary sibling and renamed into
//! place, so a record is either complete or absent.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sockpuppet_core_types::AgentId;
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::AgentError;
use crate::session::{FailureRecord, SessionLog};

pub const AGENTS_DIR: &str = "agents";
pub const FAILURES_DIR: &str = "failures";

#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_path(&self, agent_id: &AgentId) -> PathBuf {
        self.root
            .join(AGENTS_DIR)
            .join(format!("{}.json", agent_id.file_name()))
    }

    pub fn failure_path(&self, agent_id: &AgentId) -> PathBuf {
        self.root
            .join(FAILURES_DIR)
            .join(format!("{}.json", agent_id.file_name()))
    }

    pub fn write_log(&self, log: &SessionLog) -> Result<PathBuf, AgentError> {
        let path = self.log_path(&log.agent_id);
        write_atomic(&path, log)?;
        info!(agent = %log.agent_id, path = %path.display(), actions = log.actions.len(), "session log written");
        Ok(path)
    }

    /// Write a failure record, first removing any log for the same agent so
    /// that exactly one record remains.
    pub fn write_failure(&self, record: &FailureRecord) -> Result<PathBuf, AgentError> {
        let log = self.log_path(&record.agent_id);
        if log.exists() {
            fs::remove_file(&log).map_err(|err| AgentError::persist(&log, err))?;
        }
        let path = self.failure_path(&record.agent_id);
        write_atomic(&path, record)?;
        info!(agent = %record.agent_id, path = %path.display(), "failure record written");
        Ok(path)
    }

    pub fn read_log(&self, agent_id: &AgentId) -> Result<SessionLog, AgentError> {
        let path = self.log_path(agent_id);
        let raw = fs::read_to_string(&path).map_err(|err| AgentError::persist(&path, err))?;
        serde_json::from_str(&raw).map_err(|err| AgentError::persist(&path, err))
    }
}

fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AgentError> {
    let dir = path
        .parent()
        .ok_or_else(|| AgentError::persist(path, "record path has no parent"))?;
    fs::create_dir_all(dir).map_err(|err| AgentError::persist(dir, err))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|err| AgentError::persist(dir, err))?;
    serde_json::to_writer_pretty(&mut file, value).map_err(|err| AgentError::persist(path, err))?;
    file.write_all(b"\n")
        .and_then(|_| file.as_file().sync_all())
        .map_err(|err| AgentError::persist(path, err))?;
    file.persist(path)
        .map_err(|err| AgentError::persist(path, err.error))?;
    Ok(())
}
