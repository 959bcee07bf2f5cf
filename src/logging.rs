//! Tracing setup
//!
//! Console output for every command; agent processes also write a JSON log
//! of their own under `<output>/logs/`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where an agent's JSON log goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentLogFile {
    pub dir: PathBuf,
    pub file_name: String,
}

impl AgentLogFile {
    pub fn new(dir: impl Into<PathBuf>, agent_file_name: &str) -> Self {
        Self {
            dir: dir.into(),
            file_name: format!("{agent_file_name}.log"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `level`; `debug`
/// forces DEBUG. Keep the returned guard alive until the process exits, or
/// buffered JSON lines are lost.
pub fn init_logging(
    level: &str,
    debug: bool,
    agent_log: Option<&AgentLogFile>,
) -> Result<Option<WorkerGuard>> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let (json_layer, guard) = match agent_log {
        Some(target) => {
            fs::create_dir_all(&target.dir).with_context(|| {
                format!("Failed to create log directory {}", target.dir.display())
            })?;
            let appender = tracing_appender::rolling::never(&target.dir, &target.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.to_string())),
        )
        .with(fmt::layer())
        .with(json_layer)
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_log_sits_next_to_stdout_log() {
        let target = AgentLogFile::new("/out/logs", "Left,abc,12345678");
        assert_eq!(target.path(), PathBuf::from("/out/logs/Left,abc,12345678.log"));
    }
}
