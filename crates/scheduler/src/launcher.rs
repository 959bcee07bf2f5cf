use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use agent_core::ArgumentRecord;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::error::SchedulerError;

/// Starts one agent for a written argument record without waiting for it.
#[async_trait]
pub trait AgentLauncher: Send + Sync {
    async fn launch(&self, args_path: &Path, args: &ArgumentRecord) -> Result<(), SchedulerError>;
}

/// Spawns `<program> <global args…> <leading args…> --args <record>` as a
/// detached child.
///
/// Child stdout and stderr go to `<output>/logs/<agent-id>.stdout.log`.
#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    program: PathBuf,
    global_args: Vec<OsString>,
    leading_args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            global_args: Vec::new(),
            leading_args,
        }
    }

    /// Flags placed before the subcommand (`--config`, `--log-level`, ...).
    pub fn with_global_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.global_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments passed to the program for one record.
    pub fn command_args(&self, args_path: &Path) -> Vec<OsString> {
        let mut argv = self.global_args.clone();
        argv.extend(self.leading_args.iter().map(OsString::from));
        argv.push(OsString::from("--args"));
        argv.push(args_path.as_os_str().to_os_string());
        argv
    }

    /// Re-invoke the running binary's `agent` subcommand.
    pub fn current_exe() -> Result<Self, SchedulerError> {
        let program = std::env::current_exe()
            .map_err(|err| SchedulerError::io("current executable", err))?;
        Ok(Self::new(program, vec!["agent".to_string()]))
    }

    fn output_file(args: &ArgumentRecord) -> Result<(File, File), SchedulerError> {
        let dir = args.log_dir();
        fs::create_dir_all(&dir).map_err(|err| SchedulerError::io(&dir, err))?;
        let path = dir.join(format!("{}.stdout.log", args.agent_id.file_name()));
        let stdout = File::create(&path).map_err(|err| SchedulerError::io(&path, err))?;
        let stderr = stdout
            .try_clone()
            .map_err(|err| SchedulerError::io(&path, err))?;
        Ok((stdout, stderr))
    }
}

#[async_trait]
impl AgentLauncher for ProcessLauncher {
    async fn launch(&self, args_path: &Path, args: &ArgumentRecord) -> Result<(), SchedulerError> {
        let (stdout, stderr) = Self::output_file(args)?;
        let child = Command::new(&self.program)
            .args(self.command_args(args_path))
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|err| SchedulerError::launch(&args.agent_id, err))?;

        info!(
            agent = %args.agent_id,
            pid = child.id(),
            args = %args_path.display(),
            "agent dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sockpuppet_core_types::AgentId;

    #[test]
    fn batch_flags_precede_the_agent_subcommand() {
        let launcher = ProcessLauncher::new("/usr/bin/sockpuppet", vec!["agent".to_string()])
            .with_global_args(["--config", "/data/out/config.yaml", "--log-level", "debug"])
            .with_global_args(["--debug"]);

        let argv = launcher.command_args(Path::new("/data/out/args/Left,s,1.json"));

        assert_eq!(
            argv,
            [
                "--config",
                "/data/out/config.yaml",
                "--log-level",
                "debug",
                "--debug",
                "agent",
                "--args",
                "/data/out/args/Left,s,1.json",
            ]
            .map(OsString::from)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawned_agent_receives_batch_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = ArgumentRecord::new(AgentId::new("Left,s,1"), dir.path(), &[]);
        let launcher = ProcessLauncher::new("echo", vec!["agent".to_string()])
            .with_global_args(["--config", "/batch/config.yaml"]);

        launcher
            .launch(Path::new("/batch/args/Left,s,1.json"), &args)
            .await
            .unwrap();

        let log = dir.path().join("logs/Left,s,1.stdout.log");
        let mut echoed = String::new();
        for _ in 0..50 {
            echoed = std::fs::read_to_string(&log).unwrap();
            if !echoed.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(
            echoed.trim_end(),
            "--config /batch/config.yaml agent --args /batch/args/Left,s,1.json"
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ArgumentRecord::new(AgentId::new("Left,s,1"), dir.path(), &[]);
        let launcher = ProcessLauncher::new(dir.path().join("no-such-binary"), Vec::new());

        let err = launcher
            .launch(&dir.path().join("args.json"), &args)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Launch { .. }));
        assert!(dir.path().join("logs/Left,s,1.stdout.log").exists());
    }
}
