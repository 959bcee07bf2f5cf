use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use agent_core::{ArgumentRecord, FailureRecord, SessionStore};
use sockpuppet_core_types::{ChannelSource, CohortSpec, VideoSource};
use tracing::{error, info, warn};

use crate::error::SchedulerError;
use crate::gate::ConcurrencyGate;
use crate::launcher::AgentLauncher;
use crate::model::{BatchConfig, BatchReport, PreparedAgent, TrainingMode};
use crate::plan::TrainingPlan;

/// Builds one argument record per cohort and dispatches an agent for each.
pub struct Orchestrator {
    config: BatchConfig,
    channels: Option<Arc<dyn ChannelSource>>,
    videos: Option<Arc<dyn VideoSource>>,
}

impl Orchestrator {
    pub fn new(config: BatchConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            config,
            channels: None,
            videos: None,
        })
    }

    pub fn with_channels(mut self, source: Arc<dyn ChannelSource>) -> Self {
        self.channels = Some(source);
        self
    }

    pub fn with_videos(mut self, source: Arc<dyn VideoSource>) -> Self {
        self.videos = Some(source);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Sample training data and write every argument record, without dispatch.
    pub fn prepare(&self) -> Result<BatchReport, SchedulerError> {
        let seeds = match &self.videos {
            Some(videos) => videos.seeds()?,
            None => Vec::new(),
        };
        let mut plan = TrainingPlan::new(&self.config, seeds);
        let mut report = BatchReport::default();

        let args_dir = self.config.args_dir();
        fs::create_dir_all(&args_dir).map_err(|err| SchedulerError::io(&args_dir, err))?;

        for cohort in &self.config.cohorts {
            match self.record_for(&mut plan, cohort)? {
                Some(args) => {
                    let args_path = self.write_record(&args)?;
                    info!(
                        cohort = %cohort.label,
                        agent = %args.agent_id,
                        path = %args_path.display(),
                        "argument record written"
                    );
                    report.agents.push(PreparedAgent { args_path, args });
                }
                None => {
                    warn!(cohort = %cohort.label, "no training data for cohort, skipping");
                    report.skipped.push(cohort.label.clone());
                }
            }
        }
        Ok(report)
    }

    /// Dry run: write the records and report, dispatch nothing.
    pub fn simulate(&self) -> Result<BatchReport, SchedulerError> {
        let report = self.prepare()?;
        report.log_summary(&self.config);
        Ok(report)
    }

    /// Write the records, then launch each agent once the gate has a slot.
    ///
    /// Agents are not awaited. An agent that cannot be launched gets its
    /// failure record here, since it will never write one itself.
    pub async fn run(
        &self,
        gate: &ConcurrencyGate,
        launcher: &dyn AgentLauncher,
    ) -> Result<BatchReport, SchedulerError> {
        let mut report = self.prepare()?;
        let store = SessionStore::new(&self.config.output_dir);

        for agent in &report.agents {
            let active = gate.wait_for_slot().await;
            info!(
                agent = %agent.args.agent_id,
                active,
                ceiling = gate.ceiling(),
                "slot free, dispatching"
            );
            match launcher.launch(&agent.args_path, &agent.args).await {
                Ok(()) => report.dispatched.push(agent.args.agent_id.clone()),
                Err(err) => {
                    error!(agent = %agent.args.agent_id, "dispatch failed: {}", err);
                    let mut record = FailureRecord::new(agent.args.agent_id.clone(), &err);
                    record.module = "orchestrator".to_string();
                    store.write_failure(&record)?;
                    report.failed.push(agent.args.agent_id.clone());
                }
            }
        }

        report.log_summary(&self.config);
        Ok(report)
    }

    fn record_for(
        &self,
        plan: &mut TrainingPlan<'_>,
        cohort: &CohortSpec,
    ) -> Result<Option<ArgumentRecord>, SchedulerError> {
        match self.config.mode {
            TrainingMode::Channels => {
                let source = self.channels.as_ref().ok_or_else(|| {
                    SchedulerError::invalid_config("channel mode needs a channel source")
                })?;
                let pool = source.channels_for(cohort)?;
                Ok(plan.channel_record(cohort, &pool))
            }
            TrainingMode::Videos => {
                let source = self.videos.as_ref().ok_or_else(|| {
                    SchedulerError::invalid_config("video mode needs a video source")
                })?;
                let pool = source.videos_for(cohort)?;
                Ok(plan.video_record(cohort, &pool))
            }
        }
    }

    fn write_record(&self, args: &ArgumentRecord) -> Result<PathBuf, SchedulerError> {
        let path = self
            .config
            .args_dir()
            .join(format!("{}.json", args.agent_id.file_name()));
        let body = args.to_json()?;
        fs::write(&path, body).map_err(|err| SchedulerError::io(&path, err))?;
        Ok(path)
    }
}
