use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use agent_core::{ArgumentRecord, Step, DEFAULT_SEARCH_QUERY};
use serde::{Deserialize, Serialize};
use sockpuppet_core_types::{AgentId, CohortLabel, CohortSpec};
use tracing::info;

use crate::error::SchedulerError;

/// Which training data an agent is primed with.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingMode {
    #[default]
    Channels,
    Videos,
}

impl TrainingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TrainingMode::Channels => "channels",
            TrainingMode::Videos => "videos",
        }
    }

    /// Step sequence an agent of this mode runs.
    pub fn steps(self) -> &'static [Step] {
        match self {
            TrainingMode::Channels => &[Step::TrainChannels, Step::Search],
            TrainingMode::Videos => &[Step::Train, Step::Test],
        }
    }
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "channels" | "channel" => Ok(TrainingMode::Channels),
            "videos" | "video" => Ok(TrainingMode::Videos),
            other => Err(format!("unknown training mode '{other}'")),
        }
    }
}

/// Everything one batch run needs; every field has a default.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    pub cohorts: Vec<CohortSpec>,
    pub mode: TrainingMode,
    pub channels_file: Option<PathBuf>,
    /// Channels sampled per cohort in channel mode
    pub channels_per_cohort: usize,
    pub videos_per_channel: usize,
    /// Primary training videos per agent in video mode; twice as many are sampled
    pub training_videos: usize,
    pub watch_duration_secs: f64,
    pub search_query: String,
    pub max_search_results: usize,
    pub max_recommendations: usize,
    pub test_iterations: Option<usize>,
    /// Ids watched by an extra `intervention` step; empty disables it
    pub intervention: Vec<String>,
    pub collect_metadata: bool,
    pub max_concurrency: usize,
    pub poll_interval_ms: u64,
    /// Fixed sampling seed for reproducible batches
    pub rng_seed: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            cohorts: CohortSpec::defaults(),
            mode: TrainingMode::Channels,
            channels_file: None,
            channels_per_cohort: 5,
            videos_per_channel: 5,
            training_videos: 5,
            watch_duration_secs: 30.0,
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
            max_search_results: 10,
            max_recommendations: 10,
            test_iterations: None,
            intervention: Vec::new(),
            collect_metadata: false,
            max_concurrency: 4,
            poll_interval_ms: 60_000,
            rng_seed: None,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.cohorts.is_empty() {
            return Err(SchedulerError::invalid_config("no cohorts configured"));
        }
        if self.max_concurrency == 0 {
            return Err(SchedulerError::invalid_config(
                "max_concurrency must be at least 1",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(SchedulerError::invalid_config(
                "poll_interval_ms must be positive",
            ));
        }
        if !self.watch_duration_secs.is_finite() || self.watch_duration_secs < 0.0 {
            return Err(SchedulerError::invalid_config(
                "watch_duration_secs must be a non-negative number",
            ));
        }
        Ok(())
    }

    pub fn args_dir(&self) -> PathBuf {
        self.output_dir.join("args")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Shared fields of every record in this batch.
    pub(crate) fn base_record(&self, agent_id: AgentId) -> ArgumentRecord {
        let mut steps = self.mode.steps().to_vec();
        if !self.intervention.is_empty() {
            steps.push(Step::Intervention);
        }
        let mut record = ArgumentRecord::new(agent_id, self.output_dir.clone(), &steps);
        record.duration = self.watch_duration_secs;
        record.search_query = Some(self.search_query.clone());
        record.max_search_results = self.max_search_results;
        record.max_recommendations = self.max_recommendations;
        record.test_iterations = self.test_iterations;
        record.intervention = self.intervention.clone();
        record.collect_metadata = self.collect_metadata;
        record.mode = Some(self.mode.to_string());
        record
    }
}

/// An argument record written to disk, ready for dispatch.
#[derive(Clone, Debug)]
pub struct PreparedAgent {
    pub args_path: PathBuf,
    pub args: ArgumentRecord,
}

/// Outcome of preparing (and possibly dispatching) one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub agents: Vec<PreparedAgent>,
    pub skipped: Vec<CohortLabel>,
    pub dispatched: Vec<AgentId>,
    pub failed: Vec<AgentId>,
}

impl BatchReport {
    pub fn log_summary(&self, config: &BatchConfig) {
        let cohorts: Vec<&str> = config
            .cohorts
            .iter()
            .map(|cohort| cohort.label.as_str())
            .collect();
        let skipped: Vec<&str> = self.skipped.iter().map(CohortLabel::as_str).collect();
        info!(
            ?cohorts,
            mode = %config.mode,
            channels_per_cohort = config.channels_per_cohort,
            videos_per_channel = config.videos_per_channel,
            training_videos = config.training_videos,
            max_concurrency = config.max_concurrency,
            written = self.agents.len(),
            dispatched = self.dispatched.len(),
            failed = self.failed.len(),
            ?skipped,
            "batch summary"
        );
    }
}
