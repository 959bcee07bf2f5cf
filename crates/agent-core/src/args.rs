//! Per-agent argument record
//!
//! Written by the orchestrator, read once by the agent process at start.
//! Keys are camelCase; `puppetId` is accepted for `agentId`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sockpuppet_core_types::AgentId;

use crate::errors::AgentError;
use crate::step::Step;

pub const DEFAULT_SEARCH_QUERY: &str = "gilet jaune";
pub const DEFAULT_TEST_ITERATIONS: usize = 20;

fn default_videos_per_channel() -> usize {
    3
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentRecord {
    #[serde(alias = "puppetId")]
    pub agent_id: AgentId,
    /// Watch duration in seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub description: String,
    pub output_dir: PathBuf,
    /// Comma-separated step names, run in order
    pub steps: String,

    /// Training ids, primaries first then backups
    #[serde(default)]
    pub training: Vec<String>,
    #[serde(rename = "trainingN", default, skip_serializing_if = "Option::is_none")]
    pub training_n: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_iterations: Option<usize>,

    /// Channel handles sampled for this agent; empty means "read
    /// `channelsFile` and filter by `ideologyFilter`"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideology_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_channels: Option<usize>,
    #[serde(default = "default_videos_per_channel")]
    pub videos_per_channel: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default = "default_limit")]
    pub max_search_results: usize,
    #[serde(default = "default_limit")]
    pub max_recommendations: usize,

    #[serde(default)]
    pub intervention: Vec<String>,

    /// `channels` or `videos`; informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub collect_metadata: bool,
}

impl ArgumentRecord {
    pub fn new(agent_id: AgentId, output_dir: impl Into<PathBuf>, steps: &[Step]) -> Self {
        Self {
            agent_id,
            duration: 0.0,
            description: String::new(),
            output_dir: output_dir.into(),
            steps: Step::join(steps),
            training: Vec::new(),
            training_n: None,
            test_seed: None,
            test_iterations: None,
            channels: Vec::new(),
            channels_file: None,
            ideology_filter: None,
            max_channels: None,
            videos_per_channel: default_videos_per_channel(),
            search_query: None,
            max_search_results: default_limit(),
            max_recommendations: default_limit(),
            intervention: Vec::new(),
            mode: None,
            collect_metadata: false,
        }
    }

    /// Read a record; any failure is fatal to the agent.
    pub fn load(path: &Path) -> Result<Self, AgentError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| AgentError::fatal(format!("cannot read {}: {err}", path.display())))?;
        let record: Self = serde_json::from_str(&raw)
            .map_err(|err| AgentError::fatal(format!("cannot parse {}: {err}", path.display())))?;
        if record.agent_id.as_str().trim().is_empty() {
            return Err(AgentError::fatal("argument record has an empty agent id"));
        }
        Ok(record)
    }

    pub fn to_json(&self) -> Result<String, AgentError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| AgentError::persist(&self.output_dir, err))
    }

    pub fn step_sequence(&self) -> Vec<Step> {
        Step::parse_list(&self.steps)
    }

    pub fn watch_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration).unwrap_or(Duration::ZERO)
    }

    /// Non-empty training ids, in record order.
    pub fn training_ids(&self) -> Vec<&str> {
        self.training
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect()
    }

    pub fn search_query(&self) -> &str {
        self.search_query
            .as_deref()
            .filter(|query| !query.trim().is_empty())
            .unwrap_or(DEFAULT_SEARCH_QUERY)
    }

    pub fn test_iterations(&self) -> usize {
        self.test_iterations.unwrap_or(DEFAULT_TEST_ITERATIONS)
    }

    /// Browser profile directory owned by this agent.
    pub fn profile_dir(&self) -> PathBuf {
        self.output_dir
            .join("profiles")
            .join(self.agent_id.file_name())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.output_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_legacy_keys() {
        let record: ArgumentRecord = serde_json::from_value(json!({
            "puppetId": "Left,abc,1234abcd",
            "duration": 30,
            "description": "Left channels",
            "outputDir": "/tmp/out",
            "steps": "train_channels,test",
            "trainingN": 4,
            "testSeed": "abc",
            "channelsFile": "data/channels.csv",
            "ideologyFilter": "left",
            "maxChannels": 5,
        }))
        .unwrap();

        assert_eq!(record.agent_id.as_str(), "Left,abc,1234abcd");
        assert_eq!(record.training_n, Some(4));
        assert_eq!(record.watch_duration(), Duration::from_secs(30));
        assert_eq!(record.videos_per_channel, 3);
        assert_eq!(record.max_search_results, 10);
        assert_eq!(record.step_sequence(), vec![Step::TrainChannels, Step::Test]);
        assert_eq!(record.search_query(), DEFAULT_SEARCH_QUERY);
    }

    #[test]
    fn writes_camel_case_keys() {
        let mut record = ArgumentRecord::new(AgentId::new("a"), "/out", &[Step::Train]);
        record.training_n = Some(2);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["agentId"], "a");
        assert_eq!(value["trainingN"], 2);
        assert_eq!(value["outputDir"], "/out");
        assert!(value.get("testSeed").is_none());
    }

    #[test]
    fn negative_duration_is_zero() {
        let mut record = ArgumentRecord::new(AgentId::new("a"), "/out", &[]);
        record.duration = -3.0;
        assert_eq!(record.watch_duration(), Duration::ZERO);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = ArgumentRecord::load(Path::new("/nonexistent/args.json")).unwrap_err();
        assert!(err.is_fatal());
    }
}
