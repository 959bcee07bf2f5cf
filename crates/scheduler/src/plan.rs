//! Per-cohort sampling of training data and argument-record synthesis.

use agent_core::ArgumentRecord;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sockpuppet_core_types::{AgentId, ChannelRecord, CohortSpec};

use crate::model::BatchConfig;

/// Test seeds used when no seed pool is available.
pub const DEFAULT_SEEDS: [&str; 3] = ["9bZkp7q19f0", "ZZ5LpwO-An4", "K5le9sYdYkM"];

pub struct TrainingPlan<'a> {
    config: &'a BatchConfig,
    seeds: Vec<String>,
    rng: StdRng,
}

impl<'a> TrainingPlan<'a> {
    pub fn new(config: &'a BatchConfig, seeds: Vec<String>) -> Self {
        let seeds: Vec<String> = seeds
            .into_iter()
            .map(|seed| seed.trim().to_string())
            .filter(|seed| !seed.is_empty())
            .collect();
        let seeds = if seeds.is_empty() {
            DEFAULT_SEEDS.iter().map(|seed| seed.to_string()).collect()
        } else {
            seeds
        };
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, seeds, rng }
    }

    /// One seed from the shared pool, drawn independently per call.
    pub fn pick_seed(&mut self) -> String {
        self.seeds
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_SEEDS[0].to_string())
    }

    pub fn sample_channels(&mut self, pool: &[ChannelRecord]) -> Vec<ChannelRecord> {
        let n = self.config.channels_per_cohort.min(pool.len());
        pool.choose_multiple(&mut self.rng, n).cloned().collect()
    }

    /// `2 × training_videos` ids: the first half are primaries, the rest
    /// replace primaries that turn out to be unavailable.
    pub fn sample_videos(&mut self, pool: &[String]) -> Vec<String> {
        let n = (self.config.training_videos * 2).min(pool.len());
        pool.choose_multiple(&mut self.rng, n).cloned().collect()
    }

    /// Record for a channel-trained agent; `None` when the pool is empty.
    pub fn channel_record(
        &mut self,
        cohort: &CohortSpec,
        pool: &[ChannelRecord],
    ) -> Option<ArgumentRecord> {
        let channels = self.sample_channels(pool);
        if channels.is_empty() {
            return None;
        }
        let label = cohort.label.as_str();
        let seed = self.pick_seed();
        let config = self.config;

        let mut record = config.base_record(AgentId::compose(label, &seed));
        record.description = format!(
            "Sockpuppet {label} - analyzing \"{}\"",
            config.search_query
        );
        record.channels = channels
            .iter()
            .map(ChannelRecord::normalized_handle)
            .collect();
        record.channels_file = config.channels_file.clone();
        record.ideology_filter = Some(label.to_string());
        record.max_channels = Some(channels.len());
        record.videos_per_channel = config.videos_per_channel;
        record.training_n = Some(channels.len() * config.videos_per_channel);
        record.test_seed = Some(seed);
        Some(record)
    }

    /// Record for a video-trained agent; `None` when the pool is empty.
    pub fn video_record(&mut self, cohort: &CohortSpec, pool: &[String]) -> Option<ArgumentRecord> {
        let training = self.sample_videos(pool);
        if training.is_empty() {
            return None;
        }
        let label = cohort.label.as_str();
        let seed = self.pick_seed();
        let config = self.config;

        let mut record = config.base_record(AgentId::compose(label, &seed));
        record.description = format!("Sockpuppet {label} - testing from {seed}");
        record.training_n = Some(config.training_videos.min(training.len()));
        record.training = training;
        record.ideology_filter = Some(label.to_string());
        record.test_seed = Some(seed);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrainingMode;

    fn config(seed: u64) -> BatchConfig {
        BatchConfig {
            rng_seed: Some(seed),
            ..BatchConfig::default()
        }
    }

    fn videos(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("v{i}")).collect()
    }

    #[test]
    fn video_pool_holds_backups_after_primaries() {
        let config = BatchConfig {
            mode: TrainingMode::Videos,
            training_videos: 3,
            ..config(7)
        };
        let cohort = CohortSpec::new("Left", &[]);
        let record = TrainingPlan::new(&config, vec!["s1".into()])
            .video_record(&cohort, &videos(20))
            .unwrap();

        assert_eq!(record.training.len(), 6);
        assert_eq!(record.training_n, Some(3));
        assert_eq!(record.steps, "train,test");
        assert_eq!(record.test_seed.as_deref(), Some("s1"));
        assert!(record.agent_id.as_str().starts_with("Left,s1,"));
    }

    #[test]
    fn small_pools_are_used_whole() {
        let config = BatchConfig {
            training_videos: 5,
            ..config(1)
        };
        let cohort = CohortSpec::new("Right", &[]);
        let record = TrainingPlan::new(&config, Vec::new())
            .video_record(&cohort, &videos(4))
            .unwrap();
        assert_eq!(record.training.len(), 4);
        assert_eq!(record.training_n, Some(4));
        let seed = record.test_seed.unwrap();
        assert!(DEFAULT_SEEDS.contains(&seed.as_str()));
    }

    #[test]
    fn channel_record_carries_normalized_sample() {
        let config = BatchConfig {
            channels_per_cohort: 2,
            videos_per_channel: 4,
            ..config(3)
        };
        let pool = vec![
            ChannelRecord::new("a", "gauche"),
            ChannelRecord::new("@b", "gauche"),
            ChannelRecord::new("c", "gauche"),
        ];
        let cohort = CohortSpec::new("Left", &["gauche"]);
        let record = TrainingPlan::new(&config, vec!["s".into()])
            .channel_record(&cohort, &pool)
            .unwrap();

        assert_eq!(record.channels.len(), 2);
        assert!(record.channels.iter().all(|h| h.starts_with('@')));
        assert_eq!(record.training_n, Some(8));
        assert_eq!(record.steps, "train_channels,search");
        assert_eq!(record.description, "Sockpuppet Left - analyzing \"gilet jaune\"");
    }

    #[test]
    fn empty_pool_yields_no_record() {
        let config = config(0);
        let cohort = CohortSpec::new("Left", &[]);
        let mut plan = TrainingPlan::new(&config, Vec::new());
        assert!(plan.channel_record(&cohort, &[]).is_none());
        assert!(plan.video_record(&cohort, &[]).is_none());
    }

    #[test]
    fn fixed_seed_reproduces_the_sample() {
        let config = config(42);
        let a = TrainingPlan::new(&config, Vec::new()).sample_videos(&videos(50));
        let b = TrainingPlan::new(&config, Vec::new()).sample_videos(&videos(50));
        assert_eq!(a, b);
    }
}
