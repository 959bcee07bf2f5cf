//! Configuration management module
//!
//! One YAML file with a section per layer. Every section has defaults, so an
//! empty or missing file is a valid configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use action_flow::{SelectorCatalog, DEFAULT_SEARCH_SCROLL_STEPS};
use action_primitives::InteractionTimings;
use anyhow::{Context, Result};
use cdp_adapter::CdpConfig;
use serde::{Deserialize, Serialize};
use sockpuppet_scheduler::BatchConfig;
use tokio::fs;
use tracing::{info, warn};

pub const CHROME_ENV: &str = "SOCKPUPPET_CHROME";
pub const HEADLESS_ENV: &str = "SOCKPUPPET_HEADLESS";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: CdpConfig,
    pub timings: InteractionTimings,
    pub catalog: SelectorCatalog,
    pub surface: SurfaceConfig,
    pub batch: BatchConfig,
    pub data: DataConfig,
    pub metadata: MetadataConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Page-height scrolls before reading search results
    pub search_scroll_steps: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            search_scroll_steps: DEFAULT_SEARCH_SCROLL_STEPS,
        }
    }
}

/// Training-data tables read by the orchestrator and by agents.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub channels_file: PathBuf,
    pub videos_file: Option<PathBuf>,
    pub seeds_file: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            channels_file: PathBuf::from("data/chaines_clean.csv"),
            videos_file: None,
            seeds_file: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub binary: PathBuf,
    pub timeout_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            timeout_ms: 30_000,
        }
    }
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Default location: `<config dir>/sockpuppet/config.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("sockpuppet");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config = parse_config(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Config::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Write the effective configuration, so dispatched agents load exactly what
/// the batch ran with.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// `SOCKPUPPET_CHROME` and `SOCKPUPPET_HEADLESS` win over the file.
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(raw) = env::var(CHROME_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.browser.executable = PathBuf::from(trimmed);
        }
    }
    if let Ok(raw) = env::var(HEADLESS_ENV) {
        let lower = raw.trim().to_ascii_lowercase();
        config.browser.headless = !matches!(lower.as_str(), "0" | "false" | "no" | "off");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.batch.max_concurrency, 4);
        assert_eq!(config.surface.search_scroll_steps, 2);
        assert_eq!(config.data.channels_file, PathBuf::from("data/chaines_clean.csv"));
    }

    #[test]
    fn sections_override_independently() {
        let config = parse_config(
            r#"
batch:
  mode: videos
  max_concurrency: 2
  search_query: "retraites"
timings:
  ad_max_attempts: 4
catalog:
  popular_labels: ["Populaire", "Beliebt"]
"#,
        )
        .unwrap();
        assert_eq!(config.batch.max_concurrency, 2);
        assert_eq!(config.batch.search_query, "retraites");
        assert_eq!(config.batch.channels_per_cohort, 5);
        assert_eq!(config.timings.ad_max_attempts, 4);
        assert_eq!(config.catalog.popular_labels, ["Populaire", "Beliebt"]);
        assert!(!config.catalog.ad_indicators.is_empty());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(parse_config("batch:\n  mode: both\n").is_err());
    }

    #[test]
    #[serial]
    fn headless_env_wins_over_file() {
        let mut config = parse_config("browser:\n  headless: true\n").unwrap();
        env::set_var(HEADLESS_ENV, "off");
        apply_env_overrides(&mut config);
        env::remove_var(HEADLESS_ENV);
        assert!(!config.browser.headless);
    }

    #[test]
    #[serial]
    fn chrome_env_sets_executable() {
        let mut config = Config::default();
        env::set_var(CHROME_ENV, " /opt/chrome/chrome ");
        apply_env_overrides(&mut config);
        env::remove_var(CHROME_ENV);
        assert_eq!(config.browser.executable, PathBuf::from("/opt/chrome/chrome"));
    }

    #[tokio::test]
    async fn saved_config_is_what_agents_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch/config.yaml");
        let mut config = Config::default();
        config.catalog.popular_labels = vec!["Beliebt".to_string()];
        config.timings.ad_max_attempts = 3;
        config.metadata.timeout_ms = 5_000;

        save_config(&config, &path).unwrap();
        let loaded = load_config(Some(&path)).await.unwrap();

        assert_eq!(loaded.catalog.popular_labels, ["Beliebt"]);
        assert_eq!(loaded.timings.ad_max_attempts, 3);
        assert_eq!(loaded.metadata.timeout_ms, 5_000);
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.yaml")))
            .await
            .unwrap();
        assert_eq!(config.batch.search_query, "gilet jaune");
    }
}
