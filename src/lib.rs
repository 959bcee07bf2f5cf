//! Sockpuppet CLI library
//!
//! Exposes the configuration, logging and CSV source modules for integration
//! testing

pub mod config;
pub mod logging;
pub mod sources;

pub use config::{load_config, save_config, Config, DataConfig, MetadataConfig, SurfaceConfig};
pub use logging::{init_logging, AgentLogFile};
pub use sources::{CsvChannels, CsvVideos};
