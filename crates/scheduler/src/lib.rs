//! Batch orchestration.
//!
//! One argument record per cohort, one agent process per record, and a
//! polled ceiling on how many agents run at once.

pub mod error;
pub mod gate;
pub mod launcher;
pub mod model;
pub mod orchestrator;
pub mod plan;

pub use error::SchedulerError;
pub use gate::{ConcurrencyGate, ProcessProbe, SysinfoProbe};
pub use launcher::{AgentLauncher, ProcessLauncher};
pub use model::{BatchConfig, BatchReport, PreparedAgent, TrainingMode};
pub use orchestrator::Orchestrator;
pub use plan::{TrainingPlan, DEFAULT_SEEDS};
