//! Agent state machine.
//!
//! Reads an argument record, runs its named steps against a [`Platform`]
//! and persists exactly one durable record per agent: the session log, or a
//! failure record when the agent cannot run.
//!
//! [`Platform`]: action_flow::Platform

pub mod args;
pub mod context;
pub mod errors;
pub mod metadata;
pub mod runner;
pub mod session;
pub mod step;
pub mod steps;
pub mod store;

pub use args::{ArgumentRecord, DEFAULT_SEARCH_QUERY, DEFAULT_TEST_ITERATIONS};
pub use context::AgentContext;
pub use errors::AgentError;
pub use metadata::YtDlpMetadata;
pub use runner::{AgentOutcome, AgentRunner};
pub use session::{AgentSession, FailureRecord, SessionLog};
pub use step::{Step, UnknownStep};
pub use steps::{run_step, WatchOutcome};
pub use store::SessionStore;
