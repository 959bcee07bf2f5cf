//! Agent session and its durable records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sockpuppet_core_types::{ActionRecord, AgentId};
use tracing::info;

use crate::args::ArgumentRecord;

/// In-memory state of one agent process. Mutated only by the steps of that
/// process; the action log is append-only.
#[derive(Debug, Clone)]
pub struct AgentSession {
    agent_id: AgentId,
    start_time: DateTime<Utc>,
    actions: Vec<ActionRecord>,
}

impl AgentSession {
    pub fn start(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            start_time: Utc::now(),
            actions: Vec::new(),
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn record(&mut self, action: ActionRecord) {
        info!(agent = %self.agent_id, action = action.kind(), "action recorded");
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    pub fn watch_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_watch()).count()
    }

    /// Close the session into its log record.
    pub fn finish(self, args: &ArgumentRecord) -> SessionLog {
        SessionLog {
            agent_id: self.agent_id,
            start_time: self.start_time,
            end_time: Utc::now(),
            duration: args.duration,
            description: args.description.clone(),
            steps: args.steps.clone(),
            actions: self.actions,
            args: args.clone(),
        }
    }
}

/// Normal-completion record, written under `agents/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub agent_id: AgentId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: f64,
    pub description: String,
    pub steps: String,
    pub actions: Vec<ActionRecord>,
    pub args: ArgumentRecord,
}

/// Unrecoverable-error record, written under `failures/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub agent_id: AgentId,
    pub time: DateTime<Utc>,
    pub exception: String,
    pub module: String,
}

impl FailureRecord {
    pub fn new(agent_id: AgentId, exception: impl ToString) -> Self {
        Self {
            agent_id,
            time: Utc::now(),
            exception: exception.to_string(),
            module: "sockpuppet-agent".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_log_keeps_actions_in_order() {
        let args = ArgumentRecord::new(AgentId::new("a"), "/out", &[]);
        let mut session = AgentSession::start(AgentId::new("a"));
        session.record(ActionRecord::TrainingStart);
        session.record(ActionRecord::Watch("x".into()));
        session.record(ActionRecord::TrainingEnd);
        assert_eq!(session.watch_count(), 1);

        let log = session.finish(&args);
        assert!(log.end_time >= log.start_time);
        assert_eq!(
            log.actions.iter().map(ActionRecord::kind).collect::<Vec<_>>(),
            ["training_start", "watch", "training_end"]
        );
    }
}
