//! Agent lifecycle
//!
//! open platform → run steps in order → close → persist exactly one record.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use action_flow::Platform;
use sockpuppet_core_types::{ChannelSource, MetadataProvider, NoMetadata};
use tracing::{error, info, warn};

use crate::args::ArgumentRecord;
use crate::context::AgentContext;
use crate::errors::AgentError;
use crate::session::{AgentSession, FailureRecord};
use crate::steps::run_step;
use crate::store::SessionStore;

/// Which record an agent left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    Completed(PathBuf),
    Failed(PathBuf),
}

impl AgentOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AgentOutcome::Completed(_))
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            AgentOutcome::Completed(path) | AgentOutcome::Failed(path) => path,
        }
    }
}

pub struct AgentRunner {
    store: SessionStore,
    metadata: Arc<dyn MetadataProvider>,
    channels: Option<Arc<dyn ChannelSource>>,
}

impl AgentRunner {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            metadata: Arc::new(NoMetadata),
            channels: None,
        }
    }

    /// Runner writing under the record's own output directory.
    pub fn for_args(args: &ArgumentRecord) -> Self {
        Self::new(SessionStore::new(&args.output_dir))
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_channels(mut self, channels: Arc<dyn ChannelSource>) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run one agent to completion.
    ///
    /// Step errors end only their step. A fatal error, from opening the
    /// platform or raised by a step, ends the run with a failure record.
    /// Errors only when not even the failure record could be written.
    pub async fn run<F, Fut>(&self, args: ArgumentRecord, open: F) -> Result<AgentOutcome, AgentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Box<dyn Platform>, AgentError>>,
    {
        let session = AgentSession::start(args.agent_id.clone());
        let steps = args.step_sequence();
        info!(agent = %args.agent_id, steps = %args.steps, "agent started");

        let platform = match open().await {
            Ok(platform) => platform,
            Err(err) => return self.fail(&args, err),
        };

        let mut ctx = AgentContext::new(platform.as_ref(), &args, session)
            .with_metadata(self.metadata.clone())
            .with_channels(self.channels.clone());

        let mut fatal = None;
        for step in steps {
            match run_step(&mut ctx, step).await {
                Ok(()) => info!(%step, "step finished"),
                Err(err) if err.is_fatal() => {
                    error!(%step, "fatal error: {}", err);
                    fatal = Some(err);
                    break;
                }
                Err(err) => warn!(%step, "step aborted: {}", err),
            }
        }
        if fatal.is_none() {
            ctx.finish_lookups().await;
        }
        let session = ctx.into_session();
        platform.close().await;

        if let Some(err) = fatal {
            return self.fail(&args, err);
        }

        let log = session.finish(&args);
        match self.store.write_log(&log) {
            Ok(path) => Ok(AgentOutcome::Completed(path)),
            Err(err) => self.fail(&args, err),
        }
    }

    fn fail(&self, args: &ArgumentRecord, err: AgentError) -> Result<AgentOutcome, AgentError> {
        error!(agent = %args.agent_id, "agent failed: {}", err);
        let record = FailureRecord::new(args.agent_id.clone(), &err);
        self.store.write_failure(&record).map(AgentOutcome::Failed)
    }
}
