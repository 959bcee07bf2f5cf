use std::sync::Arc;

use action_flow::Platform;
use sockpuppet_core_types::{ActionRecord, ChannelSource, ContentItem, MetadataProvider, NoMetadata};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::args::ArgumentRecord;
use crate::errors::AgentError;
use crate::session::AgentSession;

/// Everything a step may touch, passed explicitly into each step.
pub struct AgentContext<'a> {
    platform: &'a dyn Platform,
    args: &'a ArgumentRecord,
    session: AgentSession,
    metadata: Arc<dyn MetadataProvider>,
    channels: Option<Arc<dyn ChannelSource>>,
    lookups: JoinSet<()>,
}

impl<'a> AgentContext<'a> {
    pub fn new(platform: &'a dyn Platform, args: &'a ArgumentRecord, session: AgentSession) -> Self {
        Self {
            platform,
            args,
            session,
            metadata: Arc::new(NoMetadata),
            channels: None,
            lookups: JoinSet::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_channels(mut self, channels: Option<Arc<dyn ChannelSource>>) -> Self {
        self.channels = channels;
        self
    }

    pub fn platform(&self) -> &'a dyn Platform {
        self.platform
    }

    pub fn args(&self) -> &'a ArgumentRecord {
        self.args
    }

    pub fn session(&self) -> &AgentSession {
        &self.session
    }

    pub fn channels(&self) -> Result<&dyn ChannelSource, AgentError> {
        self.channels
            .as_deref()
            .ok_or_else(|| AgentError::invalid_arguments("no channel source configured (channelsFile)"))
    }

    /// Fetch an item's metadata in the background and log it when it lands.
    pub fn spawn_metadata_lookup(&mut self, item: &ContentItem) {
        let item = item.clone().detach();
        let provider = self.metadata.clone();
        self.lookups.spawn(async move {
            match item.metadata(provider.as_ref()).await {
                Some(metadata) => info!(
                    id = %item.id,
                    title = %metadata.title,
                    channel = ?metadata.channel_name,
                    "watched"
                ),
                None => debug!(id = %item.id, "no metadata"),
            }
        });
    }

    /// Number of metadata lookups still running.
    pub fn pending_lookups(&self) -> usize {
        self.lookups.len()
    }

    /// Wait for the outstanding metadata lookups. Each is bounded by the
    /// provider's own timeout.
    pub async fn finish_lookups(&mut self) {
        while self.lookups.join_next().await.is_some() {}
    }

    pub fn record(&mut self, action: ActionRecord) {
        self.session.record(action);
    }

    pub fn into_session(self) -> AgentSession {
        self.session
    }
}
