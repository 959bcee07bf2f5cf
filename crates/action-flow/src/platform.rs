//! Platform seam used by the agent steps

use std::time::Duration;

use async_trait::async_trait;
use sockpuppet_core_types::ContentItem;

use crate::errors::FlowError;
use crate::playback::PlaybackReport;

/// Logical operations an agent performs against the content platform.
///
/// Listing operations return whatever could be extracted, possibly nothing;
/// only page loads that the operation depends on raise, and a lost browser
/// session, which no listing can survive.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Homepage recommendations.
    async fn homepage(&self) -> Result<Vec<ContentItem>, FlowError>;

    /// Recommendations shown next to the item currently playing.
    async fn up_next(&self, limit: usize) -> Result<Vec<ContentItem>, FlowError>;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ContentItem>, FlowError>;

    /// "Popular" listing of a channel, or its generic listing when the
    /// popular filter cannot be switched on.
    async fn channel_popular(&self, handle: &str) -> Result<Vec<ContentItem>, FlowError>;

    /// Play `item` for `duration`. Raises [`FlowError::Unavailable`] for the
    /// item, or [`FlowError::SessionLost`] when the browser went away.
    async fn watch(
        &self,
        item: &ContentItem,
        duration: Duration,
    ) -> Result<PlaybackReport, FlowError>;

    async fn close(&self);
}
