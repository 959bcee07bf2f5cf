//! Step functions
//!
//! Each step appends its actions to the session in execution order. Item
//! unavailability is handled inside the steps; any other error ends the step
//! and is handled by the dispatch loop.

mod probing;
mod training;

pub use probing::{intervention, search, test, SEARCH_WATCH, UP_NEXT_LIMIT};
pub use training::{train, train_from_channels};

use std::time::Duration;

use action_flow::FlowError;
use sockpuppet_core_types::{ids_of, ActionRecord, ContentItem};
use tracing::{info, warn};

use crate::context::AgentContext;
use crate::errors::AgentError;
use crate::step::Step;

/// Run one named step.
pub async fn run_step(ctx: &mut AgentContext<'_>, step: Step) -> Result<(), AgentError> {
    info!(agent = %ctx.session().agent_id(), %step, "step started");
    match step {
        Step::Homepage => fetch_homepage(ctx).await.map(|_| ()),
        Step::Train => train(ctx).await,
        Step::TrainChannels => train_from_channels(ctx).await,
        Step::Test => test(ctx).await,
        Step::Search => search(ctx).await,
        Step::Intervention => intervention(ctx).await,
    }
}

/// Fetch and log the homepage listing.
pub async fn fetch_homepage(ctx: &mut AgentContext<'_>) -> Result<Vec<ContentItem>, AgentError> {
    let items = ctx.platform().homepage().await?;
    ctx.record(ActionRecord::GetHomepage(ids_of(&items)));
    Ok(items)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Watched,
    Skipped,
}

/// Watch one item and log it; an unavailable item is logged as skipped.
pub async fn watch(
    ctx: &mut AgentContext<'_>,
    item: &ContentItem,
    duration: Duration,
) -> Result<WatchOutcome, AgentError> {
    match ctx.platform().watch(item, duration).await {
        Ok(report) => {
            if ctx.args().collect_metadata {
                ctx.spawn_metadata_lookup(item);
            }
            if !report.completed() {
                warn!(id = %item.id, aborted = ?report.aborted, "playback ended early");
            }
            ctx.record(ActionRecord::Watch(item.id.to_string()));
            Ok(WatchOutcome::Watched)
        }
        Err(FlowError::Unavailable { id, reason }) => {
            info!(%id, %reason, "item skipped");
            ctx.record(ActionRecord::WatchSkipped {
                id: id.to_string(),
                reason,
            });
            Ok(WatchOutcome::Skipped)
        }
        Err(err) => Err(err.into()),
    }
}
