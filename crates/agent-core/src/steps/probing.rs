use std::time::Duration;

use sockpuppet_core_types::{ids_of, ActionRecord, ContentItem};
use tracing::{info, warn};

use super::{fetch_homepage, watch};
use crate::context::AgentContext;
use crate::errors::AgentError;

/// Up-next entries read per hop of the recommendation chase.
pub const UP_NEXT_LIMIT: usize = 5;
/// Watch of the first search result, long enough to count as a view.
pub const SEARCH_WATCH: Duration = Duration::from_secs(10);

/// Follow the first up-next recommendation from the seed item.
///
/// Ends early when a hop returns no recommendation.
pub async fn test(ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
    let seed = ctx
        .args()
        .test_seed
        .as_deref()
        .map(str::trim)
        .filter(|seed| !seed.is_empty())
        .ok_or_else(|| AgentError::invalid_arguments("test step needs testSeed"))?;

    fetch_homepage(ctx).await?;
    ctx.record(ActionRecord::TestingStart);

    let iterations = ctx.args().test_iterations();
    let mut current = ContentItem::from_id(seed);
    for hop in 0..iterations {
        watch(ctx, &current, Duration::ZERO).await?;

        let recommendations = ctx.platform().up_next(UP_NEXT_LIMIT).await?;
        ctx.record(ActionRecord::GetRecommendations(ids_of(&recommendations)));
        match recommendations.into_iter().next() {
            Some(next) => current = next,
            None => {
                warn!(hop, "no recommendation returned, ending test early");
                break;
            }
        }
    }

    ctx.record(ActionRecord::TestingEnd);
    Ok(())
}

/// Search, log the bounded result list, watch the first result and log the
/// recommendations that follow.
pub async fn search(ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
    ctx.record(ActionRecord::SearchStart);

    let args = ctx.args();
    let query = args.search_query();
    let mut results = ctx
        .platform()
        .search(query, args.max_search_results)
        .await?;
    results.truncate(args.max_search_results);

    if let Some(first) = results.first().cloned() {
        info!(%query, count = results.len(), "search results");
        ctx.record(ActionRecord::SearchResults(ids_of(&results)));

        watch(ctx, &first, SEARCH_WATCH).await?;

        let mut recommendations = ctx.platform().up_next(args.max_recommendations).await?;
        recommendations.truncate(args.max_recommendations);
        if recommendations.is_empty() {
            info!("no recommendations after search");
        } else {
            ctx.record(ActionRecord::SearchRecommendations(ids_of(&recommendations)));
        }
    } else {
        warn!(%query, "no search results");
    }

    ctx.record(ActionRecord::SearchEnd);
    Ok(())
}

/// Watch each intervention id, re-reading the homepage after every one.
pub async fn intervention(ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
    fetch_homepage(ctx).await?;
    ctx.record(ActionRecord::InterventionStart);

    let duration = ctx.args().watch_duration();
    for id in ctx.args().intervention.iter().map(|id| id.trim()) {
        if id.is_empty() {
            continue;
        }
        watch(ctx, &ContentItem::from_id(id), duration).await?;
        fetch_homepage(ctx).await?;
    }

    ctx.record(ActionRecord::InterventionEnd);
    Ok(())
}
