use sockpuppet_core_types::{ActionRecord, ChannelRecord, CohortSpec, ContentItem};
use tracing::{info, warn};

use super::{fetch_homepage, watch, WatchOutcome};
use crate::context::AgentContext;
use crate::errors::AgentError;

/// Watch configured ids until `trainingN` have been watched.
///
/// Ids past the target are backups for unavailable ones and are never
/// watched once the target is reached.
pub async fn train(ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
    fetch_homepage(ctx).await?;
    ctx.record(ActionRecord::TrainingStart);

    let args = ctx.args();
    let ids = args.training_ids();
    let target = args.training_n.unwrap_or(ids.len());
    let duration = args.watch_duration();
    let mut watched = 0;

    for id in ids {
        if watched >= target {
            break;
        }
        let item = ContentItem::from_id(id);
        match watch(ctx, &item, duration).await {
            Ok(WatchOutcome::Watched) => watched += 1,
            Ok(WatchOutcome::Skipped) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(%id, "watch failed: {}", err),
        }
    }

    info!(watched, target, "training finished");
    ctx.record(ActionRecord::TrainingEnd);
    Ok(())
}

/// Watch popular items of the cohort's channels, under one global ceiling.
pub async fn train_from_channels(ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
    let args = ctx.args();
    let mut channels = if args.channels.is_empty() {
        let source = ctx.channels()?;
        match args.ideology_filter.as_deref() {
            Some(filter) if !filter.trim().is_empty() => {
                source.channels_for(&CohortSpec::resolve(filter))?
            }
            _ => source.channels()?,
        }
    } else {
        let label = args.ideology_filter.clone().unwrap_or_default();
        args.channels
            .iter()
            .map(|handle| ChannelRecord::new(handle.as_str(), label.as_str()))
            .collect()
    };
    if let Some(max) = args.max_channels {
        channels.truncate(max);
    }

    ctx.record(ActionRecord::ChannelTrainingStart);
    let per_channel = args.videos_per_channel;
    let target = args
        .training_n
        .unwrap_or(channels.len() * per_channel);
    let duration = args.watch_duration();
    info!(
        channels = channels.len(),
        filter = ?args.ideology_filter,
        target,
        "training from channels"
    );

    let mut watched = 0;
    for channel in &channels {
        if watched >= target {
            break;
        }
        let handle = channel.normalized_handle();
        let popular = match ctx.platform().channel_popular(&handle).await {
            Ok(items) => items,
            Err(err) => {
                let err = AgentError::from(err);
                if err.is_fatal() {
                    return Err(err);
                }
                warn!(%handle, "channel skipped: {}", err);
                continue;
            }
        };
        if popular.is_empty() {
            warn!(%handle, "no popular items found");
            continue;
        }

        let mut from_channel = 0;
        for item in popular.iter().take(per_channel) {
            if watched >= target || from_channel >= per_channel {
                break;
            }
            match watch(ctx, item, duration).await {
                Ok(WatchOutcome::Watched) => {
                    watched += 1;
                    from_channel += 1;
                }
                Ok(WatchOutcome::Skipped) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => warn!(id = %item.id, "watch failed: {}", err),
            }
        }
    }

    info!(watched, channels = channels.len(), "channel training finished");
    ctx.record(ActionRecord::ChannelTrainingEnd {
        channels_processed: channels.len(),
        videos_watched: watched,
    });
    Ok(())
}
