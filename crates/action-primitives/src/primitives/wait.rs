//! Wait primitive - Bounded wait on alternative readiness conditions

use crate::{primitives::InteractionEngine, types::WaitCondition};
use cdp_adapter::QueryScope;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Execute wait-for-any-of
///
/// Polls the conditions in order until one holds or `timeout` elapses.
/// Returns the index of the condition that held; elapsing returns `None` and
/// is not an error. A zero timeout is a single pass.
pub async fn execute_wait_for_any_of(
    engine: &InteractionEngine,
    conditions: &[WaitCondition],
    timeout: Duration,
) -> Option<usize> {
    if conditions.is_empty() {
        return None;
    }

    let deadline = Instant::now() + timeout;
    loop {
        for (index, condition) in conditions.iter().enumerate() {
            if condition_holds(engine, condition).await {
                debug!(?condition, index, "wait condition met");
                return Some(index);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(?timeout, "wait elapsed without a condition");
            return None;
        }
        sleep(engine.timings().poll_interval().min(deadline - now)).await;
    }
}

async fn condition_holds(engine: &InteractionEngine, condition: &WaitCondition) -> bool {
    let page = engine.page();
    match condition {
        WaitCondition::Present(selector) => page
            .query(QueryScope::Document, selector)
            .await
            .map(|matches| !matches.is_empty())
            .unwrap_or(false),
        WaitCondition::Visible(selector) => engine.any_visible(&[selector.as_str()]).await,
        WaitCondition::UrlContains(fragment) => page
            .current_url()
            .await
            .map(|url| url.contains(fragment.as_str()))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{engine_on, HOME};
    use cdp_adapter::fake::{FakeNode, FakePage};

    #[tokio::test]
    async fn returns_first_condition_that_holds() {
        let page = FakePage::new().route(HOME, vec![FakeNode::new("video")]);
        let (engine, _page) = engine_on(page).await;
        let conditions = [
            WaitCondition::present("h1.title"),
            WaitCondition::present("video"),
            WaitCondition::UrlContains("site.test".into()),
        ];
        assert_eq!(
            engine
                .wait_for_any_of(&conditions, Duration::from_secs(5))
                .await,
            Some(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn elapsing_is_not_an_error() {
        let (engine, _page) = engine_on(FakePage::new()).await;
        let started = Instant::now();
        let result = engine
            .wait_for_any_of(&[WaitCondition::visible("video")], Duration::from_secs(10))
            .await;
        assert_eq!(result, None);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn zero_timeout_is_a_single_pass() {
        let (engine, page) = engine_on(FakePage::new()).await;
        engine
            .wait_for_any_of(&[WaitCondition::present("video")], Duration::ZERO)
            .await;
        assert_eq!(page.queries(), vec!["video".to_string()]);
    }
}
