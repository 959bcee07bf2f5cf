//! Fallback chain orchestration

use crate::{errors::LocatorError, strategies::Strategy, types::*};
use cdp_adapter::Cdp;
use tracing::{debug, warn};

/// Ordered strategies with first-success semantics.
///
/// Strategies run strictly in order. A miss or an error moves on to the next
/// one; the first value produced is returned and nothing after it runs. A
/// lost session ends the chain at once.
pub struct FallbackChain<In, O> {
    strategies: Vec<Box<dyn Strategy<In, Output = O>>>,
}

impl<In: Sync, O: Send> Default for FallbackChain<In, O> {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }
}

impl<In: Sync, O: Send> FallbackChain<In, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from strategies of one concrete type.
    pub fn of<S>(strategies: impl IntoIterator<Item = S>) -> Self
    where
        S: Strategy<In, Output = O> + 'static,
    {
        let mut chain = Self::new();
        for strategy in strategies {
            chain.push(strategy);
        }
        chain
    }

    pub fn with<S>(mut self, strategy: S) -> Self
    where
        S: Strategy<In, Output = O> + 'static,
    {
        self.push(strategy);
        self
    }

    pub fn push<S>(&mut self, strategy: S)
    where
        S: Strategy<In, Output = O> + 'static,
    {
        self.strategies.push(Box::new(strategy));
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain against the page.
    pub async fn run(&self, page: &dyn Cdp, input: &In) -> ChainOutcome<O> {
        let mut failures = Vec::new();

        for (index, strategy) in self.strategies.iter().enumerate() {
            let name = strategy.name();
            match strategy.attempt(page, input).await {
                Ok(Some(output)) => {
                    debug!(strategy = %name, index, "strategy resolved");
                    return ChainOutcome::Resolved {
                        index,
                        strategy: name,
                        output,
                    };
                }
                Ok(None) => {
                    debug!(strategy = %name, "strategy found nothing");
                }
                Err(err) => {
                    if err.severity() >= 2 {
                        warn!(strategy = %name, error = %err, "strategy failed");
                    } else {
                        debug!(strategy = %name, error = %err, "strategy failed");
                    }
                    let lost = matches!(err, LocatorError::SessionLost(_));
                    failures.push(StrategyFailure {
                        strategy: name,
                        reason: err.to_string(),
                    });
                    if lost {
                        break;
                    }
                }
            }
        }

        ChainOutcome::Exhausted { failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cdp_adapter::fake::FakePage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Reply {
        Hit(u32),
        Miss,
        Fail,
        Lost,
    }

    struct Scripted {
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    fn scripted(reply: Reply) -> (Scripted, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Scripted {
                reply,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[async_trait]
    impl Strategy<()> for Scripted {
        type Output = u32;

        async fn attempt(&self, _page: &dyn Cdp, _input: &()) -> Result<Option<u32>, LocatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Hit(value) => Ok(Some(value)),
                Reply::Miss => Ok(None),
                Reply::Fail => Err(LocatorError::CdpError("boom".into())),
                Reply::Lost => Err(LocatorError::SessionLost("browser exited".into())),
            }
        }

        fn name(&self) -> String {
            "scripted".into()
        }
    }

    #[tokio::test]
    async fn first_success_wins_and_later_strategies_never_run() {
        let page = FakePage::new();
        let (fail, fail_calls) = scripted(Reply::Fail);
        let (miss, miss_calls) = scripted(Reply::Miss);
        let (hit, hit_calls) = scripted(Reply::Hit(7));
        let (late, late_calls) = scripted(Reply::Hit(9));
        let chain = FallbackChain::of([fail, miss, hit, late]);

        let outcome = chain.run(&page, &()).await;
        assert_eq!(outcome.winner(), Some(2));
        assert_eq!(outcome.output(), Some(7));
        assert_eq!(fail_calls.load(Ordering::SeqCst), 1);
        assert_eq!(miss_calls.load(Ordering::SeqCst), 1);
        assert_eq!(hit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhaustion_collects_failures_without_raising() {
        let page = FakePage::new();
        let (fail, _) = scripted(Reply::Fail);
        let (miss, _) = scripted(Reply::Miss);
        let chain = FallbackChain::of([fail, miss]);

        match chain.run(&page, &()).await {
            ChainOutcome::Exhausted { failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].reason.contains("boom"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn lost_session_stops_the_chain() {
        let page = FakePage::new();
        let (lost, _) = scripted(Reply::Lost);
        let (hit, hit_calls) = scripted(Reply::Hit(1));
        let chain = FallbackChain::of([lost, hit]);

        match chain.run(&page, &()).await {
            ChainOutcome::Exhausted { failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].reason.contains("browser exited"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(hit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_chain_is_exhausted() {
        let page = FakePage::new();
        let chain: FallbackChain<(), u32> = FallbackChain::new();
        assert!(!chain.run(&page, &()).await.is_resolved());
    }
}
