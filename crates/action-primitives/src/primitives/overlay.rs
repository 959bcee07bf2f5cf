//! Overlay helpers - qualifying controls, visibility probes, consent dialog

use crate::primitives::InteractionEngine;
use action_locator::{contains_any, FallbackChain, LocatorError, Strategy};
use async_trait::async_trait;
use cdp_adapter::{Cdp, ElementRef, QueryScope};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// First visible, enabled match of a selector, optionally required to carry
/// one of the fragments in its accessible label, title or text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleClickable {
    pub selector: String,
    /// Lowercased; empty means no label requirement
    pub fragments: Vec<String>,
}

impl VisibleClickable {
    pub fn new<S: AsRef<str>>(selector: impl Into<String>, fragments: &[S]) -> Self {
        Self {
            selector: selector.into(),
            fragments: fragments
                .iter()
                .map(|f| f.as_ref().trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl Strategy<QueryScope> for VisibleClickable {
    type Output = ElementRef;

    async fn attempt(
        &self,
        page: &dyn Cdp,
        scope: &QueryScope,
    ) -> Result<Option<ElementRef>, LocatorError> {
        for element in page.query(*scope, &self.selector).await? {
            let state = match page.probe(element).await {
                Ok(state) => state,
                Err(err) => {
                    debug!(selector = %self.selector, "probe failed: {}", err);
                    continue;
                }
            };
            if !state.is_clickable() {
                continue;
            }
            if self.fragments.is_empty()
                || state.labels().any(|label| contains_any(label, &self.fragments))
            {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    fn name(&self) -> String {
        format!("visible-clickable:{}", self.selector)
    }
}

/// Execute find-first-visible-clickable
///
/// Selectors are tried in order; the first qualifying element wins.
pub async fn execute_find_first_visible_clickable<S: AsRef<str>>(
    engine: &InteractionEngine,
    selectors: &[S],
    required_fragments: &[S],
) -> Option<ElementRef> {
    let chain = FallbackChain::of(
        selectors
            .iter()
            .map(|selector| VisibleClickable::new(selector.as_ref(), required_fragments)),
    );
    chain
        .run(engine.page(), &QueryScope::Document)
        .await
        .output()
}

/// Execute any-visible probe
pub async fn execute_any_visible<S: AsRef<str>>(engine: &InteractionEngine, selectors: &[S]) -> bool {
    for selector in selectors {
        let Ok(matches) = engine
            .page()
            .query(QueryScope::Document, selector.as_ref())
            .await
        else {
            continue;
        };
        for element in matches {
            if matches!(engine.page().probe(element).await, Ok(state) if state.visible) {
                return true;
            }
        }
    }
    false
}

/// Execute consent dismissal
///
/// Polls for an accept button within the consent timeout and clicks the
/// first one found.
pub async fn execute_dismiss_consent(engine: &InteractionEngine) -> bool {
    let consent = engine.consent();
    if consent.selectors.is_empty() || consent.texts.is_empty() {
        return false;
    }

    let timings = engine.timings();
    let deadline = Instant::now() + std::time::Duration::from_millis(timings.consent_timeout_ms);
    loop {
        if let Some(button) = engine
            .find_first_visible_clickable(&consent.selectors, &consent.texts)
            .await
        {
            return match engine.press(button).await {
                Ok(()) => {
                    info!("consent dialog accepted");
                    engine.pause_ms(timings.consent_settle_ms).await;
                    true
                }
                Err(err) => {
                    warn!("consent button did not accept the click: {}", err);
                    false
                }
            };
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(timings.poll_interval()).await;
    }
}
