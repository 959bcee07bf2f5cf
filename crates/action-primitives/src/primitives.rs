//! Interaction engine
//!
//! Capability operations over one page:
//! 1. navigate - load a URL and clear the first-visit consent dialog
//! 2. extract_entity_list - turn a listing into content items
//! 3. click_with_fallback - direct click, scripted click, then navigation
//! 4. find_first_visible_clickable - first qualifying control among selectors
//! 5. wait_for_any_of - bounded wait on alternative readiness conditions
//! 6. scroll - page-height scroll steps

mod click;
mod extract;
mod navigate;
mod overlay;
mod scroll;
mod wait;

pub use click::*;
pub use extract::*;
pub use navigate::*;
pub use overlay::*;
pub use scroll::*;
pub use wait::*;

use std::sync::Arc;
use std::time::Duration;

use action_locator::{LinkStrategy, SelectorStrategy};
use cdp_adapter::{Cdp, ElementRef};
use sockpuppet_core_types::ContentItem;
use tracing::warn;

use crate::{
    errors::ActionError,
    types::{ClickTarget, ConsentOverlay, NavTarget, WaitCondition},
    waiting::InteractionTimings,
};

/// Owns the page of one agent session.
///
/// Calls are sequential; the engine never runs two operations concurrently on
/// its page.
pub struct InteractionEngine {
    page: Arc<dyn Cdp>,
    timings: InteractionTimings,
    consent: ConsentOverlay,
}

impl InteractionEngine {
    pub fn new(page: Arc<dyn Cdp>, timings: InteractionTimings) -> Self {
        Self {
            page,
            timings,
            consent: ConsentOverlay::default(),
        }
    }

    pub fn with_consent(mut self, consent: ConsentOverlay) -> Self {
        self.consent = consent;
        self
    }

    pub fn page(&self) -> &dyn Cdp {
        self.page.as_ref()
    }

    pub fn timings(&self) -> &InteractionTimings {
        &self.timings
    }

    pub fn consent(&self) -> &ConsentOverlay {
        &self.consent
    }

    /// Generation of the page currently loaded.
    pub fn generation(&self) -> u64 {
        self.page.generation()
    }

    /// Fails once the browser behind the page has gone away.
    pub fn ensure_session(&self) -> Result<(), ActionError> {
        if self.page.is_connected() {
            Ok(())
        } else {
            Err(ActionError::SessionLost("browser connection closed".to_string()))
        }
    }

    /// Fixed pause; zero is a no-op.
    pub async fn pause_ms(&self, ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    pub async fn navigate(&self, target: impl Into<NavTarget>) -> Result<(), ActionError> {
        execute_navigate(self, &target.into()).await
    }

    /// Accept the consent dialog if one shows up. Absence is not an error.
    pub async fn dismiss_first_visit_overlay(&self) -> bool {
        execute_dismiss_consent(self).await
    }

    pub async fn extract_entity_list(
        &self,
        scopes: &[SelectorStrategy],
        links: &[LinkStrategy],
        limit: Option<usize>,
    ) -> Vec<ContentItem> {
        execute_extract(self, scopes, links, limit).await
    }

    pub async fn click_with_fallback(&self, target: &ClickTarget) -> Result<(), ActionError> {
        execute_click_with_fallback(self, target).await
    }

    /// Click a control that does not navigate: direct, then scripted.
    pub async fn press(&self, element: ElementRef) -> Result<(), ActionError> {
        execute_press(self, element).await
    }

    pub async fn find_first_visible_clickable<S: AsRef<str>>(
        &self,
        selectors: &[S],
        required_fragments: &[S],
    ) -> Option<ElementRef> {
        execute_find_first_visible_clickable(self, selectors, required_fragments).await
    }

    /// Whether any selector has a visible match.
    pub async fn any_visible<S: AsRef<str>>(&self, selectors: &[S]) -> bool {
        execute_any_visible(self, selectors).await
    }

    pub async fn wait_for_any_of(
        &self,
        conditions: &[WaitCondition],
        timeout: Duration,
    ) -> Option<usize> {
        execute_wait_for_any_of(self, conditions, timeout).await
    }

    pub async fn scroll(&self, steps: u32) {
        execute_scroll(self, steps).await
    }

    pub async fn current_url(&self) -> Option<String> {
        match self.page.current_url().await {
            Ok(url) => Some(url),
            Err(err) => {
                warn!("failed to read current url: {}", err);
                None
            }
        }
    }

    pub async fn close(&self) {
        if let Err(err) = self.page.close().await {
            warn!("failed to close page: {}", err);
        }
    }
}
