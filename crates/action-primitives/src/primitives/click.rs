//! Click primitive - Click with direct, scripted and navigation fallbacks

use crate::{errors::ActionError, primitives::InteractionEngine, types::ClickTarget};
use action_locator::{ChainOutcome, FallbackChain, LocatorError, Strategy};
use async_trait::async_trait;
use cdp_adapter::{Cdp, ElementRef};
use std::time::Duration;
use tracing::{debug, info, warn};

const NAVIGATE: &str = "navigate";

/// One way of activating a click target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickStrategy {
    /// Native pointer click on the element
    Direct,
    /// `element.click()` from script, for obscured elements
    Scripted,
    /// Load the target URL directly
    Navigate { timeout: Duration },
}

#[async_trait]
impl Strategy<ClickTarget> for ClickStrategy {
    type Output = ();

    async fn attempt(
        &self,
        page: &dyn Cdp,
        target: &ClickTarget,
    ) -> Result<Option<()>, LocatorError> {
        match self {
            ClickStrategy::Direct => match target.element() {
                Some(element) => page.click(element).await.map(Some).map_err(Into::into),
                None => Ok(None),
            },
            ClickStrategy::Scripted => match target.element() {
                Some(element) => page.script_click(element).await.map(Some).map_err(Into::into),
                None => Ok(None),
            },
            ClickStrategy::Navigate { timeout } => {
                if target.url().is_empty() {
                    return Ok(None);
                }
                page.navigate(target.url(), *timeout)
                    .await
                    .map(Some)
                    .map_err(Into::into)
            }
        }
    }

    fn name(&self) -> String {
        match self {
            ClickStrategy::Direct => "direct-click".to_string(),
            ClickStrategy::Scripted => "scripted-click".to_string(),
            ClickStrategy::Navigate { .. } => NAVIGATE.to_string(),
        }
    }
}

/// Execute click with fallback
///
/// Tries direct click, scripted click, then navigation to the target URL.
/// Fails only when every attempted fallback raised. A successful click on an
/// element is assumed to leave the page, so issued handles are dropped. A
/// load through the URL fallback gets the same consent pass as `navigate`.
pub async fn execute_click_with_fallback(
    engine: &InteractionEngine,
    target: &ClickTarget,
) -> Result<(), ActionError> {
    let chain = FallbackChain::of([
        ClickStrategy::Direct,
        ClickStrategy::Scripted,
        ClickStrategy::Navigate {
            timeout: engine.timings().navigation_timeout(),
        },
    ]);

    match chain.run(engine.page(), target).await {
        ChainOutcome::Resolved { strategy, .. } => {
            if target.element().is_some() {
                engine.page().invalidate_handles();
            }
            if strategy == NAVIGATE {
                engine.dismiss_first_visit_overlay().await;
            }
            info!(url = %target.url(), via = %strategy, "click completed");
            Ok(())
        }
        ChainOutcome::Exhausted { failures } => {
            engine.ensure_session()?;
            warn!(url = %target.url(), attempts = failures.len(), "click fallbacks exhausted");
            Err(ActionError::Exhausted {
                operation: format!("click {}", target.url()),
                failures,
            })
        }
    }
}

/// Execute press
///
/// Clicks a control in place (skip button, dialog button, filter chip).
pub async fn execute_press(
    engine: &InteractionEngine,
    element: ElementRef,
) -> Result<(), ActionError> {
    let target = ClickTarget::Element {
        element,
        url: String::new(),
    };
    let chain = FallbackChain::of([ClickStrategy::Direct, ClickStrategy::Scripted]);

    match chain.run(engine.page(), &target).await {
        ChainOutcome::Resolved { strategy, .. } => {
            debug!(via = %strategy, "press completed");
            Ok(())
        }
        ChainOutcome::Exhausted { failures } => {
            engine.ensure_session()?;
            Err(ActionError::Exhausted {
                operation: "press".to_string(),
                failures,
            })
        }
    }
}
