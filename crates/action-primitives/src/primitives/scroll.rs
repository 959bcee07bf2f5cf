//! Scroll primitive - Page-height scroll steps to load lazy listings

use crate::primitives::InteractionEngine;
use tracing::debug;

const SCROLL_STEP_JS: &str = "window.scrollBy(0, window.innerHeight); true";

/// Execute scroll primitive
///
/// Best effort: a failed step ends scrolling without an error.
pub async fn execute_scroll(engine: &InteractionEngine, steps: u32) {
    for step in 0..steps {
        if let Err(err) = engine.page().evaluate(SCROLL_STEP_JS).await {
            debug!(step, "scroll step failed: {}", err);
            return;
        }
        engine.pause_ms(engine.timings().scroll_settle_ms).await;
    }
}
