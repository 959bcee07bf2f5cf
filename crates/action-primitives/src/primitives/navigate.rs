//! Navigate primitive - Load a destination and clear the consent dialog

use crate::{errors::ActionError, primitives::InteractionEngine, types::NavTarget};
use tracing::{debug, info};

/// Execute navigate primitive
///
/// Loads the destination within the navigation deadline, then runs one
/// consent-dialog pass. A missing dialog is success.
pub async fn execute_navigate(
    engine: &InteractionEngine,
    target: &NavTarget,
) -> Result<(), ActionError> {
    let url = target.url();
    if !is_navigable(&url) {
        return Err(ActionError::InvalidTarget(format!(
            "Invalid URL scheme: {}",
            url
        )));
    }

    debug!(url = %url, "navigating");
    engine
        .page()
        .navigate(&url, engine.timings().navigation_timeout())
        .await?;

    let dismissed = engine.dismiss_first_visit_overlay().await;
    info!(url = %url, consent_dismissed = dismissed, "navigate completed");
    Ok(())
}

fn is_navigable(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("about:")
}
