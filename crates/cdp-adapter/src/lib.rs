//! Page driver for the audit agents.
//!
//! The [`Cdp`] trait is the narrow surface the interaction layer talks to: one
//! page, CSS queries, element probes and clicks. Element references are
//! generation-scoped ([`ElementRef`]); every navigation starts a new
//! generation and references from older generations are rejected with
//! [`AdapterErrorKind::StaleHandle`].

mod chromium;
pub mod config;
pub mod error;
#[cfg(feature = "fake")]
pub mod fake;

pub use chromium::ChromiumDriver;
pub use config::{detect_chrome_executable, CdpConfig};
pub use error::{AdapterError, AdapterErrorKind};
pub use sockpuppet_core_types::ElementRef;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a query starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryScope {
    Document,
    Within(ElementRef),
}

/// Snapshot of the properties the interaction layer qualifies elements by.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    pub visible: bool,
    pub enabled: bool,
    pub aria_label: Option<String>,
    pub title: Option<String>,
    pub text: String,
}

impl ElementState {
    /// Accessible label, title and text, for fragment matching.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.aria_label
            .as_deref()
            .into_iter()
            .chain(self.title.as_deref())
            .chain(std::iter::once(self.text.as_str()))
    }

    pub fn is_clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// One live page of an agent's browser.
#[async_trait]
pub trait Cdp: Send + Sync {
    /// Load `url` and wait for it within `deadline`. Starts a new generation.
    async fn navigate(&self, url: &str, deadline: Duration) -> Result<(), AdapterError>;

    async fn current_url(&self) -> Result<String, AdapterError>;

    /// Current page generation.
    fn generation(&self) -> u64;

    /// Forget every issued handle, e.g. after a click that navigated.
    fn invalidate_handles(&self);

    /// False once the browser behind the page has gone away.
    fn is_connected(&self) -> bool;

    /// Matches of a CSS selector, in document order.
    async fn query(
        &self,
        scope: QueryScope,
        selector: &str,
    ) -> Result<Vec<ElementRef>, AdapterError>;

    async fn attribute(
        &self,
        element: ElementRef,
        name: &str,
    ) -> Result<Option<String>, AdapterError>;

    async fn probe(&self, element: ElementRef) -> Result<ElementState, AdapterError>;

    /// Native pointer click.
    async fn click(&self, element: ElementRef) -> Result<(), AdapterError>;

    /// `HTMLElement.click()` dispatched from script.
    async fn script_click(&self, element: ElementRef) -> Result<(), AdapterError>;

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, AdapterError>;

    async fn close(&self) -> Result<(), AdapterError>;
}
