//! Element location strategies
//!
//! Selector strategies locate groups of elements (listing scopes, buttons);
//! link strategies resolve a content link inside one container. Both report a
//! miss as `Ok(None)` and reserve `Err` for driver failures, which the chain
//! swallows.

use crate::{errors::LocatorError, types::*};
use async_trait::async_trait;
use cdp_adapter::{Cdp, ElementRef, QueryScope};
use sockpuppet_core_types::ContentId;
use tracing::debug;

/// One concrete, possibly failing way to produce a value from the page.
#[async_trait]
pub trait Strategy<In: Sync>: Send + Sync {
    type Output: Send;

    /// Attempt the strategy; `Ok(None)` is a clean miss.
    async fn attempt(
        &self,
        page: &dyn Cdp,
        input: &In,
    ) -> Result<Option<Self::Output>, LocatorError>;

    /// Name used in logs
    fn name(&self) -> String;
}

/// CSS-based element group location.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorStrategy {
    /// Every match of the selector
    Css(String),
    /// Matches whose visible text contains one of the fragments
    CssText {
        selector: String,
        fragments: Vec<String>,
    },
    /// Matches whose aria-label or title contains one of the fragments
    CssLabel {
        selector: String,
        fragments: Vec<String>,
    },
}

impl SelectorStrategy {
    pub fn css(selector: impl Into<String>) -> Self {
        SelectorStrategy::Css(selector.into())
    }

    pub fn with_text<S: AsRef<str>>(selector: impl Into<String>, fragments: &[S]) -> Self {
        SelectorStrategy::CssText {
            selector: selector.into(),
            fragments: lowercase_all(fragments),
        }
    }

    pub fn with_label<S: AsRef<str>>(selector: impl Into<String>, fragments: &[S]) -> Self {
        SelectorStrategy::CssLabel {
            selector: selector.into(),
            fragments: lowercase_all(fragments),
        }
    }

    /// One plain CSS strategy per selector, in order.
    pub fn css_list<S: AsRef<str>>(selectors: &[S]) -> Vec<SelectorStrategy> {
        selectors
            .iter()
            .map(|s| SelectorStrategy::css(s.as_ref()))
            .collect()
    }

    pub fn selector(&self) -> &str {
        match self {
            SelectorStrategy::Css(selector)
            | SelectorStrategy::CssText { selector, .. }
            | SelectorStrategy::CssLabel { selector, .. } => selector,
        }
    }

    async fn keeps(&self, page: &dyn Cdp, element: ElementRef) -> Result<bool, LocatorError> {
        match self {
            SelectorStrategy::Css(_) => Ok(true),
            SelectorStrategy::CssText { fragments, .. } => {
                let state = page.probe(element).await?;
                Ok(contains_any(&state.text, fragments))
            }
            SelectorStrategy::CssLabel { fragments, .. } => {
                let state = page.probe(element).await?;
                let label = state.aria_label.as_deref().unwrap_or_default();
                let title = state.title.as_deref().unwrap_or_default();
                Ok(contains_any(label, fragments) || contains_any(title, fragments))
            }
        }
    }
}

#[async_trait]
impl Strategy<QueryScope> for SelectorStrategy {
    type Output = Vec<ElementRef>;

    async fn attempt(
        &self,
        page: &dyn Cdp,
        scope: &QueryScope,
    ) -> Result<Option<Vec<ElementRef>>, LocatorError> {
        let selector = self.selector();
        if selector.trim().is_empty() {
            return Err(LocatorError::InvalidSelector("empty selector".to_string()));
        }

        let mut kept = Vec::new();
        for element in page.query(*scope, selector).await? {
            if self.keeps(page, element).await? {
                kept.push(element);
            }
        }
        debug!(selector, matches = kept.len(), "selector strategy");
        Ok((!kept.is_empty()).then_some(kept))
    }

    fn name(&self) -> String {
        match self {
            SelectorStrategy::Css(selector) => format!("css:{selector}"),
            SelectorStrategy::CssText { selector, .. } => format!("css-text:{selector}"),
            SelectorStrategy::CssLabel { selector, .. } => format!("css-label:{selector}"),
        }
    }
}

/// First link inside a container whose `href` carries a content id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStrategy {
    pub selector: String,
}

impl LinkStrategy {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    pub fn list<S: AsRef<str>>(selectors: &[S]) -> Vec<LinkStrategy> {
        selectors
            .iter()
            .map(|s| LinkStrategy::new(s.as_ref()))
            .collect()
    }
}

#[async_trait]
impl Strategy<ElementRef> for LinkStrategy {
    type Output = ResolvedLink;

    async fn attempt(
        &self,
        page: &dyn Cdp,
        container: &ElementRef,
    ) -> Result<Option<ResolvedLink>, LocatorError> {
        for link in page
            .query(QueryScope::Within(*container), &self.selector)
            .await?
        {
            let Some(href) = page.attribute(link, "href").await? else {
                continue;
            };
            if let Some(id) = ContentId::from_url(&href) {
                let url = id.watch_url();
                return Ok(Some(ResolvedLink {
                    id,
                    url,
                    element: link,
                }));
            }
        }
        Ok(None)
    }

    fn name(&self) -> String {
        format!("link:{}", self.selector)
    }
}

fn lowercase_all<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    fragments
        .iter()
        .map(|f| f.as_ref().trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

/// Case-insensitive substring match against already lowercased fragments.
pub fn contains_any(haystack: &str, fragments: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    fragments.iter().any(|fragment| haystack.contains(fragment.as_str()))
}
