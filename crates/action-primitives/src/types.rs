//! Operation inputs for the interaction engine

use cdp_adapter::ElementRef;
use serde::{Deserialize, Serialize};
use sockpuppet_core_types::{ContentId, ContentItem, PLATFORM_ROOT};

/// Destination of a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    Url(String),
    /// Synthesized into the canonical watch URL
    Content(ContentId),
}

impl NavTarget {
    pub fn url(&self) -> String {
        match self {
            NavTarget::Url(url) => url.clone(),
            NavTarget::Content(id) => id.watch_url(),
        }
    }

    pub fn root() -> Self {
        NavTarget::Url(PLATFORM_ROOT.to_string())
    }
}

impl From<&str> for NavTarget {
    fn from(url: &str) -> Self {
        NavTarget::Url(url.to_string())
    }
}

impl From<String> for NavTarget {
    fn from(url: String) -> Self {
        NavTarget::Url(url)
    }
}

impl From<ContentId> for NavTarget {
    fn from(id: ContentId) -> Self {
        NavTarget::Content(id)
    }
}

/// What `click_with_fallback` acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// A live element plus the URL it leads to
    Element { element: ElementRef, url: String },
    /// Only a URL; the click degrades to navigation
    Url(String),
}

impl ClickTarget {
    pub fn url(&self) -> &str {
        match self {
            ClickTarget::Element { url, .. } | ClickTarget::Url(url) => url,
        }
    }

    pub fn element(&self) -> Option<ElementRef> {
        match self {
            ClickTarget::Element { element, .. } => Some(*element),
            ClickTarget::Url(_) => None,
        }
    }

    /// Target for an item, using its handle only if it belongs to `generation`.
    pub fn for_item(item: &ContentItem, generation: u64) -> Self {
        match item.element_in(generation) {
            Some(element) => ClickTarget::Element {
                element,
                url: item.url.clone(),
            },
            None => ClickTarget::Url(item.url.clone()),
        }
    }
}

/// One alternative readiness condition for `wait_for_any_of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum WaitCondition {
    /// At least one element matches the selector
    Present(String),
    /// At least one match is visible
    Visible(String),
    /// Current URL contains the fragment
    UrlContains(String),
}

impl WaitCondition {
    pub fn present(selector: impl Into<String>) -> Self {
        WaitCondition::Present(selector.into())
    }

    pub fn visible(selector: impl Into<String>) -> Self {
        WaitCondition::Visible(selector.into())
    }
}

/// First-visit overlay (regional consent dialog) patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentOverlay {
    /// Candidate button selectors, tried in order
    pub selectors: Vec<String>,
    /// Locale variants of the accept label
    pub texts: Vec<String>,
}

impl Default for ConsentOverlay {
    fn default() -> Self {
        Self {
            selectors: vec![
                "button".to_string(),
                "tp-yt-paper-button".to_string(),
                "ytd-button-renderer button".to_string(),
            ],
            texts: vec![
                "Accept all".to_string(),
                "Tout accepter".to_string(),
                "Accepter".to_string(),
            ],
        }
    }
}
