//! Selector catalog
//!
//! Every selector the platform surface and the playback protocol use, in
//! fallback order. Loaded from configuration; the defaults track the current
//! platform markup.

use action_locator::{LinkStrategy, SelectorStrategy};
use action_primitives::{ConsentOverlay, WaitCondition};
use serde::{Deserialize, Serialize};

/// Where a listing lives and how to find the link inside each entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSpec {
    /// Container selectors, first one with matches wins
    pub scopes: Vec<String>,
    /// Link selectors tried inside each container
    pub links: Vec<String>,
}

impl ListingSpec {
    pub fn new(scopes: &[&str], links: &[&str]) -> Self {
        Self {
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            links: links.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn scope_strategies(&self) -> Vec<SelectorStrategy> {
        SelectorStrategy::css_list(&self.scopes)
    }

    pub fn link_strategies(&self) -> Vec<LinkStrategy> {
        LinkStrategy::list(&self.links)
    }

    /// "Some container is present" conditions.
    pub fn ready_conditions(&self) -> Vec<WaitCondition> {
        self.scopes.iter().map(WaitCondition::present).collect()
    }
}

const WATCH_LINK: &str = "a[href*=\"/watch?v=\"]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorCatalog {
    pub consent: ConsentOverlay,
    /// Persistent "home" affordance
    pub home_button: Vec<String>,
    pub homepage: ListingSpec,
    pub up_next: ListingSpec,
    pub search_results: ListingSpec,
    /// Filter chips on a channel's video listing
    pub popular_chips: Vec<String>,
    /// Localized labels of the "popular" chip, matched case-insensitively
    pub popular_labels: Vec<String>,
    pub popular_listing: ListingSpec,
    /// Generic listing used when no popular chip can be switched on
    pub channel_fallback: ListingSpec,
    pub channel_fallback_limit: usize,
    /// Any of these means the player page rendered
    pub player_ready: Vec<String>,
    /// Any of these, visible, means the item cannot be played
    pub unavailable: Vec<String>,
    pub play_buttons: Vec<String>,
    pub play_labels: Vec<String>,
    pub ad_indicators: Vec<String>,
    pub ad_skip_buttons: Vec<String>,
    pub prompt_buttons: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self {
            consent: ConsentOverlay::default(),
            home_button: strings(&["#logo-icon", "ytd-topbar-logo-renderer a#logo"]),
            homepage: ListingSpec::new(
                &["ytd-rich-item-renderer"],
                &["a#video-title-link", WATCH_LINK],
            ),
            up_next: ListingSpec::new(
                &[
                    "ytd-watch-next-secondary-results-renderer yt-lockup-view-model",
                    "ytd-compact-video-renderer",
                ],
                &[WATCH_LINK],
            ),
            search_results: ListingSpec::new(&["ytd-video-renderer"], &["a#video-title", WATCH_LINK]),
            popular_chips: strings(&[
                "div[class*=\"ytChipShapeChip\"]",
                "yt-chip-cloud-chip-renderer",
                "chip-shape button",
            ]),
            popular_labels: strings(&[
                "populaires",
                "popular",
                "più popolari",
                "más populares",
                "beliebt",
                "populair",
                "популярные",
                "人気",
                "热门",
            ]),
            popular_listing: ListingSpec::new(
                &["ytd-rich-item-renderer"],
                &["a#video-title-link", WATCH_LINK],
            ),
            channel_fallback: ListingSpec::new(
                &["ytd-rich-item-renderer", "#dismissible"],
                &[WATCH_LINK],
            ),
            channel_fallback_limit: 10,
            player_ready: strings(&["h1.ytd-watch-metadata", "#container > h1", "h1.title", "video"]),
            unavailable: strings(&[
                "ytd-player-error-message-renderer",
                "yt-playability-error-supported-renderers",
                ".ytp-error",
            ]),
            play_buttons: strings(&[
                ".ytp-play-button",
                ".ytp-large-play-button",
                "button[title*=\"Play\"]",
                "button[aria-label*=\"Play\"]",
            ]),
            play_labels: strings(&["play"]),
            ad_indicators: strings(&[
                ".ytp-ad-preview-container",
                ".ytp-ad-player-overlay",
                ".video-ads",
                "[class*=\"ad-showing\"]",
            ]),
            ad_skip_buttons: strings(&[
                ".ytp-ad-skip-button-container",
                ".ytp-ad-skip-button",
                "button[class*=\"skip\"]",
                ".ytp-skip-ad-button",
                ".videoAdUiSkipButton",
                "[id*=\"skip\"]",
            ]),
            prompt_buttons: strings(&[
                "button[aria-label*=\"No thanks\"]",
                "button[aria-label*=\"Not now\"]",
                ".ytd-popup-container button",
                "[role=\"dialog\"] button",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_popular_labels_cover_nine_locales() {
        let catalog = SelectorCatalog::default();
        assert_eq!(catalog.popular_labels.len(), 9);
        assert_eq!(catalog.channel_fallback_limit, 10);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let catalog: SelectorCatalog =
            serde_json::from_str(r#"{ "popular_labels": ["top"] }"#).unwrap();
        assert_eq!(catalog.popular_labels, vec!["top".to_string()]);
        assert_eq!(catalog.play_labels, vec!["play".to_string()]);
    }

    #[test]
    fn listing_spec_builds_strategies_in_order() {
        let spec = SelectorCatalog::default().channel_fallback;
        let names: Vec<_> = spec
            .scope_strategies()
            .iter()
            .map(|s| s.selector().to_string())
            .collect();
        assert_eq!(names, ["ytd-rich-item-renderer", "#dismissible"]);
        assert_eq!(spec.ready_conditions().len(), 2);
    }
}
