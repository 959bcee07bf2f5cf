//! YouTube surface
//!
//! [`Platform`] over one [`InteractionEngine`], driven entirely by the
//! [`SelectorCatalog`].

use std::time::Duration;

use action_primitives::{InteractionEngine, NavTarget};
use async_trait::async_trait;
use sockpuppet_core_types::{normalize_handle, ContentItem, PLATFORM_ROOT};
use tracing::{debug, info, warn};

use crate::catalog::{ListingSpec, SelectorCatalog};
use crate::errors::FlowError;
use crate::platform::Platform;
use crate::playback::{PlaybackController, PlaybackReport};

/// Page-height scroll steps before reading search results.
pub const DEFAULT_SEARCH_SCROLL_STEPS: u32 = 2;

pub struct YoutubeSurface {
    engine: InteractionEngine,
    catalog: SelectorCatalog,
    search_scroll_steps: u32,
}

impl YoutubeSurface {
    pub fn new(engine: InteractionEngine, catalog: SelectorCatalog) -> Self {
        let engine = engine.with_consent(catalog.consent.clone());
        Self {
            engine,
            catalog,
            search_scroll_steps: DEFAULT_SEARCH_SCROLL_STEPS,
        }
    }

    pub fn with_search_scroll(mut self, steps: u32) -> Self {
        self.search_scroll_steps = steps;
        self
    }

    pub fn engine(&self) -> &InteractionEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &SelectorCatalog {
        &self.catalog
    }

    pub fn search_url(query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
        format!("{PLATFORM_ROOT}/results?search_query={encoded}")
    }

    pub fn channel_videos_url(handle: &str) -> String {
        format!("{PLATFORM_ROOT}/{}/videos", normalize_handle(handle))
    }

    async fn listing(&self, spec: &ListingSpec, limit: Option<usize>) -> Vec<ContentItem> {
        self.engine
            .extract_entity_list(&spec.scope_strategies(), &spec.link_strategies(), limit)
            .await
    }

    /// Wait for the listing container, then extract it.
    async fn listing_when_ready(
        &self,
        spec: &ListingSpec,
        timeout: Duration,
        limit: Option<usize>,
    ) -> Vec<ContentItem> {
        if self
            .engine
            .wait_for_any_of(&spec.ready_conditions(), timeout)
            .await
            .is_none()
        {
            debug!(?timeout, "listing container not seen, extracting anyway");
        }
        self.listing(spec, limit).await
    }

    /// Click the home affordance; false when it is missing or refuses.
    async fn press_home(&self) -> bool {
        let none: &[String] = &[];
        let Some(logo) = self
            .engine
            .find_first_visible_clickable(&self.catalog.home_button, none)
            .await
        else {
            return false;
        };
        match self.engine.press(logo).await {
            Ok(()) => {
                self.engine.page().invalidate_handles();
                self.engine
                    .pause_ms(self.engine.timings().click_settle_ms)
                    .await;
                true
            }
            Err(err) => {
                debug!("home affordance refused the click: {}", err);
                false
            }
        }
    }

    /// Switch the channel listing to its popular filter.
    async fn select_popular_chip(&self) -> bool {
        let Some(chip) = self
            .engine
            .find_first_visible_clickable(&self.catalog.popular_chips, &self.catalog.popular_labels)
            .await
        else {
            return false;
        };
        match self.engine.press(chip).await {
            Ok(()) => {
                self.engine.page().invalidate_handles();
                true
            }
            Err(err) => {
                warn!("popular filter refused the click: {}", err);
                false
            }
        }
    }
}

#[async_trait]
impl Platform for YoutubeSurface {
    async fn homepage(&self) -> Result<Vec<ContentItem>, FlowError> {
        if self.press_home().await {
            debug!("homepage reached through the home affordance");
        } else {
            debug!("homepage reached by url");
            self.engine.navigate(NavTarget::root()).await?;
        }

        let timeout = Duration::from_millis(self.engine.timings().listing_timeout_ms);
        let items = self
            .listing_when_ready(&self.catalog.homepage, timeout, None)
            .await;
        self.engine.ensure_session()?;
        info!(count = items.len(), "homepage recommendations");
        Ok(items)
    }

    async fn up_next(&self, limit: usize) -> Result<Vec<ContentItem>, FlowError> {
        let timeout = Duration::from_millis(self.engine.timings().up_next_timeout_ms);
        let items = self
            .listing_when_ready(&self.catalog.up_next, timeout, Some(limit))
            .await;
        self.engine.ensure_session()?;
        info!(count = items.len(), limit, "up-next recommendations");
        Ok(items)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ContentItem>, FlowError> {
        if query.trim().is_empty() {
            return Err(FlowError::InvalidInput("empty search query".to_string()));
        }

        self.engine.navigate(Self::search_url(query)).await?;
        self.engine
            .pause_ms(self.engine.timings().search_settle_ms)
            .await;
        self.engine.scroll(self.search_scroll_steps).await;

        let items = self.listing(&self.catalog.search_results, Some(limit)).await;
        self.engine.ensure_session()?;
        info!(%query, count = items.len(), limit, "search results");
        Ok(items)
    }

    async fn channel_popular(&self, handle: &str) -> Result<Vec<ContentItem>, FlowError> {
        if handle.trim().trim_start_matches('@').is_empty() {
            return Err(FlowError::InvalidInput("empty channel handle".to_string()));
        }

        let url = Self::channel_videos_url(handle);
        self.engine.navigate(url.as_str()).await?;

        if self.select_popular_chip().await {
            let timeout = Duration::from_millis(self.engine.timings().listing_timeout_ms);
            let items = self
                .listing_when_ready(&self.catalog.popular_listing, timeout, None)
                .await;
            if !items.is_empty() {
                info!(%handle, count = items.len(), "popular listing");
                return Ok(items);
            }
            debug!(%handle, "popular listing empty after filter click");
        } else {
            debug!(%handle, "no popular filter found");
        }

        let items = self
            .listing(
                &self.catalog.channel_fallback,
                Some(self.catalog.channel_fallback_limit),
            )
            .await;
        self.engine.ensure_session()?;
        info!(%handle, count = items.len(), "generic channel listing used");
        Ok(items)
    }

    async fn watch(
        &self,
        item: &ContentItem,
        duration: Duration,
    ) -> Result<PlaybackReport, FlowError> {
        PlaybackController::new(&self.engine, &self.catalog)
            .play(item, duration)
            .await
    }

    async fn close(&self) {
        self.engine.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::InteractionTimings;
    use cdp_adapter::fake::{ClickBehavior, FakeNode, FakePage};
    use cdp_adapter::Cdp;
    use sockpuppet_core_types::ids_of;
    use std::sync::Arc;

    const HOME: &str = "https://www.youtube.com";
    const WATCH: &str = "https://www.youtube.com/watch?v=seed";

    fn rich(id: &str) -> FakeNode {
        FakeNode::new("ytd-rich-item-renderer").child(FakeNode::watch_link(id))
    }

    fn numbered(prefix: &str, n: usize, node: fn(&str) -> FakeNode) -> Vec<FakeNode> {
        (0..n).map(|i| node(&format!("{prefix}{i}"))).collect()
    }

    fn surface(page: FakePage) -> (YoutubeSurface, Arc<FakePage>) {
        let page = Arc::new(page);
        let engine = InteractionEngine::new(page.clone(), InteractionTimings::immediate());
        (YoutubeSurface::new(engine, SelectorCatalog::default()), page)
    }

    #[test]
    fn builds_platform_urls() {
        assert_eq!(
            YoutubeSurface::search_url("gilet jaune"),
            "https://www.youtube.com/results?search_query=gilet+jaune"
        );
        assert_eq!(
            YoutubeSurface::channel_videos_url("somechannel"),
            "https://www.youtube.com/@somechannel/videos"
        );
    }

    #[tokio::test]
    async fn search_results_are_capped() {
        let video = |id: &str| FakeNode::new("ytd-video-renderer").child(FakeNode::watch_link(id));
        let page = FakePage::new().route(
            "https://www.youtube.com/results",
            numbered("r", 12, video),
        );
        let (surface, page) = surface(page);

        let items = surface.search("gilet jaune", 10).await.unwrap();
        assert_eq!(ids_of(&items), (0..10).map(|i| format!("r{i}")).collect::<Vec<_>>());
        assert_eq!(
            page.navigations(),
            vec!["https://www.youtube.com/results?search_query=gilet+jaune".to_string()]
        );
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let (surface, _page) = surface(FakePage::new());
        assert!(matches!(
            surface.search("  ", 10).await,
            Err(FlowError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn homepage_prefers_the_home_affordance() {
        let page = FakePage::new()
            .route(
                WATCH,
                vec![FakeNode::new("#logo-icon")
                    .named("logo")
                    .on_click(ClickBehavior::NavigateTo(HOME.to_string()))],
            )
            .route(HOME, vec![rich("h1"), rich("h2")]);
        let (surface, page) = surface(page);
        page.navigate(WATCH, Duration::from_secs(1)).await.unwrap();

        let items = surface.homepage().await.unwrap();
        assert_eq!(ids_of(&items), vec!["h1", "h2"]);
        assert_eq!(page.clicks(), vec!["logo".to_string()]);
        assert_eq!(page.navigations(), vec![WATCH.to_string()]);
    }

    #[tokio::test]
    async fn homepage_falls_back_to_the_root_url() {
        let page = FakePage::new().route(HOME, vec![rich("h1")]);
        let (surface, page) = surface(page);

        let items = surface.homepage().await.unwrap();
        assert_eq!(ids_of(&items), vec!["h1"]);
        assert_eq!(page.navigations(), vec![HOME.to_string()]);
    }

    #[tokio::test]
    async fn up_next_takes_the_top_entries() {
        let lockup = |id: &str| {
            FakeNode::new("ytd-watch-next-secondary-results-renderer yt-lockup-view-model")
                .child(FakeNode::watch_link(id))
        };
        let page = FakePage::new().route(WATCH, numbered("n", 8, lockup));
        let (surface, page) = surface(page);
        page.navigate(WATCH, Duration::from_secs(1)).await.unwrap();

        let items = surface.up_next(5).await.unwrap();
        assert_eq!(ids_of(&items), vec!["n0", "n1", "n2", "n3", "n4"]);
    }

    #[tokio::test]
    async fn dead_browser_is_not_an_empty_listing() {
        let page = FakePage::new().route(WATCH, vec![rich("n0")]);
        let (surface, page) = surface(page);
        page.navigate(WATCH, Duration::from_secs(1)).await.unwrap();
        page.disconnect();

        assert!(matches!(
            surface.up_next(5).await,
            Err(FlowError::SessionLost(_))
        ));
        assert!(matches!(
            surface.homepage().await,
            Err(FlowError::SessionLost(_))
        ));
    }

    #[tokio::test]
    async fn popular_filter_is_clicked_when_present() {
        let mut nodes = vec![FakeNode::new("yt-chip-cloud-chip-renderer")
            .text("Popular")
            .named("chip")];
        nodes.extend(numbered("p", 12, rich));
        let page = FakePage::new().route("https://www.youtube.com/@chan/videos", nodes);
        let (surface, page) = surface(page);

        let items = surface.channel_popular("chan").await.unwrap();
        assert_eq!(items.len(), 12);
        assert_eq!(page.clicks(), vec!["chip".to_string()]);
    }

    #[tokio::test]
    async fn missing_popular_filter_falls_back_to_a_bounded_listing() {
        let dismissible = |id: &str| FakeNode::new("#dismissible").child(FakeNode::watch_link(id));
        let page = FakePage::new().route(
            "https://www.youtube.com/@chan/videos",
            numbered("d", 14, dismissible),
        );
        let (surface, page) = surface(page);

        let items = surface.channel_popular("@chan").await.unwrap();
        assert_eq!(items.len(), 10);
        assert_eq!(items[0].id.as_str(), "d0");
        assert!(page.clicks().is_empty());
    }

    #[tokio::test]
    async fn unreachable_channel_page_raises() {
        let (surface, _page) = surface(FakePage::new().failing("https://www.youtube.com/@gone"));
        assert!(matches!(
            surface.channel_popular("gone").await,
            Err(FlowError::Navigation(_))
        ));
    }
}
