use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use url::Url;

use crate::metadata::{MetadataProvider, VideoMetadata};

/// Root used to synthesize canonical watch URLs.
pub const PLATFORM_ROOT: &str = "https://www.youtube.com";

/// Identifier of a content item, extracted from its canonical URL.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the id from a watch URL.
    ///
    /// Accepts `/watch?v=<id>`, `/shorts/<id>` and `youtu.be/<id>` forms,
    /// absolute or relative to [`PLATFORM_ROOT`].
    pub fn from_url(raw: &str) -> Option<Self> {
        let base = Url::parse(PLATFORM_ROOT).ok()?;
        let url = base.join(raw.trim()).ok()?;

        if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
            return Self::non_empty(&id);
        }

        let mut segments = url.path_segments()?;
        if url.host_str() == Some("youtu.be") {
            return segments.next().and_then(Self::non_empty);
        }
        match segments.next() {
            Some("shorts") | Some("embed") => segments.next().and_then(Self::non_empty),
            _ => None,
        }
    }

    /// Canonical watch URL for this id.
    pub fn watch_url(&self) -> String {
        format!("{PLATFORM_ROOT}/watch?v={}", self.0)
    }

    fn non_empty(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session-local reference to a live page element.
///
/// Only valid while the page generation it was issued in is current; drivers
/// bump the generation on every navigation and reject stale references.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ElementRef {
    pub generation: u64,
    pub slot: u32,
}

impl ElementRef {
    pub fn new(generation: u64, slot: u32) -> Self {
        Self { generation, slot }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

/// A content entity as seen by the agents.
#[derive(Clone, Debug)]
pub struct ContentItem {
    pub id: ContentId,
    pub url: String,
    element: Option<ElementRef>,
    metadata: Arc<OnceCell<Option<VideoMetadata>>>,
}

impl ContentItem {
    /// Build an item that came from a page listing.
    pub fn from_element(id: ContentId, url: impl Into<String>, element: ElementRef) -> Self {
        Self {
            id,
            url: url.into(),
            element: Some(element),
            metadata: Arc::default(),
        }
    }

    /// Build a detached item from a bare id (no page handle).
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = ContentId::new(id);
        let url = id.watch_url();
        Self {
            id,
            url,
            element: None,
            metadata: Arc::default(),
        }
    }

    /// Element handle, if it belongs to the given page generation.
    pub fn element_in(&self, generation: u64) -> Option<ElementRef> {
        self.element.filter(|el| el.is_current(generation))
    }

    pub fn element(&self) -> Option<ElementRef> {
        self.element
    }

    /// Drop the page handle, keeping id and URL.
    pub fn detach(mut self) -> Self {
        self.element = None;
        self
    }

    /// Metadata fetched on first use and cached for the item's lifetime.
    ///
    /// Failures are cached as absence; the lookup never errors.
    pub async fn metadata(&self, provider: &dyn MetadataProvider) -> Option<&VideoMetadata> {
        self.metadata
            .get_or_init(|| async { provider.fetch(&self.url).await })
            .await
            .as_ref()
    }
}

impl PartialEq for ContentItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.url == other.url
    }
}

/// Ids of a listing, in listing order.
pub fn ids_of(items: &[ContentItem]) -> Vec<String> {
    items.iter().map(|item| item.id.0.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn extracts_ids_from_watch_urls() {
        assert_eq!(
            ContentId::from_url("https://www.youtube.com/watch?v=abc123&t=10s"),
            Some(ContentId::new("abc123"))
        );
        assert_eq!(
            ContentId::from_url("/watch?v=xyz_-9"),
            Some(ContentId::new("xyz_-9"))
        );
        assert_eq!(
            ContentId::from_url("https://youtu.be/short1"),
            Some(ContentId::new("short1"))
        );
        assert_eq!(
            ContentId::from_url("/shorts/s42"),
            Some(ContentId::new("s42"))
        );
        assert_eq!(ContentId::from_url("/@somechannel"), None);
        assert_eq!(ContentId::from_url("/watch?v="), None);
    }

    #[test]
    fn stale_handles_are_not_returned() {
        let item = ContentItem::from_element(
            ContentId::new("a"),
            "https://www.youtube.com/watch?v=a",
            ElementRef::new(3, 0),
        );
        assert_eq!(item.element_in(3), Some(ElementRef::new(3, 0)));
        assert_eq!(item.element_in(4), None);
        assert_eq!(item.detach().element(), None);
    }

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataProvider for CountingProvider {
        async fn fetch(&self, url: &str) -> Option<VideoMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(VideoMetadata {
                webpage_url: url.to_string(),
                title: "cached".into(),
                ..VideoMetadata::default()
            })
        }
    }

    #[tokio::test]
    async fn metadata_is_fetched_once() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let item = ContentItem::from_id("abc");
        assert_eq!(
            item.metadata(&provider).await.map(|m| m.title.as_str()),
            Some("cached")
        );
        assert!(item.metadata(&provider).await.is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
