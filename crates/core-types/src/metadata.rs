use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Best-effort metadata record for one content item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub webpage_url: String,
    pub duration: Option<f64>,
    pub upload_date: Option<String>,
    pub channel_id: Option<String>,
    pub channel_url: Option<String>,
    #[serde(alias = "uploader")]
    pub channel_name: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub age_limit: Option<u32>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

/// External metadata service. Absence is a normal answer, never an error.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<VideoMetadata>;
}

/// Provider used when metadata collection is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMetadata;

#[async_trait]
impl MetadataProvider for NoMetadata {
    async fn fetch(&self, _url: &str) -> Option<VideoMetadata> {
        None
    }
}
