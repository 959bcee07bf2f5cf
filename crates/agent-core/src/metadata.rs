//! `yt-dlp` backed metadata provider

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use sockpuppet_core_types::{MetadataProvider, VideoMetadata};
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct YtDlpMetadata {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for YtDlpMetadata {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }
}

impl YtDlpMetadata {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    async fn dump(&self, url: &str) -> Result<Vec<u8>, String> {
        let child = Command::new(&self.binary)
            .args(["-J", "--skip-download", "--no-warnings", url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| format!("timed out after {:?}", self.timeout))?
            .map_err(|err| err.to_string())?;
        if !output.status.success() {
            return Err(format!("exited with {}", output.status));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl MetadataProvider for YtDlpMetadata {
    async fn fetch(&self, url: &str) -> Option<VideoMetadata> {
        match self.dump(url).await {
            Ok(stdout) => match serde_json::from_slice::<VideoMetadata>(&stdout) {
                Ok(metadata) => Some(metadata),
                Err(err) => {
                    debug!(%url, "unreadable metadata: {}", err);
                    None
                }
            },
            Err(reason) => {
                debug!(%url, %reason, "metadata lookup failed");
                None
            }
        }
    }
}
