use std::path::PathBuf;

use threadgrab_core::{HarvestSettings, MediaUrl};

use crate::fetch::{build_client, send_get, FetchSettings};
use crate::persist::{ensure_target_dir, stream_into_place};
use crate::{DownloadError, DownloadOutcome, FetchError};

/// One attempt at getting a media file onto disk.
///
/// Must be idempotent: when the target already exists nothing is fetched.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &MediaUrl) -> Result<DownloadOutcome, DownloadError>;

    /// Where `url` ends up; used for reporting.
    fn target_file(&self, url: &MediaUrl) -> PathBuf;
}

#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    output_root: PathBuf,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client, output_root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_root: output_root.into(),
        }
    }

    pub fn from_settings(settings: &HarvestSettings) -> Result<Self, FetchError> {
        let client = build_client(&FetchSettings::from(settings))?;
        Ok(Self::new(client, settings.output_root.clone()))
    }
}

#[async_trait::async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &MediaUrl) -> Result<DownloadOutcome, DownloadError> {
        let target = url.target_path();
        let file = target.file_under(&self.output_root);

        if tokio::fs::try_exists(&file).await.unwrap_or(false) {
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        ensure_target_dir(&target.dir_under(&self.output_root)).await?;

        let response = send_get(&self.client, url.as_str()).await?;
        let bytes = stream_into_place(response, &file).await?;
        Ok(DownloadOutcome::Saved { bytes })
    }

    fn target_file(&self, url: &MediaUrl) -> PathBuf {
        url.target_path().file_under(&self.output_root)
    }
}
