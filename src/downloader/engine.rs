//! Single stream download engine

use crate::downloader::progress::{ProgressObserver, ProgressTracker};
use crate::extractor::client::YoutubeClient;
use crate::extractor::models::{Format, Video};
use crate::utils::error::{Result, TubefetchError};
use futures::StreamExt;
use reqwest::Response;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

/// Download configuration
#[derive(Clone)]
pub struct DownloadConfig {
    /// Minimum delay between progress notifications
    pub progress_interval: Duration,
    /// Receives progress of every stream written
    pub observer: Option<Arc<dyn ProgressObserver>>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_millis(500),
            observer: None,
        }
    }
}

impl std::fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadConfig")
            .field("progress_interval", &self.progress_interval)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Streams one format's bytes into a file
#[derive(Clone)]
pub struct DownloadEngine {
    client: YoutubeClient,
    config: DownloadConfig,
}

impl DownloadEngine {
    pub fn new(client: YoutubeClient, config: DownloadConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &YoutubeClient {
        &self.client
    }

    /// Resolve, request and write `format` to `output_path`, truncating it.
    /// Returns the number of bytes written.
    pub async fn download_format(
        &self,
        video: &Video,
        format: &Format,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let response = self.client.get_stream(video, format, cancel).await?;
        self.write_response(response, output_path, cancel).await
    }

    /// Download an already resolved URL
    pub async fn download_url(
        &self,
        url: &str,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let response = self.client.http_get(url, cancel).await?;
        self.write_response(response, output_path, cancel).await
    }

    async fn write_response(
        &self,
        response: Response,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let logger = self.client.logger();
        let total_size = response.content_length().unwrap_or(0);
        logger.debug(format!(
            "Writing {} bytes to {}",
            total_size,
            output_path.display()
        ));

        let mut tracker = ProgressTracker::new(total_size)
            .with_observer(self.config.observer.clone())
            .with_interval(self.config.progress_interval);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(output_path)
            .await?;
        let mut file = BufWriter::new(file);

        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracker.fail("cancelled");
                    return Err(TubefetchError::Cancelled);
                }
                next = stream.next() => next,
            };

            let Some(chunk) = next else { break };
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    logger.warn(format!(
                        "Stream interrupted after {} bytes: {}",
                        tracker.written(),
                        e
                    ));
                    tracker.fail(&e.to_string());
                    return Err(e.into());
                }
            };

            file.write_all(&chunk).await?;
            tracker.record(chunk.len());
        }

        file.flush().await?;
        tracker.finish();

        Ok(tracker.written())
    }
}
