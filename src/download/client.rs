//! `reqwest`-backed [`Downloader`] that streams response bodies to disk.

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::HeaderMap;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use super::{DownloadError, Downloader, ProgressCallback};
use crate::http::{HttpTimeouts, RedirectHandling, build_client};

/// HTTP downloader with streaming support.
///
/// Create once and reuse so connections are pooled across mirrors.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Creates a downloader that follows redirects with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` when the client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeouts, RedirectHandling::Follow)?,
        })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    async fn send(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, DownloadError> {
        let mut request = self.client.get(url);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            sent = request.send() => sent,
        };
        let response = sent.map_err(|e| DownloadError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[instrument(skip(self, headers, cancel, progress), fields(url = %url, path = %path.display()))]
    async fn download_to_path(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        path: &Path,
        cancel: &CancellationToken,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<u64, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        debug!("starting download");

        let response = self.send(url, headers, cancel).await?;
        let content_length = response.content_length().filter(|len| *len > 0);

        let file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        let bytes_written =
            stream_to_file(file, response, url, path, content_length, cancel, progress).await?;

        if let Some(expected) = content_length
            && expected != bytes_written
        {
            return Err(DownloadError::truncated(url, expected, bytes_written));
        }

        if let Some(report) = progress {
            report(100);
        }
        info!(bytes = bytes_written, "download complete");
        Ok(bytes_written)
    }
}

/// Streams the response body to `file`, returning bytes written.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
    content_length: Option<u64>,
    cancel: &CancellationToken,
    progress: Option<ProgressCallback<'_>>,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;
    let mut tracker = PercentTracker::new(content_length);

    if let Some(report) = progress {
        report(0);
    }

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::from_reqwest(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        bytes_written += chunk.len() as u64;

        if let (Some(report), Some(percent)) = (progress, tracker.advance(bytes_written)) {
            report(percent);
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    Ok(bytes_written)
}

/// Converts byte counts to whole percentages, emitting each value once.
#[derive(Debug)]
struct PercentTracker {
    total: Option<u64>,
    last: u8,
}

impl PercentTracker {
    fn new(total: Option<u64>) -> Self {
        Self { total, last: 0 }
    }

    /// Returns the new percentage when it moved since the last report.
    ///
    /// 100 is reserved for the caller once the body is verified complete.
    fn advance(&mut self, bytes: u64) -> Option<u8> {
        let total = self.total?;
        let percent = (u128::from(bytes) * 100 / u128::from(total)).min(99);
        let percent = u8::try_from(percent).unwrap_or(99);
        if percent > self.last {
            self.last = percent;
            Some(percent)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_tracker_without_total_reports_nothing() {
        let mut tracker = PercentTracker::new(None);
        assert_eq!(tracker.advance(10), None);
        assert_eq!(tracker.advance(1_000_000), None);
    }

    #[test]
    fn test_percent_tracker_reports_each_step_once() {
        let mut tracker = PercentTracker::new(Some(200));
        assert_eq!(tracker.advance(1), None);
        assert_eq!(tracker.advance(2), Some(1));
        assert_eq!(tracker.advance(3), None);
        assert_eq!(tracker.advance(100), Some(50));
        assert_eq!(tracker.advance(200), Some(99));
    }

    #[test]
    fn test_percent_tracker_caps_overshoot() {
        let mut tracker = PercentTracker::new(Some(10));
        assert_eq!(tracker.advance(50), Some(99));
    }

    #[tokio::test]
    async fn test_download_rejects_invalid_url() {
        let downloader = HttpDownloader::new(HttpTimeouts::default()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        let result = downloader
            .download_to_path("not a url", None, &dir.path().join("x"), &cancel, None)
            .await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
        assert!(!dir.path().join("x").exists());
    }

    #[tokio::test]
    async fn test_download_cancelled_before_send() {
        let downloader = HttpDownloader::new(HttpTimeouts::default()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = downloader
            .download_to_path(
                "http://127.0.0.1:9/model.bin",
                None,
                &dir.path().join("x"),
                &cancel,
                None,
            )
            .await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
