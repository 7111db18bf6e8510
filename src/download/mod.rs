//! Streaming transport used by the resolver for full artifact downloads.
//!
//! The resolver never talks to `reqwest` directly for downloads; it goes
//! through the [`Downloader`] trait so the transport can be swapped (tests
//! use scripted downloaders that fail mid-stream).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use modelfetch_core::download::{Downloader, HttpDownloader};
//! use modelfetch_core::http::HttpTimeouts;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = HttpDownloader::new(HttpTimeouts::default())?;
//! let cancel = CancellationToken::new();
//! let bytes = downloader
//!     .download_to_path(
//!         "https://example.com/ggml-base.bin",
//!         None,
//!         Path::new("./ggml-base.bin.download"),
//!         &cancel,
//!         None,
//!     )
//!     .await?;
//! println!("wrote {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::HttpDownloader;
pub use error::DownloadError;

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;

/// Progress sink receiving a 0-100 percentage.
pub type ProgressCallback<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Transport that streams one URL into one file.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url` into `path`, creating or truncating the file.
    ///
    /// Returns the number of bytes written. On error the file may be left
    /// partially written; callers own cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Cancelled`] when `cancel` fires, and another
    /// [`DownloadError`] variant for network, HTTP status or IO failures.
    async fn download_to_path(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        path: &Path,
        cancel: &CancellationToken,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<u64, DownloadError>;
}
