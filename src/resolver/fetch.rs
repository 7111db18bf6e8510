//! Probing and download-with-fallback over a [`MirrorRegistry`].

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::download::{Downloader, ProgressCallback};
use crate::mirror::{Mirror, MirrorListing, ProbeOutcome};

use super::{DownloadAttempt, FetchError, MirrorRegistry};

/// Suffix appended to the destination path while a download is in flight.
pub const TEMP_SUFFIX: &str = ".download";

/// Returns the in-flight path for `destination` (`destination` + [`TEMP_SUFFIX`]).
#[must_use]
pub fn temp_download_path(destination: &Path) -> PathBuf {
    let mut raw: OsString = destination.as_os_str().to_owned();
    raw.push(TEMP_SUFFIX);
    PathBuf::from(raw)
}

/// A successfully fetched artifact.
#[derive(Debug)]
pub struct FetchedArtifact<'a> {
    /// The mirror that served the artifact.
    pub mirror: &'a dyn Mirror,
    /// The exact URL the artifact was downloaded from.
    pub url: String,
    /// Final location of the artifact.
    pub path: PathBuf,
    /// Size of the artifact in bytes.
    pub bytes: u64,
}

/// Owns the mirror registry and runs probes and downloads against it.
///
/// Holds no per-call state: every operation re-derives mirror order from the
/// immutable registry.
pub struct MirrorResolver {
    registry: MirrorRegistry,
    downloader: Arc<dyn Downloader>,
}

impl MirrorResolver {
    /// Creates a resolver over a fully built registry.
    #[must_use]
    pub fn new(registry: MirrorRegistry, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            registry,
            downloader,
        }
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &MirrorRegistry {
        &self.registry
    }

    /// Finds a mirror by name, ignoring ASCII case.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&dyn Mirror> {
        self.registry.get_by_name(name)
    }

    /// Returns every mirror name in registration order.
    #[must_use]
    pub fn mirror_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Returns enabled mirrors, ascending by priority.
    #[must_use]
    pub fn enabled_mirrors(&self) -> Vec<&dyn Mirror> {
        self.registry.enabled_by_priority()
    }

    /// Returns name, priority and status of every mirror, ascending by priority.
    #[must_use]
    pub fn mirror_listing(&self) -> Vec<MirrorListing> {
        self.registry.listing()
    }

    /// Probes every enabled mirror concurrently.
    ///
    /// Returns the mirrors whose probe succeeded, ascending by priority.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] if `cancel` fires.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn probe_all(
        &self,
        artifact: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<&dyn Mirror>, FetchError> {
        let enabled = self.enabled_mirrors();
        debug!(mirror_count = enabled.len(), "Probing mirrors concurrently");

        let probes = enabled.into_iter().map(|mirror| async move {
            let available = mirror.probe(artifact, cancel).await;
            (mirror, available)
        });
        let results = join_all(probes).await;

        if cancel.is_cancelled() {
            return Err(FetchError::cancelled(artifact));
        }

        // join_all preserves input order, which is already priority order.
        let available: Vec<&dyn Mirror> = results
            .into_iter()
            .filter_map(|(mirror, ok)| ok.then_some(mirror))
            .collect();
        info!(available = available.len(), "Probe complete");
        Ok(available)
    }

    /// Probes enabled mirrors one at a time in priority order.
    ///
    /// Stops at the first mirror whose probe succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] if `cancel` fires.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn find_first_available(
        &self,
        artifact: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<&dyn Mirror>, FetchError> {
        for mirror in self.enabled_mirrors() {
            if cancel.is_cancelled() {
                return Err(FetchError::cancelled(artifact));
            }
            if mirror.probe(artifact, cancel).await {
                info!(mirror = mirror.name(), "Found available mirror");
                return Ok(Some(mirror));
            }
            debug!(mirror = mirror.name(), "Mirror unavailable, trying next");
        }

        if cancel.is_cancelled() {
            return Err(FetchError::cancelled(artifact));
        }
        Ok(None)
    }

    /// Probes every enabled mirror concurrently and keeps the detailed outcome.
    ///
    /// Intended for status reporting; results are ascending by priority.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] if `cancel` fires.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn probe_report(
        &self,
        artifact: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<(MirrorListing, ProbeOutcome)>, FetchError> {
        let probes = self.enabled_mirrors().into_iter().map(|mirror| async move {
            let outcome = mirror.probe_detailed(artifact, cancel).await;
            (MirrorListing::of(mirror), outcome)
        });
        let report = join_all(probes).await;

        if cancel.is_cancelled() {
            return Err(FetchError::cancelled(artifact));
        }
        Ok(report)
    }

    /// Downloads `artifact` to `destination`, trying enabled mirrors in
    /// priority order until one succeeds.
    ///
    /// Each attempt streams into `destination` + [`TEMP_SUFFIX`] and is only
    /// renamed onto `destination` once complete, so a failed attempt never
    /// clobbers an existing file. The temporary file is removed before every
    /// attempt and after every failed one.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] if `cancel` fires, and
    /// [`FetchError::Exhausted`] with one record per attempted mirror when
    /// every enabled mirror failed (or none is enabled).
    #[tracing::instrument(
        skip(self, destination, cancel, progress),
        fields(destination = %destination.display())
    )]
    pub async fn download_with_fallback(
        &self,
        artifact: &str,
        destination: &Path,
        cancel: &CancellationToken,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<FetchedArtifact<'_>, FetchError> {
        let temp_path = temp_download_path(destination);
        let mut attempts: Vec<DownloadAttempt> = Vec::new();

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty())
            && let Err(error) = tokio::fs::create_dir_all(parent).await
        {
            // Each attempt will surface the same IO error when creating the file.
            warn!(
                path = %parent.display(),
                error = %error,
                "Could not create destination directory"
            );
        }

        for mirror in self.enabled_mirrors() {
            if cancel.is_cancelled() {
                remove_temp_file(&temp_path).await;
                return Err(FetchError::cancelled(artifact));
            }
            remove_temp_file(&temp_path).await;

            let url = mirror.download_url(artifact);
            if let Some(previous) = attempts.last() {
                info!(
                    mirror = mirror.name(),
                    previous = %previous.mirror,
                    "Falling back to next mirror, progress restarts"
                );
            }
            info!(mirror = mirror.name(), url = %url, "Attempting download");

            let result = self
                .downloader
                .download_to_path(&url, mirror.headers(), &temp_path, cancel, progress)
                .await;

            match result {
                Ok(bytes) => match tokio::fs::rename(&temp_path, destination).await {
                    Ok(()) => {
                        info!(mirror = mirror.name(), bytes, "Download succeeded");
                        return Ok(FetchedArtifact {
                            mirror,
                            url,
                            path: destination.to_path_buf(),
                            bytes,
                        });
                    }
                    Err(error) => {
                        let message = format!(
                            "failed to move {} into place: {error}",
                            temp_path.display()
                        );
                        warn!(
                            mirror = mirror.name(),
                            error = %message,
                            "Download failed, trying next mirror"
                        );
                        remove_temp_file(&temp_path).await;
                        attempts.push(DownloadAttempt::new(mirror.name(), message));
                    }
                },
                Err(error) if error.is_cancelled() || cancel.is_cancelled() => {
                    remove_temp_file(&temp_path).await;
                    info!(mirror = mirror.name(), "Download cancelled");
                    return Err(FetchError::cancelled(artifact));
                }
                Err(error) => {
                    warn!(
                        mirror = mirror.name(),
                        error = %error,
                        "Download failed, trying next mirror"
                    );
                    remove_temp_file(&temp_path).await;
                    attempts.push(DownloadAttempt::new(mirror.name(), error.to_string()));
                }
            }
        }

        warn!(attempted = attempts.len(), "All mirrors exhausted");
        Err(FetchError::exhausted(artifact, destination, attempts))
    }
}

impl std::fmt::Debug for MirrorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorResolver")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial download"),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => {
            warn!(path = %path.display(), error = %error, "Could not remove partial download");
        }
    }
}
