//! Error types surfaced by the mirror resolver.
//!
//! Per-mirror failures never reach the caller on their own: they are folded
//! into [`FetchError::Exhausted`] once every enabled mirror has been tried.
//! Messages follow the What / Suggestion layout used across the project.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::OVERRIDE_URL_ENV;

/// One failed download attempt against a single mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAttempt {
    /// Name of the mirror that was tried.
    pub mirror: String,
    /// Why the attempt failed.
    pub message: String,
}

impl DownloadAttempt {
    /// Creates an attempt record.
    #[must_use]
    pub fn new(mirror: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            mirror: mirror.into(),
            message: message.into(),
        }
    }
}

/// Errors a caller of the resolver can observe.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every enabled mirror failed to deliver the artifact.
    #[error("{}", exhausted_message(artifact, destination, attempts))]
    Exhausted {
        /// The artifact that could not be fetched.
        artifact: String,
        /// Where the artifact was supposed to land.
        destination: PathBuf,
        /// One record per attempted mirror, in attempt order.
        attempts: Vec<DownloadAttempt>,
    },

    /// The caller cancelled the operation.
    #[error("fetching '{artifact}' was cancelled")]
    Cancelled {
        /// The artifact being fetched or probed.
        artifact: String,
    },

    /// An HTTP client could not be constructed.
    #[error(
        "failed to initialize HTTP client: {reason}\n  Suggestion: Check proxy environment variables and TLS configuration"
    )]
    HttpClient {
        /// Why client construction failed.
        reason: String,
    },
}

impl FetchError {
    /// Creates an `Exhausted` error.
    #[must_use]
    pub fn exhausted(artifact: &str, destination: &Path, attempts: Vec<DownloadAttempt>) -> Self {
        Self::Exhausted {
            artifact: artifact.to_string(),
            destination: destination.to_path_buf(),
            attempts,
        }
    }

    /// Creates a `Cancelled` error.
    #[must_use]
    pub fn cancelled(artifact: &str) -> Self {
        Self::Cancelled {
            artifact: artifact.to_string(),
        }
    }

    /// Creates an `HttpClient` error.
    #[must_use]
    pub fn http_client(error: &reqwest::Error) -> Self {
        Self::HttpClient {
            reason: error.to_string(),
        }
    }

    /// Returns true for [`FetchError::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn exhausted_message(artifact: &str, destination: &Path, attempts: &[DownloadAttempt]) -> String {
    let mut message = if attempts.is_empty() {
        format!("no enabled mirrors available to download '{artifact}'")
    } else {
        format!(
            "all mirrors failed to download '{artifact}': tried {} mirror(s)",
            attempts.len()
        )
    };
    for attempt in attempts {
        let _ = write!(message, "\n  - {}: {}", attempt.mirror, attempt.message);
    }
    let _ = write!(
        message,
        "\n  Suggestion: Set {OVERRIDE_URL_ENV} (or pass --mirror-url) to a reachable mirror, \
         download the file manually to '{}', or check network, firewall and proxy settings",
        destination.display()
    );
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_lists_every_attempt() {
        let err = FetchError::exhausted(
            "ggml-base.bin",
            Path::new("/models/ggml-base.bin"),
            vec![
                DownloadAttempt::new("HuggingFace", "HTTP 503 downloading https://a/ggml-base.bin"),
                DownloadAttempt::new("GitHub", "timeout downloading https://b/ggml-base.bin"),
            ],
        );
        let msg = err.to_string();
        assert!(msg.contains("ggml-base.bin"), "should contain artifact: {msg}");
        assert!(msg.contains("tried 2 mirror(s)"), "should contain count: {msg}");
        assert!(msg.contains("  - HuggingFace: HTTP 503"), "first attempt line: {msg}");
        assert!(msg.contains("  - GitHub: timeout"), "second attempt line: {msg}");
        assert!(msg.contains("Suggestion"), "should have suggestion: {msg}");
        assert!(msg.contains("MODELFETCH_MIRROR_URL"), "override hint: {msg}");
        assert!(msg.contains("/models/ggml-base.bin"), "manual placement hint: {msg}");
        assert!(msg.contains("firewall"), "network hint: {msg}");
    }

    #[test]
    fn test_exhausted_message_without_attempts() {
        let err = FetchError::exhausted("a.bin", Path::new("a.bin"), Vec::new());
        let msg = err.to_string();
        assert!(msg.contains("no enabled mirrors"), "unexpected: {msg}");
        assert!(!msg.contains("  - "), "no attempt lines expected: {msg}");
    }

    #[test]
    fn test_cancelled_message() {
        let err = FetchError::cancelled("ggml-tiny.bin");
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "fetching 'ggml-tiny.bin' was cancelled");
    }

    #[test]
    fn test_exhausted_is_not_cancelled() {
        let err = FetchError::exhausted("a.bin", Path::new("a.bin"), Vec::new());
        assert!(!err.is_cancelled());
    }
}
