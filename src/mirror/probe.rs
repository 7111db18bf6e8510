//! HEAD-based existence checks shared by every HTTP mirror.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::http::{HttpTimeouts, RedirectHandling, build_client};

use super::{ProbeFailure, ProbeOutcome};

/// Upper bound on a single probe request.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pair of HTTP clients used for probing.
///
/// Most mirrors follow redirects and only accept a 2xx answer. Mirrors whose
/// storage answers existence checks with a redirect probe with a client that
/// reports the 3xx instead of following it.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    following: Client,
    reporting: Client,
}

impl ProbeClient {
    /// Builds both probe clients with the shared HTTP policy.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` when a client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        Ok(Self {
            following: build_client(timeouts, RedirectHandling::Follow)?,
            reporting: build_client(timeouts, RedirectHandling::Report)?,
        })
    }

    /// Sends a HEAD request to `url` and classifies the answer.
    ///
    /// With `redirect_is_available` the request does not follow redirects and
    /// a 3xx status counts as available.
    pub(crate) async fn head(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        redirect_is_available: bool,
        cancel: &CancellationToken,
    ) -> ProbeOutcome {
        let client = if redirect_is_available {
            &self.reporting
        } else {
            &self.following
        };
        let mut request = client.head(url).timeout(PROBE_TIMEOUT);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return ProbeOutcome::Cancelled,
            response = request.send() => response,
        };

        let outcome = match response {
            Ok(response) => classify_status(response.status(), redirect_is_available),
            Err(error) if error.is_timeout() => {
                ProbeOutcome::Unavailable(ProbeFailure::Timeout(PROBE_TIMEOUT))
            }
            Err(error) => ProbeOutcome::Unavailable(ProbeFailure::Network(error.to_string())),
        };
        debug!(url, outcome = %outcome, "probe finished");
        outcome
    }
}

fn classify_status(status: reqwest::StatusCode, redirect_is_available: bool) -> ProbeOutcome {
    if status.is_success() || (redirect_is_available && status.is_redirection()) {
        ProbeOutcome::Available {
            status: status.as_u16(),
        }
    } else {
        ProbeOutcome::Unavailable(ProbeFailure::Status(status.as_u16()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_classify_status_success_is_available() {
        assert!(classify_status(StatusCode::OK, false).is_available());
        assert!(classify_status(StatusCode::NO_CONTENT, true).is_available());
    }

    #[test]
    fn test_classify_status_redirect_depends_on_mirror() {
        assert!(!classify_status(StatusCode::FOUND, false).is_available());
        assert!(classify_status(StatusCode::FOUND, true).is_available());
        assert!(classify_status(StatusCode::TEMPORARY_REDIRECT, true).is_available());
    }

    #[test]
    fn test_classify_status_errors_are_unavailable() {
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, true),
            ProbeOutcome::Unavailable(ProbeFailure::Status(404))
        );
        assert!(!classify_status(StatusCode::INTERNAL_SERVER_ERROR, false).is_available());
    }

    #[test]
    fn test_probe_timeout_is_tighter_than_default_client_timeouts() {
        let defaults = HttpTimeouts::default();
        assert_eq!(PROBE_TIMEOUT, Duration::from_secs(10));
        assert!(PROBE_TIMEOUT < Duration::from_secs(defaults.read_timeout_secs));
        assert!(PROBE_TIMEOUT <= Duration::from_secs(defaults.connect_timeout_secs));
    }

    #[tokio::test]
    async fn test_head_already_cancelled_returns_cancelled() {
        let client = ProbeClient::new(HttpTimeouts::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = client
            .head("http://127.0.0.1:9/never", None, false, &cancel)
            .await;
        assert_eq!(outcome, ProbeOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_head_connection_refused_is_unavailable() {
        let client = ProbeClient::new(HttpTimeouts::default()).unwrap();
        let cancel = CancellationToken::new();
        // Port 9 (discard) is closed on loopback in practice.
        let outcome = client
            .head("http://127.0.0.1:9/model.bin", None, false, &cancel)
            .await;
        assert!(!outcome.is_available());
    }
}
