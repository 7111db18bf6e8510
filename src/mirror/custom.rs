//! Operator-supplied override mirror.
//!
//! The [`CustomMirror`] points at a private or enterprise host holding the
//! same artifact layout as the public sources. When configured it is always
//! enabled and always tried first.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;

use super::{Mirror, ProbeClient, ProbeOutcome, join_artifact_url};

/// Registered name of the override mirror.
pub const CUSTOM_MIRROR_NAME: &str = "Custom";

/// Priority of the override mirror; no built-in mirror uses it.
pub const CUSTOM_MIRROR_PRIORITY: u32 = 1;

/// Trims surrounding whitespace and trailing `/` from a base URL.
///
/// Returns `None` when nothing is left.
#[must_use]
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Mirror built from an operator-supplied base URL.
#[derive(Debug, Clone)]
pub struct CustomMirror {
    base_url: String,
    headers: Option<HeaderMap>,
    client: ProbeClient,
}

impl CustomMirror {
    /// Creates an override mirror for `base_url`.
    ///
    /// The URL is expected to be normalized already (see
    /// [`normalize_base_url`]); a stray trailing `/` is still removed.
    #[must_use]
    pub fn new(base_url: &str, client: ProbeClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: None,
            client,
        }
    }

    /// Attaches static headers sent with every probe and download.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = (!headers.is_empty()).then_some(headers);
        self
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Mirror for CustomMirror {
    fn name(&self) -> &'static str {
        CUSTOM_MIRROR_NAME
    }

    fn priority(&self) -> u32 {
        CUSTOM_MIRROR_PRIORITY
    }

    fn download_url(&self, artifact: &str) -> String {
        join_artifact_url(&self.base_url, artifact)
    }

    fn headers(&self) -> Option<HeaderMap> {
        self.headers.clone()
    }

    #[tracing::instrument(skip(self, cancel), fields(mirror = CUSTOM_MIRROR_NAME))]
    async fn probe_detailed(&self, artifact: &str, cancel: &CancellationToken) -> ProbeOutcome {
        self.client
            .head(&self.download_url(artifact), self.headers(), false, cancel)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::http::HttpTimeouts;
    use reqwest::header::{AUTHORIZATION, HeaderValue};

    fn client() -> ProbeClient {
        ProbeClient::new(HttpTimeouts::default()).unwrap()
    }

    #[test]
    fn test_normalize_base_url_trims_separator_and_whitespace() {
        assert_eq!(
            normalize_base_url(" https://models.corp.example/whisper/ ").as_deref(),
            Some("https://models.corp.example/whisper")
        );
        assert_eq!(
            normalize_base_url("https://models.corp.example//").as_deref(),
            Some("https://models.corp.example")
        );
        assert_eq!(normalize_base_url("   "), None);
        assert_eq!(normalize_base_url("/"), None);
    }

    #[test]
    fn test_custom_mirror_identity() {
        let mirror = CustomMirror::new("https://models.corp.example", client());
        assert_eq!(mirror.name(), "Custom");
        assert_eq!(mirror.priority(), 1);
        assert!(mirror.is_enabled());
        assert!(mirror.headers().is_none());
    }

    #[test]
    fn test_custom_mirror_download_url() {
        let mirror = CustomMirror::new("https://models.corp.example/whisper/", client());
        assert_eq!(mirror.base_url(), "https://models.corp.example/whisper");
        assert_eq!(
            mirror.download_url("ggml-base.en.bin"),
            "https://models.corp.example/whisper/ggml-base.en.bin"
        );
    }

    #[test]
    fn test_custom_mirror_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let mirror =
            CustomMirror::new("https://models.corp.example", client()).with_headers(headers);
        let sent = mirror.headers().unwrap();
        assert_eq!(sent.get(AUTHORIZATION).unwrap(), "Bearer abc");

        let empty = CustomMirror::new("https://models.corp.example", client())
            .with_headers(HeaderMap::new());
        assert!(empty.headers().is_none());
    }
}
