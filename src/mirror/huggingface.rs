//! HuggingFace mirror - the upstream model repository.
//!
//! Serves artifacts from the `resolve/main` endpoint of the model repository.
//! When a HuggingFace access token is configured it is sent as a bearer
//! token, which lifts anonymous rate limits.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{Mirror, ProbeClient, ProbeOutcome, join_artifact_url};

const NAME: &str = "HuggingFace";
const PRIORITY: u32 = 10;

/// Default base URL for model artifacts on HuggingFace.
pub const HUGGINGFACE_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Mirror backed by `huggingface.co`.
#[derive(Debug, Clone)]
pub struct HuggingFaceMirror {
    base_url: String,
    token: Option<String>,
    enabled: bool,
    client: ProbeClient,
}

impl HuggingFaceMirror {
    /// Creates the mirror with its default base URL.
    #[must_use]
    pub fn new(client: ProbeClient) -> Self {
        Self::with_base_url(HUGGINGFACE_BASE_URL, client)
    }

    /// Creates the mirror against a different base URL.
    #[must_use]
    pub fn with_base_url(base_url: &str, client: ProbeClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            enabled: true,
            client,
        }
    }

    /// Sets the access token sent as `Authorization: Bearer <token>`.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Enables or disables the mirror.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl Mirror for HuggingFaceMirror {
    fn name(&self) -> &'static str {
        NAME
    }

    fn priority(&self) -> u32 {
        PRIORITY
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn download_url(&self, artifact: &str) -> String {
        join_artifact_url(&self.base_url, artifact)
    }

    fn headers(&self) -> Option<HeaderMap> {
        let token = self.token.as_deref()?;
        match HeaderValue::from_str(&format!("Bearer {}", token.trim())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                let mut headers = HeaderMap::new();
                headers.insert(AUTHORIZATION, value);
                Some(headers)
            }
            Err(_) => {
                warn!(mirror = NAME, "access token is not a valid header value; ignoring it");
                None
            }
        }
    }

    #[tracing::instrument(skip(self, cancel), fields(mirror = NAME))]
    async fn probe_detailed(&self, artifact: &str, cancel: &CancellationToken) -> ProbeOutcome {
        self.client
            .head(&self.download_url(artifact), self.headers(), false, cancel)
            .await
    }
}
