//! Community HuggingFace mirror (`hf-mirror.com`).
//!
//! Same layout as the upstream repository; reachable from networks where
//! `huggingface.co` is blocked or throttled.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{Mirror, ProbeClient, ProbeOutcome, join_artifact_url};

const NAME: &str = "HF-Mirror";
const PRIORITY: u32 = 15;

/// Default base URL for model artifacts on the HuggingFace mirror.
pub const HF_MIRROR_BASE_URL: &str = "https://hf-mirror.com/ggerganov/whisper.cpp/resolve/main";

/// Mirror backed by `hf-mirror.com`.
#[derive(Debug, Clone)]
pub struct HfMirror {
    base_url: String,
    enabled: bool,
    client: ProbeClient,
}

impl HfMirror {
    /// Creates the mirror with its default base URL.
    #[must_use]
    pub fn new(client: ProbeClient) -> Self {
        Self::with_base_url(HF_MIRROR_BASE_URL, client)
    }

    /// Creates the mirror against a different base URL.
    #[must_use]
    pub fn with_base_url(base_url: &str, client: ProbeClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            enabled: true,
            client,
        }
    }

    /// Enables or disables the mirror.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl Mirror for HfMirror {
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

    #[tracing::instrument(skip(self, cancel), fields(mirror = NAME))]
    async fn probe_detailed(&self, artifact: &str, cancel: &CancellationToken) -> ProbeOutcome {
        self.client
            .head(&self.download_url(artifact), None, false, cancel)
            .await
    }
}
