//! ModelScope model hub mirror.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{Mirror, ProbeClient, ProbeOutcome, join_artifact_url};

const NAME: &str = "ModelScope";
const PRIORITY: u32 = 20;

/// Default base URL for model artifacts on ModelScope.
pub const MODELSCOPE_BASE_URL: &str =
    "https://modelscope.cn/models/ggerganov/whisper.cpp/resolve/master";

/// Mirror backed by `modelscope.cn`.
#[derive(Debug, Clone)]
pub struct ModelScopeMirror {
    base_url: String,
    enabled: bool,
    client: ProbeClient,
}

impl ModelScopeMirror {
    /// Creates the mirror with its default base URL.
    #[must_use]
    pub fn new(client: ProbeClient) -> Self {
        Self::with_base_url(MODELSCOPE_BASE_URL, client)
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
impl Mirror for ModelScopeMirror {
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
