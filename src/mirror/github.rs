//! GitHub release-asset mirror.
//!
//! Release downloads answer a HEAD request with a redirect to blob storage
//! rather than a direct 2xx, so this mirror probes without following
//! redirects and treats a 3xx as "available".
//!
//! GitHub is the most reliable source from inside GitHub-hosted CI runners
//! but is rate-limited for anonymous interactive use. Its priority is
//! therefore chosen once, at construction, from an [`ExecutionContext`].

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ExecutionContext, Mirror, ProbeClient, ProbeOutcome, join_artifact_url};

const NAME: &str = "GitHub";

/// Priority used inside CI runners.
pub const GITHUB_CI_PRIORITY: u32 = 5;

/// Priority used for local and interactive runs.
pub const GITHUB_DEFAULT_PRIORITY: u32 = 25;

/// Default base URL for model release assets.
pub const GITHUB_BASE_URL: &str =
    "https://github.com/ggerganov/whisper.cpp/releases/download/models";

/// Mirror backed by GitHub release assets.
#[derive(Debug, Clone)]
pub struct GitHubMirror {
    base_url: String,
    priority: u32,
    enabled: bool,
    client: ProbeClient,
}

impl GitHubMirror {
    /// Creates the mirror with its default base URL.
    #[must_use]
    pub fn new(context: ExecutionContext, client: ProbeClient) -> Self {
        Self::with_base_url(GITHUB_BASE_URL, context, client)
    }

    /// Creates the mirror against a different base URL.
    #[must_use]
    pub fn with_base_url(base_url: &str, context: ExecutionContext, client: ProbeClient) -> Self {
        let priority = if context.is_ci() {
            GITHUB_CI_PRIORITY
        } else {
            GITHUB_DEFAULT_PRIORITY
        };
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            priority,
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
impl Mirror for GitHubMirror {
    fn name(&self) -> &'static str {
        NAME
    }

    fn priority(&self) -> u32 {
        self.priority
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
            .head(&self.download_url(artifact), None, true, cancel)
            .await
    }
}
