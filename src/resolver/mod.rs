//! Mirror selection, probing and download-with-fallback.
//!
//! The resolver owns an immutable [`MirrorRegistry`] and answers three
//! questions about an artifact: which mirrors have it ([`MirrorResolver::probe_all`]),
//! which is the best one ([`MirrorResolver::find_first_available`]), and
//! "just get it" ([`MirrorResolver::download_with_fallback`]).
//!
//! # Example
//!
//! ```no_run
//! use modelfetch_core::resolver::{ResolverOptions, build_default_mirror_resolver};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = build_default_mirror_resolver(&ResolverOptions::default())?;
//! let cancel = CancellationToken::new();
//!
//! let fetched = resolver
//!     .download_with_fallback("ggml-base.bin", "models/ggml-base.bin".as_ref(), &cancel, None)
//!     .await?;
//! println!("Fetched {} bytes from {}", fetched.bytes, fetched.mirror.name());
//! # Ok(())
//! # }
//! ```

mod environment;
mod error;
mod fetch;
mod registry;

pub use environment::{
    CI_INDICATOR_ENV, HF_TOKEN_ENV, MirrorEnvironment, OVERRIDE_TOKEN_ENV, OVERRIDE_URL_ENV,
    select_override_url,
};
pub use error::{DownloadAttempt, FetchError};
pub use fetch::{FetchedArtifact, MirrorResolver, TEMP_SUFFIX, temp_download_path};
pub use registry::MirrorRegistry;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{info, warn};
use url::Url;

use crate::download::HttpDownloader;
use crate::http::HttpTimeouts;
use crate::mirror::{
    CustomMirror, GitHubMirror, HfMirror, HuggingFaceMirror, Mirror, ModelScopeMirror,
    ProbeClient,
};

/// Inputs for [`build_default_mirror_resolver`].
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Override base URL given explicitly (e.g. `--mirror-url`).
    ///
    /// Wins over [`MirrorEnvironment::override_url`].
    pub override_url: Option<String>,
    /// Environment snapshot.
    pub environment: MirrorEnvironment,
    /// Timeouts for the download client. Probes always use their own.
    pub timeouts: HttpTimeouts,
    /// Names of built-in mirrors to register as disabled, matched ignoring ASCII case.
    pub disabled_mirrors: Vec<String>,
}

impl ResolverOptions {
    fn is_disabled(&self, name: &str) -> bool {
        self.disabled_mirrors
            .iter()
            .any(|disabled| disabled.trim().eq_ignore_ascii_case(name))
    }
}

/// Builds the resolver with every built-in mirror registered.
///
/// When an override URL is configured, a [`CustomMirror`] is placed ahead of
/// the built-ins with priority 1.
///
/// # Errors
///
/// Returns [`FetchError::HttpClient`] if an HTTP client cannot be built.
pub fn build_default_mirror_resolver(
    options: &ResolverOptions,
) -> Result<MirrorResolver, FetchError> {
    let probe_client =
        ProbeClient::new(options.timeouts).map_err(|e| FetchError::http_client(&e))?;
    let downloader =
        HttpDownloader::new(options.timeouts).map_err(|e| FetchError::http_client(&e))?;
    let environment = &options.environment;

    let mut registry = MirrorRegistry::new();

    let huggingface = HuggingFaceMirror::new(probe_client.clone())
        .with_token(environment.huggingface_token.clone());
    let enabled = !options.is_disabled(huggingface.name());
    registry.register(Box::new(huggingface.with_enabled(enabled)));

    let hf_mirror = HfMirror::new(probe_client.clone());
    let enabled = !options.is_disabled(hf_mirror.name());
    registry.register(Box::new(hf_mirror.with_enabled(enabled)));

    let modelscope = ModelScopeMirror::new(probe_client.clone());
    let enabled = !options.is_disabled(modelscope.name());
    registry.register(Box::new(modelscope.with_enabled(enabled)));

    let github = GitHubMirror::new(environment.execution, probe_client.clone());
    let enabled = !options.is_disabled(github.name());
    registry.register(Box::new(github.with_enabled(enabled)));

    if let Some(base_url) = select_override_url(
        options.override_url.as_deref(),
        environment.override_url.as_deref(),
    ) {
        if let Err(error) = Url::parse(&base_url) {
            warn!(
                url = %base_url,
                error = %error,
                "Override mirror URL does not parse; downloads from it will fail"
            );
        }
        let mut custom = CustomMirror::new(&base_url, probe_client);
        if let Some(headers) = bearer_headers(environment.override_token.as_deref()) {
            custom = custom.with_headers(headers);
        }
        info!(url = %custom.base_url(), "Using override mirror");
        registry.register_first(Box::new(custom));
    }

    Ok(MirrorResolver::new(registry, Arc::new(downloader)))
}

fn bearer_headers(token: Option<&str>) -> Option<HeaderMap> {
    let token = token?;
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, value);
            Some(headers)
        }
        Err(_) => {
            warn!("Override mirror token is not a valid header value; sending no credentials");
            None
        }
    }
}
