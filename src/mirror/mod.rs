//! Hosting sources ("mirrors") that can serve a copy of a model artifact.
//!
//! Every source implements the [`Mirror`] trait: identity, ordering
//! priority, enabled state, an existence probe, a URL builder and optional
//! extra request headers. The [`MirrorResolver`](crate::resolver::MirrorResolver)
//! only ever talks to this trait, so adding a source means adding one
//! implementation and one registration line.
//!
//! # Built-in sources
//!
//! - [`HuggingFaceMirror`] - upstream model repository (priority 10)
//! - [`HfMirror`] - community HuggingFace mirror (priority 15)
//! - [`ModelScopeMirror`] - ModelScope model hub (priority 20)
//! - [`GitHubMirror`] - GitHub release assets (priority 5 in CI, 25 otherwise)
//! - [`CustomMirror`] - operator-supplied override (always priority 1)

mod custom;
mod github;
mod hf_mirror;
mod huggingface;
mod modelscope;
mod probe;

pub use custom::{CUSTOM_MIRROR_NAME, CUSTOM_MIRROR_PRIORITY, CustomMirror, normalize_base_url};
pub use github::{GITHUB_BASE_URL, GITHUB_CI_PRIORITY, GITHUB_DEFAULT_PRIORITY, GitHubMirror};
pub use hf_mirror::{HF_MIRROR_BASE_URL, HfMirror};
pub use huggingface::{HUGGINGFACE_BASE_URL, HuggingFaceMirror};
pub use modelscope::{MODELSCOPE_BASE_URL, ModelScopeMirror};
pub use probe::{PROBE_TIMEOUT, ProbeClient};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Whether the process runs inside an automated CI runner.
///
/// Read once from the environment by
/// [`MirrorEnvironment`](crate::resolver::MirrorEnvironment) and passed to
/// mirrors that order themselves differently in CI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionContext {
    /// An automated CI runner.
    Ci,
    /// Local or interactive use.
    #[default]
    Interactive,
}

impl ExecutionContext {
    /// Derives the context from the raw value of a CI indicator variable.
    ///
    /// Present and non-empty means CI.
    #[must_use]
    pub fn from_indicator(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::Ci,
            _ => Self::Interactive,
        }
    }

    /// Returns true for [`ExecutionContext::Ci`].
    #[must_use]
    pub fn is_ci(self) -> bool {
        self == Self::Ci
    }
}

/// Why a probe did not report the artifact as available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// No response within the probe timeout.
    Timeout(Duration),
    /// DNS, TLS, connection or protocol error.
    Network(String),
    /// The server answered with a status that does not count as available.
    Status(u16),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Status(status) => write!(f, "HTTP {status}"),
        }
    }
}

/// Detailed result of one existence check.
///
/// The resolver only consumes [`ProbeOutcome::is_available`]; the remaining
/// detail is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The mirror answered with a status that counts as available.
    Available {
        /// HTTP status returned by the probe.
        status: u16,
    },
    /// The mirror could not confirm the artifact.
    Unavailable(ProbeFailure),
    /// The probe was aborted by the caller's cancellation token.
    Cancelled,
}

impl ProbeOutcome {
    /// Collapses the outcome to the boolean availability contract.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available { status } => write!(f, "available (HTTP {status})"),
            Self::Unavailable(failure) => write!(f, "unavailable ({failure})"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Name, priority and status of a configured mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorListing {
    /// Mirror name as registered.
    pub name: String,
    /// Ordering priority (lower is tried first).
    pub priority: u32,
    /// Whether the mirror participates in probing and downloads.
    pub enabled: bool,
}

impl MirrorListing {
    /// Captures the listing fields of a mirror.
    #[must_use]
    pub fn of(mirror: &dyn Mirror) -> Self {
        Self {
            name: mirror.name().to_string(),
            priority: mirror.priority(),
            enabled: mirror.is_enabled(),
        }
    }
}

/// Trait that every hosting source implements.
///
/// # Object Safety
///
/// This trait uses `async_trait` so the resolver can hold a heterogeneous
/// `Vec<Box<dyn Mirror>>`.
#[async_trait]
pub trait Mirror: Send + Sync {
    /// Short human-readable identifier, unique within a resolver.
    fn name(&self) -> &str;

    /// Ordering priority; lower values are tried earlier.
    fn priority(&self) -> u32;

    /// Disabled mirrors never appear in ordered or probed results.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Builds the fully qualified download URL for an artifact.
    ///
    /// The artifact identifier is opaque and appended as-is.
    fn download_url(&self, artifact: &str) -> String;

    /// Extra request headers (for example authentication) to send.
    fn headers(&self) -> Option<HeaderMap> {
        None
    }

    /// Issues a lightweight existence check and reports the detailed result.
    async fn probe_detailed(&self, artifact: &str, cancel: &CancellationToken) -> ProbeOutcome;

    /// Returns true when the artifact appears to be available.
    ///
    /// Every failure mode collapses to `false`; this never errors.
    async fn probe(&self, artifact: &str, cancel: &CancellationToken) -> bool {
        self.probe_detailed(artifact, cancel).await.is_available()
    }
}

impl fmt::Debug for dyn Mirror + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("name", &self.name())
            .field("priority", &self.priority())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Joins a normalized base URL and an opaque artifact identifier.
pub(crate) fn join_artifact_url(base_url: &str, artifact: &str) -> String {
    format!("{base_url}/{artifact}")
}
