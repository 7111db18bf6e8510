//! Environment inputs consumed when the default resolver is built.
//!
//! The process environment is read in exactly one place
//! ([`MirrorEnvironment::from_process_env`]); everything downstream receives
//! plain values, so tests construct environments from a map instead of
//! mutating process state.

use std::ffi::OsString;
use std::fmt;

use crate::mirror::{ExecutionContext, normalize_base_url};

/// Environment variable holding an override mirror base URL.
pub const OVERRIDE_URL_ENV: &str = "MODELFETCH_MIRROR_URL";

/// Environment variable holding a bearer token for the override mirror.
pub const OVERRIDE_TOKEN_ENV: &str = "MODELFETCH_MIRROR_TOKEN";

/// Environment variable whose non-empty presence marks a CI runner.
pub const CI_INDICATOR_ENV: &str = "GITHUB_ACTIONS";

/// Environment variable holding a HuggingFace access token.
pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

/// Snapshot of the environment values the mirror set depends on.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MirrorEnvironment {
    /// Override base URL, already normalized.
    pub override_url: Option<String>,
    /// Bearer token sent to the override mirror.
    pub override_token: Option<String>,
    /// CI or interactive execution.
    pub execution: ExecutionContext,
    /// Access token sent to HuggingFace.
    pub huggingface_token: Option<String>,
}

impl MirrorEnvironment {
    /// Reads the snapshot from the current process environment.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::from_lookup(|name| lossy_env_value(std::env::var_os(name)))
    }

    /// Builds the snapshot from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            override_url: lookup(OVERRIDE_URL_ENV).as_deref().and_then(normalize_base_url),
            override_token: non_empty(lookup(OVERRIDE_TOKEN_ENV)),
            execution: ExecutionContext::from_indicator(lookup(CI_INDICATOR_ENV).as_deref()),
            huggingface_token: non_empty(lookup(HF_TOKEN_ENV)),
        }
    }
}

// Tokens must never reach logs through `{:?}`.
impl fmt::Debug for MirrorEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorEnvironment")
            .field("override_url", &self.override_url)
            .field("override_token", &self.override_token.as_ref().map(|_| "<redacted>"))
            .field("execution", &self.execution)
            .field(
                "huggingface_token",
                &self.huggingface_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

// A set but non-UTF-8 variable still counts as present.
fn lossy_env_value(value: Option<OsString>) -> Option<String> {
    value.map(|v| v.to_string_lossy().into_owned())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Picks the override base URL: an explicit value wins over the environment.
///
/// Both candidates are normalized first, so an explicit value that is blank
/// falls through to the environment.
#[must_use]
pub fn select_override_url(explicit: Option<&str>, environment: Option<&str>) -> Option<String> {
    explicit
        .and_then(normalize_base_url)
        .or_else(|| environment.and_then(normalize_base_url))
}
