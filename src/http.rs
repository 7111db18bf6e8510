//! Shared HTTP client construction policy.
//!
//! Mirror probes and artifact downloads build their `reqwest` clients here so
//! they stay consistent on user-agent, timeouts, compression and proxy
//! compatibility. Only the redirect policy differs between callers.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent;

/// Default connect timeout for every client (seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout between body chunks (seconds).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

/// Connect and read timeouts applied to mirror HTTP clients.
///
/// The probe request timeout is fixed separately (see
/// [`PROBE_TIMEOUT`](crate::mirror::PROBE_TIMEOUT)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Seconds allowed to establish a connection.
    pub connect_timeout_secs: u64,
    /// Seconds allowed between reads of a response body.
    pub read_timeout_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// How a client treats 3xx responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectHandling {
    /// Follow redirects (reqwest default policy).
    Follow,
    /// Return the 3xx response to the caller untouched.
    Report,
}

/// Builds a client using the shared project policy.
///
/// Some restricted CI/sandbox environments panic while reading system proxy
/// settings; in that case the build is retried with env-var proxies only.
///
/// # Errors
///
/// Returns the underlying `reqwest::Error` when the client cannot be built.
pub(crate) fn build_client(
    timeouts: HttpTimeouts,
    redirects: RedirectHandling,
) -> Result<Client, reqwest::Error> {
    match try_build_client(timeouts, redirects, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            warn!(
                "HTTP client builder panicked while loading system proxy settings; retrying with env-proxy fallback"
            );
            match try_build_client(timeouts, redirects, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Build(error)) => Err(error),
                // A second panic leaves no proxy-free option; build without any proxy.
                Err(BuildClientFailure::Panic) => base_builder(timeouts, redirects)
                    .no_proxy()
                    .build(),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(error),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    timeouts: HttpTimeouts,
    redirects: RedirectHandling,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts, redirects);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(timeouts: HttpTimeouts, redirects: RedirectHandling) -> ClientBuilder {
    let policy = match redirects {
        RedirectHandling::Follow => Policy::default(),
        RedirectHandling::Report => Policy::none(),
    };
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_timeout_secs))
        .read_timeout(Duration::from_secs(timeouts.read_timeout_secs))
        .redirect(policy)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
