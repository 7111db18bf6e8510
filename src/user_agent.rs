//! Shared User-Agent string for probe and download HTTP clients.
//!
//! Single source for the project URL and UA format so mirror probes and
//! artifact downloads identify themselves the same way to every host.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/modelfetch";

/// Default User-Agent for all mirror traffic (no per-mirror name in header).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("modelfetch/{version} (model-mirror-client; +{PROJECT_UA_URL})")
}
