//! CLI command handlers.

mod fetch;
mod mirrors;
mod probe;

pub use fetch::run_fetch_command;
pub use mirrors::run_mirrors_command;
pub use probe::run_probe_command;

use anyhow::{Context, Result};
use modelfetch_core::http::HttpTimeouts;
use modelfetch_core::mirror::normalize_base_url;
use modelfetch_core::{
    MirrorEnvironment, MirrorResolver, ResolverOptions, build_default_mirror_resolver,
};

use crate::app_config::FileConfig;
use crate::cli::MirrorArgs;

/// Inputs every command needs to build the mirror set.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: FileConfig,
    pub environment: MirrorEnvironment,
    pub quiet: bool,
}

impl CommandContext {
    /// Builds the resolver for one command invocation.
    ///
    /// Override precedence: `--mirror-url`, then the environment, then the
    /// config file.
    pub fn build_resolver(&self, mirror: &MirrorArgs) -> Result<MirrorResolver> {
        let options = resolver_options(&self.config, &self.environment, mirror);
        build_default_mirror_resolver(&options).context("Failed to set up mirrors")
    }
}

fn resolver_options(
    config: &FileConfig,
    environment: &MirrorEnvironment,
    mirror: &MirrorArgs,
) -> ResolverOptions {
    let mut environment = environment.clone();
    if environment.override_url.is_none() {
        environment.override_url = config.mirror_url.as_deref().and_then(normalize_base_url);
    }

    let defaults = HttpTimeouts::default();
    ResolverOptions {
        override_url: mirror.mirror_url.clone(),
        environment,
        timeouts: HttpTimeouts {
            connect_timeout_secs: config
                .connect_timeout_secs
                .unwrap_or(defaults.connect_timeout_secs),
            read_timeout_secs: config.read_timeout_secs.unwrap_or(defaults.read_timeout_secs),
        },
        disabled_mirrors: config.disabled_mirrors.clone(),
    }
}
