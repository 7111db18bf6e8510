//! Fetch command handler: download an artifact with mirror fallback.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::CommandContext;
use crate::cli::FetchArgs;

pub async fn run_fetch_command(
    ctx: &CommandContext,
    args: &FetchArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let destination = destination_path(args, ctx.config.output_dir.as_deref());
    if destination.exists() && !args.force {
        info!(
            path = %destination.display(),
            "Destination exists, skipping (use --force to re-download)"
        );
        return Ok(());
    }

    let resolver = ctx.build_resolver(&args.mirror)?;

    let bar = progress_bar(should_use_progress_bar(
        io::stderr().is_terminal(),
        ctx.quiet,
        is_dumb_terminal(),
    ));
    let tracker = AttemptProgress::new(bar.clone());
    let report = |percent: u8| tracker.report(percent);

    let result = resolver
        .download_with_fallback(&args.artifact, &destination, cancel, Some(&report))
        .await;
    bar.finish_and_clear();
    let fetched = result?;

    if !ctx.quiet {
        println!(
            "Fetched {} ({} bytes) from {} <{}>",
            fetched.path.display(),
            fetched.bytes,
            fetched.mirror.name(),
            fetched.url
        );
    }
    Ok(())
}

fn destination_path(args: &FetchArgs, output_dir: Option<&Path>) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        output_dir
            .unwrap_or_else(|| Path::new("."))
            .join(&args.artifact)
    })
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Drives the bar across fallback attempts.
///
/// Each attempt reports from 0 again, so a drop in percentage marks a new
/// mirror and the bar is reset instead of jumping backwards.
struct AttemptProgress {
    bar: ProgressBar,
    last: AtomicU8,
}

impl AttemptProgress {
    fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            last: AtomicU8::new(0),
        }
    }

    fn report(&self, percent: u8) {
        let previous = self.last.swap(percent, Ordering::Relaxed);
        if percent < previous {
            self.bar.reset();
            self.bar.set_message("retrying on next mirror");
        }
        self.bar.set_position(u64::from(percent));
    }
}

fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

fn should_use_progress_bar(stderr_is_terminal: bool, quiet: bool, dumb_terminal: bool) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}
