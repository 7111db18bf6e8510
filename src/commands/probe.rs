//! Probe command handler: report which mirrors serve an artifact.

use anyhow::{Result, bail};
use modelfetch_core::{MirrorListing, ProbeOutcome};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::CommandContext;
use crate::cli::ProbeArgs;

#[derive(Debug, Serialize)]
struct ProbeRow<'a> {
    name: &'a str,
    priority: u32,
    available: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct FirstAvailable<'a> {
    mirror: &'a str,
    url: String,
}

pub async fn run_probe_command(
    ctx: &CommandContext,
    args: &ProbeArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let resolver = ctx.build_resolver(&args.mirror)?;

    if args.first {
        let Some(mirror) = resolver.find_first_available(&args.artifact, cancel).await? else {
            bail!(
                "No enabled mirror serves '{}'\n  Suggestion: Run `modelfetch probe {}` for per-mirror details",
                args.artifact,
                args.artifact
            );
        };
        let found = FirstAvailable {
            mirror: mirror.name(),
            url: mirror.download_url(&args.artifact),
        };
        if args.json {
            println!("{}", serde_json::to_string_pretty(&found)?);
        } else {
            println!("{}  {}", found.mirror, found.url);
        }
        return Ok(());
    }

    let report = resolver.probe_report(&args.artifact, cancel).await?;
    let rows = to_rows(&report);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{:>8}  {:<12}  {}", row.priority, row.name, row.detail);
        }
    }
    Ok(())
}

fn to_rows(report: &[(MirrorListing, ProbeOutcome)]) -> Vec<ProbeRow<'_>> {
    report
        .iter()
        .map(|(listing, outcome)| ProbeRow {
            name: &listing.name,
            priority: listing.priority,
            available: outcome.is_available(),
            detail: outcome.to_string(),
        })
        .collect()
}
