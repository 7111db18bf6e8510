//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Fetch speech-model artifacts from the first mirror that has them.
///
/// Mirrors are tried in priority order; an override mirror can be supplied
/// with `--mirror-url` or the `MODELFETCH_MIRROR_URL` environment variable.
#[derive(Parser, Debug)]
#[command(name = "modelfetch")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download an artifact, falling back across mirrors
    Fetch(FetchArgs),
    /// Check which mirrors currently serve an artifact
    Probe(ProbeArgs),
    /// List configured mirrors in priority order
    Mirrors(MirrorsArgs),
}

/// Options shared by every command that builds the mirror set.
#[derive(Args, Debug, Clone, Default)]
pub struct MirrorArgs {
    /// Override mirror base URL (tried before every built-in mirror)
    #[arg(long, value_name = "URL")]
    pub mirror_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Artifact file name, e.g. ggml-base.bin
    pub artifact: String,

    /// Destination path (defaults to <output_dir>/<ARTIFACT>)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Download even if the destination already exists
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub mirror: MirrorArgs,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Artifact file name, e.g. ggml-base.bin
    pub artifact: String,

    /// Stop at the first available mirror
    #[arg(long)]
    pub first: bool,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub mirror: MirrorArgs,
}

#[derive(Args, Debug)]
pub struct MirrorsArgs {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub mirror: MirrorArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_fetch_parses_artifact_and_output() {
        let cli =
            Cli::try_parse_from(["modelfetch", "fetch", "ggml-base.bin", "-o", "/tmp/m.bin"])
                .unwrap();
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.artifact, "ggml-base.bin");
        assert_eq!(args.output, Some(PathBuf::from("/tmp/m.bin")));
        assert!(!args.force);
        assert!(args.mirror.mirror_url.is_none());
    }

    #[test]
    fn test_cli_mirror_url_flag() {
        let cli = Cli::try_parse_from([
            "modelfetch",
            "mirrors",
            "--mirror-url",
            "https://m.example",
            "--json",
        ])
        .unwrap();
        let Command::Mirrors(args) = cli.command else {
            panic!("expected mirrors");
        };
        assert!(args.json);
        assert_eq!(args.mirror.mirror_url.as_deref(), Some("https://m.example"));
    }

    #[test]
    fn test_cli_probe_first_flag() {
        let cli = Cli::try_parse_from(["modelfetch", "probe", "a.bin", "--first"]).unwrap();
        let Command::Probe(args) = cli.command else {
            panic!("expected probe");
        };
        assert!(args.first);
        assert!(!args.json);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let cli = Cli::try_parse_from(["modelfetch", "-v", "mirrors"]).unwrap();
        assert_eq!(cli.verbose, 1);

        let cli = Cli::try_parse_from(["modelfetch", "mirrors", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let cli = Cli::try_parse_from(["modelfetch", "-q", "mirrors"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Cli::try_parse_from(["modelfetch"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_fetch_requires_artifact() {
        let err = Cli::try_parse_from(["modelfetch", "fetch"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Cli::try_parse_from(["modelfetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Cli::try_parse_from(["modelfetch", "mirrors", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
