use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "locus")]
#[command(about = "Inspect location directories and location grant claims")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ~/.locus/config.toml)
    #[arg(short, long, global = true, env = "LOCUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides logging.level from the configuration)
    #[arg(long, global = true, env = "LOCUS_LOG")]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every location in the directory
    List(ListArgs),
    /// Show one location
    Show(ShowArgs),
    /// Decode a grant claim and check it against locations
    Check(CheckArgs),
    /// Build a grant claim from location ids
    Encode(EncodeArgs),
    /// Drop the cached directory
    Invalidate,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Bypass the cache and reload from the backend
    #[arg(long)]
    pub refresh: bool,
}

#[derive(clap::Args)]
pub struct ShowArgs {
    /// Location id
    pub id: u64,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Base64 grant claim value
    #[arg(long)]
    pub claim: String,
    /// Location ids to check (repeatable)
    #[arg(long = "id")]
    pub ids: Vec<u64>,
}

#[derive(clap::Args)]
pub struct EncodeArgs {
    /// Set the "all locations" bit
    #[arg(long)]
    pub all: bool,
    /// Granted location ids
    pub ids: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from(["locus", "check", "--claim", "Bg==", "--id", "1", "--id", "5"]);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.claim, "Bg==");
        assert_eq!(args.ids, vec![1, 5]);
    }

    #[test]
    fn test_parse_encode_with_global_flags() {
        let cli = Cli::parse_from(["locus", "encode", "--all", "3", "7", "-f", "table"]);
        assert!(matches!(cli.format, Some(OutputFormat::Table)));
        let Commands::Encode(args) = cli.command else {
            panic!("expected encode");
        };
        assert!(args.all);
        assert_eq!(args.ids, vec![3, 7]);
    }
}
