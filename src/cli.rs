use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "devstats")]
#[command(about = "Per-developer contribution statistics for git repositories")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, help = "Path to cache database")]
    pub cache: Option<PathBuf>,

    #[arg(long, help = "Include merge commits", default_value_t = true)]
    pub include_merges: bool,

    #[arg(long, help = "Include binary files", default_value_t = false)]
    pub binary: bool,

    #[arg(long, help = "Start from this commit or date (RFC3339, YYYY-MM-DD, or relative like '90d')")]
    pub since: Option<String>,

    #[arg(long, help = "End at this commit or date (RFC3339, YYYY-MM-DD, or relative like '90d')")]
    pub until: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    Report {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "Path to a JSON alias table mapping raw author names to canonical names")]
        aliases: Option<PathBuf>,

        #[arg(
            long = "alias",
            value_name = "RAW=CANONICAL",
            help = "Merge a raw author name into a canonical one (repeatable, applied after --aliases)"
        )]
        alias: Vec<String>,

        #[arg(long, help = "Warn and skip invalid commit records instead of failing the run")]
        skip_invalid: bool,
    },
    Export {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Report { json, ndjson, aliases, alias, skip_invalid } => {
                crate::stats::exec(self.common, json, ndjson, aliases, alias, skip_invalid)
            }
            Commands::Export { json, ndjson } => {
                crate::export::exec(self.common, json, ndjson)
            }
        }
    }
}
