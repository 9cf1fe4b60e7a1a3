use anyhow::Result;
use clap::Parser;
use devstats::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute()
}
