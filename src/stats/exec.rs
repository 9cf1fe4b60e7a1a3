use crate::cache::Cache;
use crate::cli::CommonArgs;
use crate::error::DevstatsError;
use crate::git::GitRepo;
use crate::identity::IdentityResolver;
use crate::stats::aggregate::ContributionAggregator;
use crate::stats::fetch::fetch_commits;
use crate::stats::output::{output_json, output_ndjson, output_table};
use anyhow::Context;
use chrono::Local;
use console::style;
use std::path::PathBuf;

pub fn exec(
    common: CommonArgs,
    json: bool,
    ndjson: bool,
    aliases: Option<PathBuf>,
    alias_pairs: Vec<String>,
    skip_invalid: bool,
) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let mut cache = Cache::new(common.cache.as_deref(), repo.path())
        .context("Failed to initialize cache")?;

    let range = repo
        .resolve_range(common.since.as_deref(), common.until.as_deref())
        .context("Failed to resolve date range")?;

    let commits = fetch_commits(&repo, &mut cache, &range, common.include_merges, common.binary)?;

    let mut resolver = match &aliases {
        Some(path) => IdentityResolver::from_json_file(path)
            .with_context(|| format!("Failed to load alias table from {}", path.display()))?,
        None => IdentityResolver::new(),
    };
    for pair in &alias_pairs {
        resolver.insert_pair(pair).context("Failed to parse --alias")?;
    }

    let mut aggregator = ContributionAggregator::new(resolver);
    for commit in &commits {
        match aggregator.ingest(commit) {
            Err(DevstatsError::InvalidCommit { id, reason }) if skip_invalid => {
                eprintln!(
                    "{} skipping commit {id}: {reason}",
                    style("warning:").yellow().bold()
                );
            }
            other => other.context("Failed to ingest commit")?,
        }
    }

    let summary = aggregator
        .finalize(Local::now().date_naive())
        .context("Failed to finalize contribution reports")?;

    if json {
        output_json(&summary, &repo, &common)?;
    } else if ndjson {
        output_ndjson(&summary)?;
    } else {
        output_table(&summary)?;
    }

    Ok(())
}
