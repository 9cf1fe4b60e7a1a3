use crate::cache::Cache;
use crate::git::GitRepo;
use crate::model::{DateRange, RawCommit};
use anyhow::Context;
use std::collections::HashSet;

/// Commits for `range`, served from the cache where possible and collected
/// from the repository otherwise. Newly collected commits are stored back.
pub fn fetch_commits(
    repo: &GitRepo,
    cache: &mut Cache,
    range: &DateRange,
    include_merges: bool,
    binary: bool,
) -> anyhow::Result<Vec<RawCommit>> {
    let mut cached = cache
        .get_commits(range)
        .context("Failed to get cached commits")?;

    let collected = repo
        .collect_commits(range, include_merges, binary)
        .context("Failed to collect commits from repository")?;

    let existing_ids: HashSet<&str> = cached.iter().map(|c| c.id.as_str()).collect();
    let missing: Vec<RawCommit> = collected
        .into_iter()
        .filter(|c| !existing_ids.contains(c.id.as_str()))
        .collect();

    if !missing.is_empty() {
        cache
            .store_commits(&missing)
            .context("Failed to store commits in cache")?;
        cached.extend(missing);
    }

    Ok(cached)
}
