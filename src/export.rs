use crate::cache::Cache;
use crate::cli::CommonArgs;
use crate::git::GitRepo;
use crate::model::{ExportOutput, RawCommit, SCHEMA_VERSION};
use crate::stats::fetch_commits;
use anyhow::Context;
use chrono::Utc;
use std::collections::HashSet;

pub fn exec(common: CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.repo.as_ref())
        .context("Failed to open git repository")?;
    let mut cache = Cache::new(common.cache.as_deref(), repo.path())
        .context("Failed to initialize cache")?;

    let range = repo
        .resolve_range(common.since.as_deref(), common.until.as_deref())
        .context("Failed to resolve date range")?;

    let mut entries = fetch_commits(&repo, &mut cache, &range, common.include_merges, common.binary)?;

    // Export what the repository recorded: no identity resolution here.
    entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    if json {
        output_json(&entries, &repo, &common)?;
    } else if ndjson {
        output_ndjson(&entries)?;
    } else {
        output_summary(&entries)?;
    }

    Ok(())
}

fn output_json(entries: &[RawCommit], repo: &GitRepo, common: &CommonArgs) -> anyhow::Result<()> {
    let output = ExportOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: repo.path().to_string_lossy().to_string(),
        since: common.since.clone(),
        until: common.until.clone(),
        entries: entries.to_vec(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_ndjson(entries: &[RawCommit]) -> anyhow::Result<()> {
    for entry in entries {
        println!("{}", serde_json::to_string(entry)?);
    }
    Ok(())
}

fn output_summary(entries: &[RawCommit]) -> anyhow::Result<()> {
    use console::style;

    println!("{}", style("Export Summary").bold());
    println!("{}", "─".repeat(50));

    let total_commits = entries.len();
    let total_files: usize = entries.iter().map(|e| e.files.len()).sum();
    let total_added: u64 = entries.iter().map(|e| e.lines_added()).sum();
    let total_deleted: u64 = entries.iter().map(|e| e.lines_deleted()).sum();

    let unique_authors: HashSet<_> = entries.iter().map(|e| &e.author_name).collect();

    println!("Total commits: {}", style(total_commits).cyan());
    println!("Total files changed: {}", style(total_files).cyan());
    println!("Total lines added: {}", style(total_added).green());
    println!("Total lines deleted: {}", style(total_deleted).red());
    println!("Unique authors: {}", style(unique_authors.len()).yellow());

    if !entries.is_empty() {
        let first_commit = &entries[0];
        let last_commit = &entries[entries.len() - 1];
        println!(
            "Date range: {} to {}",
            style(first_commit.timestamp.format("%Y-%m-%d")).dim(),
            style(last_commit.timestamp.format("%Y-%m-%d")).dim()
        );
    }

    println!("\nUse --json or --ndjson flags to export the raw data.");
    Ok(())
}
