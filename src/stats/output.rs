use crate::cli::CommonArgs;
use crate::git::GitRepo;
use crate::model::{ContributionSummary, ReportOutput, SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use console::style;

pub fn output_json(summary: &ContributionSummary, repo: &GitRepo, common: &CommonArgs) -> Result<()> {
    let output = ReportOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: repo.path().to_string_lossy().to_string(),
        since: common.since.clone(),
        until: common.until.clone(),
        project: summary.project.clone(),
        developers: summary.developers.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn output_ndjson(summary: &ContributionSummary) -> Result<()> {
    for report in &summary.developers {
        println!("{}", serde_json::to_string(report)?);
    }
    Ok(())
}

pub fn output_table(summary: &ContributionSummary) -> Result<()> {
    if summary.developers.is_empty() {
        println!("No commits found");
        return Ok(());
    }

    println!("{}", style("Developer Contribution Analysis").bold());
    println!("{}", "═".repeat(60));

    for report in &summary.developers {
        println!("\n{} {}", style("Developer:").bold(), style(&report.author).cyan());
        println!("{}", "─".repeat(50));
        println!(
            "  Commits:            {} ({:.1}% of all commits)",
            style(report.commit_count).cyan(),
            report.commit_percentage
        );
        println!("  Files changed:      {}", report.files_changed);
        println!("  Lines added:        {}", style(report.lines_added).green());
        println!("  Lines deleted:      {}", style(report.lines_deleted).red());
        println!("  Net lines:          {}", report.net_lines);
        println!("  Code churn:         {} lines", report.code_churn);
        println!("  Impact ratio:       {:.2}", report.impact_ratio);
        println!("  Avg files/commit:   {:.1}", report.avg_files_per_commit);
        println!("  Avg lines/commit:   {:.1}", report.avg_lines_per_commit);
        println!("  Active days:        {}", report.active_days);
        println!("  Commits/active day: {:.1}", report.avg_commits_per_active_day);
        println!("  Active weeks:       {}", report.active_weeks);
        println!("  Peak hour:          {:02}:00", report.peak_hour);
        println!("  Most active day:    {}", report.most_active_weekday);
        println!("  Longest streak:     {} days", report.longest_streak);
        println!("  Current streak:     {} days", report.current_streak);
    }

    let project = &summary.project;
    println!("\n{}", style("Project Totals").bold());
    println!("{}", "─".repeat(50));
    println!("  Commits:            {}", style(project.commit_count).cyan());
    println!("  Developers:         {}", project.developer_count);
    println!("  Files changed:      {}", project.files_changed);
    println!("  Lines added:        {}", style(project.lines_added).green());
    println!("  Lines deleted:      {}", style(project.lines_deleted).red());
    println!("  Net lines:          {}", project.net_lines);
    println!("  Code churn:         {} lines", project.code_churn);
    println!("  Active days:        {}", project.active_days);

    Ok(())
}
