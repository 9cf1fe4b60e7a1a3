use crate::error::{DevstatsError, Result};
use crate::identity::IdentityResolver;
use crate::model::{ContributionReport, ContributionSummary, ProjectTotals, RawCommit};
use crate::stats::streak::compute_streaks;
use crate::util::{week_key, weekday_name};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashMap};

/// Running per-developer state, created lazily on the first commit seen
/// for a canonical identity.
#[derive(Debug, Clone, Default)]
pub struct DeveloperActivity {
    pub commits: u64,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub active_days: BTreeSet<NaiveDate>,
    pub hour_histogram: [u64; 24],
    pub weekday_histogram: [u64; 7],
}

impl DeveloperActivity {
    fn fold(&mut self, commit: &RawCommit) {
        self.commits += 1;
        self.files_changed += commit.files_changed();
        self.lines_added += commit.lines_added();
        self.lines_deleted += commit.lines_deleted();
        let date = commit.local_date();
        self.active_days.insert(date);
        self.hour_histogram[commit.local_hour() as usize] += 1;
        self.weekday_histogram[date.weekday().num_days_from_monday() as usize] += 1;
    }
}

/// Sequential fold over raw commits producing one report per canonical
/// developer plus project totals.
///
/// Two phases: ingest any number of commits in any order, then `finalize`
/// once. The percentage metrics need the project-wide commit total, which is
/// only known after the last ingest, so finalization is an explicit,
/// irreversible transition rather than a lazy recomputation. Calls after the
/// transition are contract violations and fail with their own error kinds.
pub struct ContributionAggregator {
    resolver: IdentityResolver,
    developers: HashMap<String, DeveloperActivity>,
    total_commits: u64,
    finalized: bool,
}

impl ContributionAggregator {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self {
            resolver,
            developers: HashMap::new(),
            total_commits: 0,
            finalized: false,
        }
    }

    pub fn total_commits(&self) -> u64 {
        self.total_commits
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Fold one commit into its developer's accumulator.
    ///
    /// Validation happens before any state is touched, so a rejected record
    /// leaves the aggregator exactly as it was.
    pub fn ingest(&mut self, commit: &RawCommit) -> Result<()> {
        if self.finalized {
            return Err(DevstatsError::IngestAfterFinalize);
        }
        if commit.author_name.trim().is_empty() {
            return Err(DevstatsError::InvalidCommit {
                id: commit.id.clone(),
                reason: "empty author identifier".to_string(),
            });
        }

        let author = self.resolver.resolve(&commit.author_name).to_string();
        self.developers.entry(author).or_default().fold(commit);
        self.total_commits += 1;
        Ok(())
    }

    /// Derive all reports and enter the terminal phase.
    ///
    /// `as_of` anchors the current-streak computation. Finalizing with zero
    /// ingested commits yields an empty report list and zero totals;
    /// finalizing after a source aborted mid-stream reports the partial state.
    pub fn finalize(&mut self, as_of: NaiveDate) -> Result<ContributionSummary> {
        if self.finalized {
            return Err(DevstatsError::FinalizeAfterFinalize);
        }
        self.finalized = true;

        let mut developers: Vec<ContributionReport> = self
            .developers
            .iter()
            .map(|(author, activity)| derive_report(author, activity, self.total_commits, as_of))
            .collect();
        developers.sort_by(|a, b| {
            b.commit_count
                .cmp(&a.commit_count)
                .then_with(|| a.author.cmp(&b.author))
        });

        Ok(ContributionSummary {
            developers,
            project: project_totals(&self.developers, self.total_commits),
        })
    }
}

fn derive_report(
    author: &str,
    activity: &DeveloperActivity,
    total_commits: u64,
    as_of: NaiveDate,
) -> ContributionReport {
    // An accumulator exists only after at least one ingest, so commits and
    // active_days are both >= 1 here.
    let commits = activity.commits;
    let code_churn = activity.lines_added + activity.lines_deleted;
    let net_lines = activity.lines_added as i64 - activity.lines_deleted as i64;
    let active_days = activity.active_days.len() as u64;
    let active_weeks = activity
        .active_days
        .iter()
        .map(week_key)
        .collect::<BTreeSet<String>>()
        .len() as u64;
    let (longest_streak, current_streak) = compute_streaks(&activity.active_days, as_of);

    ContributionReport {
        author: author.to_string(),
        commit_count: commits,
        commit_percentage: commits as f64 / total_commits as f64 * 100.0,
        files_changed: activity.files_changed,
        lines_added: activity.lines_added,
        lines_deleted: activity.lines_deleted,
        net_lines,
        code_churn,
        impact_ratio: if code_churn > 0 {
            net_lines as f64 / code_churn as f64
        } else {
            0.0
        },
        avg_files_per_commit: activity.files_changed as f64 / commits as f64,
        avg_lines_per_commit: code_churn as f64 / commits as f64,
        active_days,
        avg_commits_per_active_day: commits as f64 / active_days as f64,
        active_weeks,
        peak_hour: argmax(&activity.hour_histogram) as u32,
        most_active_weekday: weekday_name(argmax(&activity.weekday_histogram)).to_string(),
        longest_streak,
        current_streak,
    }
}

fn project_totals(developers: &HashMap<String, DeveloperActivity>, total_commits: u64) -> ProjectTotals {
    let mut files_changed = 0u64;
    let mut lines_added = 0u64;
    let mut lines_deleted = 0u64;
    let mut active_days: BTreeSet<NaiveDate> = BTreeSet::new();
    for activity in developers.values() {
        files_changed += activity.files_changed;
        lines_added += activity.lines_added;
        lines_deleted += activity.lines_deleted;
        active_days.extend(activity.active_days.iter().copied());
    }

    ProjectTotals {
        commit_count: total_commits,
        developer_count: developers.len() as u64,
        files_changed,
        lines_added,
        lines_deleted,
        net_lines: lines_added as i64 - lines_deleted as i64,
        code_churn: lines_added + lines_deleted,
        active_days: active_days.len() as u64,
    }
}

/// Index of the largest count; the smallest index wins ties.
fn argmax(histogram: &[u64]) -> usize {
    let mut best = 0;
    for (index, &count) in histogram.iter().enumerate() {
        if count > histogram[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileChange;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    fn commit(author: &str, timestamp: &str, files: &[(u32, u32)]) -> RawCommit {
        RawCommit {
            id: format!("{author}-{timestamp}"),
            author_name: author.to_string(),
            author_email: format!("{author}@example.com"),
            timestamp: DateTime::parse_from_rfc3339(timestamp).unwrap(),
            files: files
                .iter()
                .enumerate()
                .map(|(i, &(added, deleted))| FileChange {
                    path: format!("src/file_{i}.rs"),
                    added_lines: added,
                    deleted_lines: deleted,
                    is_binary: false,
                })
                .collect(),
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn three_commit_scenario() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        agg.ingest(&commit("alice", "2024-03-04T10:00:00+00:00", &[(30, 5), (20, 5)]))
            .unwrap();
        agg.ingest(&commit("bob", "2024-03-04T10:00:00+00:00", &[(20, 20)]))
            .unwrap();
        agg.ingest(&commit("alice", "2024-03-04T14:00:00+00:00", &[(5, 0)]))
            .unwrap();

        let summary = agg.finalize(as_of()).unwrap();
        assert_eq!(summary.project.commit_count, 3);
        assert_eq!(summary.developers.len(), 2);

        let alice = &summary.developers[0];
        assert_eq!(alice.author, "alice");
        assert_eq!(alice.commit_count, 2);
        assert_eq!(alice.files_changed, 3);
        assert_eq!(alice.lines_added, 55);
        assert_eq!(alice.lines_deleted, 10);
        assert_eq!(alice.net_lines, 45);
        assert_eq!(alice.code_churn, 65);
        assert_eq!(alice.active_days, 1);
        // one commit at 10 and one at 14: the tie breaks to the earlier hour
        assert_eq!(alice.peak_hour, 10);
        assert!((alice.commit_percentage - 200.0 / 3.0).abs() < 1e-9);
        assert!((alice.avg_files_per_commit - 1.5).abs() < 1e-9);
        assert!((alice.avg_lines_per_commit - 32.5).abs() < 1e-9);
        assert!((alice.avg_commits_per_active_day - 2.0).abs() < 1e-9);

        let bob = &summary.developers[1];
        assert_eq!(bob.author, "bob");
        assert_eq!(bob.commit_count, 1);
        assert_eq!(bob.files_changed, 1);
        assert_eq!(bob.net_lines, 0);
        assert_eq!(bob.code_churn, 40);
        assert_eq!(bob.impact_ratio, 0.0);
        assert!((bob.commit_percentage - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn commit_counts_and_percentages_add_up() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        for (author, hour) in [("a", 9), ("b", 9), ("b", 11), ("c", 12), ("c", 13), ("c", 15)] {
            agg.ingest(&commit(author, &format!("2024-03-04T{hour:02}:00:00+00:00"), &[(1, 0)]))
                .unwrap();
        }
        let summary = agg.finalize(as_of()).unwrap();

        let count_sum: u64 = summary.developers.iter().map(|r| r.commit_count).sum();
        assert_eq!(count_sum, summary.project.commit_count);

        let pct_sum: f64 = summary.developers.iter().map(|r| r.commit_percentage).sum();
        assert!((pct_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn aliases_merge_into_one_accumulator() {
        let mut resolver = IdentityResolver::new();
        resolver.insert_alias("agarcia", "Alice Garcia");
        resolver.insert_alias("alice.g", "Alice Garcia");

        let mut agg = ContributionAggregator::new(resolver);
        agg.ingest(&commit("agarcia", "2024-03-04T10:00:00+00:00", &[(10, 0)]))
            .unwrap();
        agg.ingest(&commit("alice.g", "2024-03-05T11:00:00+00:00", &[(0, 10)]))
            .unwrap();

        let summary = agg.finalize(as_of()).unwrap();
        assert_eq!(summary.developers.len(), 1);
        let merged = &summary.developers[0];
        assert_eq!(merged.author, "Alice Garcia");
        assert_eq!(merged.commit_count, 2);
        assert_eq!(merged.active_days, 2);
        assert_eq!(merged.net_lines, 0);
    }

    #[test]
    fn peak_hour_tie_reports_the_smaller_hour() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        agg.ingest(&commit("a", "2024-03-04T14:00:00+00:00", &[(1, 0)]))
            .unwrap();
        agg.ingest(&commit("a", "2024-03-05T09:00:00+00:00", &[(1, 0)]))
            .unwrap();
        let summary = agg.finalize(as_of()).unwrap();
        assert_eq!(summary.developers[0].peak_hour, 9);
    }

    #[test]
    fn zero_churn_reports_the_sentinel_ratio() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        // a pure rename touches a file without changing any lines
        agg.ingest(&commit("a", "2024-03-04T10:00:00+00:00", &[(0, 0)]))
            .unwrap();
        let summary = agg.finalize(as_of()).unwrap();
        let report = &summary.developers[0];
        assert_eq!(report.code_churn, 0);
        assert_eq!(report.impact_ratio, 0.0);
        assert_eq!(report.files_changed, 1);
    }

    #[test]
    fn empty_finalize_reports_nothing() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        let summary = agg.finalize(as_of()).unwrap();
        assert!(summary.developers.is_empty());
        assert_eq!(summary.project.commit_count, 0);
        assert_eq!(summary.project.developer_count, 0);
    }

    #[test]
    fn ingest_after_finalize_is_a_contract_violation() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        agg.finalize(as_of()).unwrap();
        let err = agg
            .ingest(&commit("a", "2024-03-04T10:00:00+00:00", &[(1, 0)]))
            .unwrap_err();
        assert!(matches!(err, DevstatsError::IngestAfterFinalize));
    }

    #[test]
    fn finalize_twice_is_a_contract_violation() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        agg.finalize(as_of()).unwrap();
        let err = agg.finalize(as_of()).unwrap_err();
        assert!(matches!(err, DevstatsError::FinalizeAfterFinalize));
    }

    #[test]
    fn empty_author_is_rejected_before_any_mutation() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        let err = agg
            .ingest(&commit("  ", "2024-03-04T10:00:00+00:00", &[(1, 0)]))
            .unwrap_err();
        assert!(matches!(err, DevstatsError::InvalidCommit { .. }));
        assert_eq!(agg.total_commits(), 0);

        let summary = agg.finalize(as_of()).unwrap();
        assert!(summary.developers.is_empty());
    }

    #[test]
    fn equal_commit_counts_order_by_name() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        agg.ingest(&commit("zed", "2024-03-04T10:00:00+00:00", &[(1, 0)]))
            .unwrap();
        agg.ingest(&commit("amy", "2024-03-04T11:00:00+00:00", &[(1, 0)]))
            .unwrap();
        let summary = agg.finalize(as_of()).unwrap();
        let order: Vec<&str> = summary.developers.iter().map(|r| r.author.as_str()).collect();
        assert_eq!(order, vec!["amy", "zed"]);
    }

    #[test]
    fn identical_sequences_produce_identical_reports() {
        let commits = vec![
            commit("a", "2024-03-04T10:00:00+00:00", &[(3, 1)]),
            commit("b", "2024-03-05T22:30:00+02:00", &[(7, 7), (0, 2)]),
            commit("a", "2024-03-06T01:15:00-05:00", &[(0, 4)]),
        ];

        let run = || {
            let mut agg = ContributionAggregator::new(IdentityResolver::new());
            for c in &commits {
                agg.ingest(c).unwrap();
            }
            serde_json::to_string(&agg.finalize(as_of()).unwrap()).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn local_offset_decides_the_active_day() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        // 23:30 on the 4th at +02:00 is the 4th locally, the 4th 21:30 UTC;
        // 23:30 on the 4th at -05:00 is still the 4th locally even though
        // it is the 5th in UTC.
        agg.ingest(&commit("a", "2024-03-04T23:30:00+02:00", &[(1, 0)]))
            .unwrap();
        agg.ingest(&commit("a", "2024-03-04T23:30:00-05:00", &[(1, 0)]))
            .unwrap();
        let summary = agg.finalize(as_of()).unwrap();
        assert_eq!(summary.developers[0].active_days, 1);
        assert_eq!(summary.developers[0].peak_hour, 23);
    }

    #[test]
    fn active_weeks_split_on_iso_years() {
        let mut agg = ContributionAggregator::new(IdentityResolver::new());
        // 2024-12-30 and 2025-01-02 share ISO week 2025-W01
        agg.ingest(&commit("a", "2024-12-30T10:00:00+00:00", &[(1, 0)]))
            .unwrap();
        agg.ingest(&commit("a", "2025-01-02T10:00:00+00:00", &[(1, 0)]))
            .unwrap();
        agg.ingest(&commit("a", "2025-01-08T10:00:00+00:00", &[(1, 0)]))
            .unwrap();
        let summary = agg.finalize(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()).unwrap();
        assert_eq!(summary.developers[0].active_weeks, 2);
    }
}
