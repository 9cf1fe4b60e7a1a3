use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub added_lines: u32,
    pub deleted_lines: u32,
    pub is_binary: bool,
}

/// One historical commit as produced by the commit source.
///
/// The timestamp keeps the author's recorded UTC offset; active days and
/// peak hours are derived from the author's local civil date and hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommit {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<FixedOffset>,
    pub files: Vec<FileChange>,
}

impl RawCommit {
    pub fn lines_added(&self) -> u64 {
        self.files.iter().map(|f| f.added_lines as u64).sum()
    }

    pub fn lines_deleted(&self) -> u64 {
        self.files.iter().map(|f| f.deleted_lines as u64).sum()
    }

    pub fn files_changed(&self) -> u64 {
        self.files.len() as u64
    }

    pub fn local_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn local_hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// Derived per-developer metrics, one per canonical identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionReport {
    pub author: String,
    pub commit_count: u64,
    pub commit_percentage: f64,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub net_lines: i64,
    pub code_churn: u64,
    pub impact_ratio: f64,
    pub avg_files_per_commit: f64,
    pub avg_lines_per_commit: f64,
    pub active_days: u64,
    pub avg_commits_per_active_day: f64,
    pub active_weeks: u64,
    pub peak_hour: u32,
    pub most_active_weekday: String,
    pub longest_streak: u64,
    pub current_streak: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTotals {
    pub commit_count: u64,
    pub developer_count: u64,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub net_lines: i64,
    pub code_churn: u64,
    pub active_days: u64,
}

/// Finalized output: reports in descending commit order plus project totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionSummary {
    pub developers: Vec<ContributionReport>,
    pub project: ProjectTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub since: Option<String>,
    pub until: Option<String>,
    pub project: ProjectTotals,
    pub developers: Vec<ContributionReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub since: Option<String>,
    pub until: Option<String>,
    pub entries: Vec<RawCommit>,
}

#[derive(Debug, Clone)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new() -> Self {
        Self { since: None, until: None }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        if let Some(since) = self.since {
            if timestamp < &since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if timestamp > &until {
                return false;
            }
        }
        true
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new()
    }
}
