use crate::error::{DevstatsError, Result};
use crate::model::{DateRange, FileChange, RawCommit};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use similar::{ChangeTag, TextDiff};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resolve_range(&self, since: Option<&str>, until: Option<&str>) -> Result<DateRange> {
        let mut range = DateRange::new();

        let since_dt = if let Some(s) = since {
            Some(self.parse_commit_or_date(s)?)
        } else {
            None
        };

        let until_dt = if let Some(u) = until {
            Some(self.parse_commit_or_date(u)?)
        } else {
            None
        };

        if let (Some(s), Some(u)) = (since_dt, until_dt) {
            if s > u {
                return Err(DevstatsError::InvalidDate(format!(
                    "Invalid range: since ({}) is after until ({})",
                    s, u
                )));
            }
        }

        if let Some(s) = since_dt {
            range = range.with_since(s);
        }
        if let Some(u) = until_dt {
            range = range.with_until(u);
        }

        Ok(range)
    }

    fn parse_commit_or_date(&self, input: &str) -> Result<DateTime<Utc>> {
        // RFC3339
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.with_timezone(&Utc));
        }

        // YYYY-MM-DD
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&datetime));
            }
        }

        // Relative duration (e.g. "90d", "2 weeks", "2 weeks ago")
        let normalized: String = input
            .trim()
            .trim_end_matches(" ago")
            .split_whitespace()
            .collect();
        if let Ok(duration) = humantime::parse_duration(&normalized) {
            let target = SystemTime::now()
                .checked_sub(duration)
                .ok_or_else(|| DevstatsError::InvalidDate(format!("Duration overflow for '{input}'")))?;
            return Ok(DateTime::<Utc>::from(target));
        }

        // Fallback to Git ref
        let id = self
            .repo
            .rev_parse_single(input)
            .map_err(|e| DevstatsError::Parse(format!("Invalid commit or date '{input}': {e}")))?;

        let commit = id
            .object()?
            .try_into_commit()
            .map_err(|_| DevstatsError::Parse(format!("Not a commit: {input}")))?;

        let secs = commit.time()?.seconds;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| DevstatsError::InvalidDate(format!("Invalid timestamp: {secs}")))
    }

    /// Walk history from `HEAD` and produce one validated record per commit
    /// inside `range`. Commits outside the range are skipped but their
    /// parents are still visited.
    pub fn collect_commits(
        &self,
        range: &DateRange,
        include_merges: bool,
        binary: bool,
    ) -> Result<Vec<RawCommit>> {
        let mut head = self.repo.head()?;
        let head_commit = head.peel_to_commit_in_place()?;

        let mut commits = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([head_commit.id]);

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Collecting commits...");

        while let Some(commit_id) = stack.pop_back() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let timestamp = commit_timestamp(commit.time()?)?;

            let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();

            if !range.contains(&timestamp.with_timezone(&Utc)) {
                for pid in parents {
                    stack.push_back(pid);
                }
                continue;
            }

            if !include_merges && parents.len() > 1 {
                for pid in parents {
                    stack.push_back(pid);
                }
                pb.inc(1);
                continue;
            }

            let author = commit.author()?;
            let author_name = author.name.to_string();
            let author_email = author.email.to_string();

            let files = if let Some(parent_id) = parents.first() {
                self.diff_files(commit_id, Some(*parent_id), binary)?
            } else {
                self.diff_files(commit_id, None, binary)?
            };

            commits.push(RawCommit {
                id: commit_id.to_string(),
                author_name,
                author_email,
                timestamp,
                files,
            });

            for pid in parents {
                stack.push_back(pid);
            }

            pb.inc(1);
        }

        pb.finish_with_message("Commits collected");
        Ok(commits)
    }

    fn diff_files(
        &self,
        commit_id: ObjectId,
        parent_id: Option<ObjectId>,
        binary: bool,
    ) -> Result<Vec<FileChange>> {
        let commit_tree = self.repo.find_commit(commit_id)?.tree()?;
        let parent_tree = match parent_id {
            Some(pid) => Some(self.repo.find_commit(pid)?.tree()?),
            None => None,
        };

        let changes: Vec<ChangeDetached> =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)?;

        let mut files = Vec::new();
        for change in changes {
            self.handle_change(change, binary, &mut files)?;
        }
        Ok(files)
    }

    fn handle_change(
        &self,
        change: ChangeDetached,
        binary: bool,
        files: &mut Vec<FileChange>,
    ) -> Result<()> {
        match change {
            ChangeDetached::Addition { id, location, .. } => {
                if let Ok(obj) = self.repo.find_object(id) {
                    let is_binary = self.is_binary_object(&obj);
                    if binary || !is_binary {
                        let lines = if is_binary { 0 } else { self.count_lines(&obj) };
                        files.push(FileChange {
                            path: location.to_string(),
                            added_lines: lines,
                            deleted_lines: 0,
                            is_binary,
                        });
                    }
                }
            }
            ChangeDetached::Deletion { id, location, .. } => {
                if let Ok(obj) = self.repo.find_object(id) {
                    let is_binary = self.is_binary_object(&obj);
                    if binary || !is_binary {
                        let lines = if is_binary { 0 } else { self.count_lines(&obj) };
                        files.push(FileChange {
                            path: location.to_string(),
                            added_lines: 0,
                            deleted_lines: lines,
                            is_binary,
                        });
                    }
                }
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                location,
                ..
            } => {
                if let (Ok(old_obj), Ok(new_obj)) =
                    (self.repo.find_object(previous_id), self.repo.find_object(id))
                {
                    let is_binary = self.is_binary_object(&old_obj) || self.is_binary_object(&new_obj);
                    if binary || !is_binary {
                        let (added, deleted) = if is_binary {
                            (0, 0)
                        } else {
                            self.compute_line_diff(&old_obj, &new_obj)
                        };
                        files.push(FileChange {
                            path: location.to_string(),
                            added_lines: added,
                            deleted_lines: deleted,
                            is_binary,
                        });
                    }
                }
            }
            ChangeDetached::Rewrite {
                source_id,
                id,
                source_location,
                location,
                copy,
                ..
            } => {
                if let (Ok(old_obj), Ok(new_obj)) =
                    (self.repo.find_object(source_id), self.repo.find_object(id))
                {
                    let is_binary = self.is_binary_object(&old_obj) || self.is_binary_object(&new_obj);
                    if binary || !is_binary {
                        let (added, deleted) = if is_binary {
                            (0, 0)
                        } else {
                            self.compute_line_diff(&old_obj, &new_obj)
                        };

                        files.push(FileChange {
                            path: source_location.to_string(),
                            added_lines: 0,
                            deleted_lines: if copy { 0 } else { deleted },
                            is_binary,
                        });

                        files.push(FileChange {
                            path: location.to_string(),
                            added_lines: if copy { added } else { 0 },
                            deleted_lines: 0,
                            is_binary,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn is_binary_object(&self, object: &gix::Object) -> bool {
        object.data.as_slice().iter().take(8192).any(|&b| b == 0)
    }

    fn count_lines(&self, object: &gix::Object) -> u32 {
        std::str::from_utf8(object.data.as_slice())
            .map(|t| t.lines().count() as u32)
            .unwrap_or(0)
    }

    fn compute_line_diff(&self, old_object: &gix::Object, new_object: &gix::Object) -> (u32, u32) {
        let old_text = std::str::from_utf8(old_object.data.as_slice()).unwrap_or("");
        let new_text = std::str::from_utf8(new_object.data.as_slice()).unwrap_or("");

        let diff = TextDiff::from_lines(old_text, new_text);
        let mut added = 0u32;
        let mut deleted = 0u32;
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => added += 1,
                ChangeTag::Delete => deleted += 1,
                ChangeTag::Equal => {}
            }
        }
        (added, deleted)
    }
}

fn commit_timestamp(time: gix::date::Time) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset).unwrap_or_else(|| Utc.fix());
    DateTime::<Utc>::from_timestamp(time.seconds, 0)
        .map(|dt| dt.with_timezone(&offset))
        .ok_or_else(|| DevstatsError::InvalidDate(format!("Invalid timestamp: {}", time.seconds)))
}
