use crate::error::{DevstatsError, Result};
use crate::model::{DateRange, FileChange, RawCommit, SCHEMA_VERSION};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use rusqlite::{params, Connection, ToSql};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// SQLite cache of raw commit records keyed by commit id.
///
/// Only raw commits are cached; computed statistics are derived fresh on
/// every run.
pub struct Cache {
    conn: Connection,
}

impl Cache {
    pub fn new<CP: AsRef<Path>, RP: AsRef<Path>>(cache_path: Option<CP>, repo_path: RP) -> Result<Self> {
        let cache_dir = match cache_path {
            Some(path) => path.as_ref().to_path_buf(),
            None => repo_path.as_ref().join(".devstats"),
        };
        std::fs::create_dir_all(&cache_dir)?;
        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS commits (
                id TEXT PRIMARY KEY,
                author_name TEXT NOT NULL,
                author_email TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                tz_offset_secs INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS files (
                commit_id TEXT NOT NULL,
                path TEXT NOT NULL,
                added_lines INTEGER NOT NULL,
                deleted_lines INTEGER NOT NULL,
                is_binary INTEGER NOT NULL,
                PRIMARY KEY (commit_id, path),
                FOREIGN KEY (commit_id) REFERENCES commits(id)
            );
            CREATE INDEX IF NOT EXISTS idx_commits_timestamp ON commits(timestamp);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(DevstatsError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    pub fn get_commits(&self, range: &DateRange) -> Result<Vec<RawCommit>> {
        let mut query = String::from(
            "SELECT c.id, c.author_name, c.author_email, c.timestamp, c.tz_offset_secs,
                    f.path, f.added_lines, f.deleted_lines, f.is_binary
             FROM commits c
             LEFT JOIN files f ON c.id = f.commit_id
             WHERE 1=1",
        );
        let mut to_bind: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(since) = &range.since {
            query.push_str(" AND c.timestamp >= ?");
            to_bind.push(Box::new(since.timestamp()));
        }
        if let Some(until) = &range.until {
            query.push_str(" AND c.timestamp <= ?");
            to_bind.push(Box::new(until.timestamp()));
        }
        query.push_str(" ORDER BY c.timestamp");

        let mut stmt = self.conn.prepare(&query)?;
        let bind_refs: Vec<&dyn ToSql> = to_bind.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(bind_refs.as_slice(), |row| {
            let id: String = row.get(0)?;
            let author_name: String = row.get(1)?;
            let author_email: String = row.get(2)?;
            let ts: i64 = row.get(3)?;
            let offset_secs: i32 = row.get(4)?;
            let path_opt: Option<String> = row.get(5)?;
            let added_opt: Option<u32> = row.get(6)?;
            let deleted_opt: Option<u32> = row.get(7)?;
            let is_binary_opt: Option<i64> = row.get(8)?;
            let file = match (path_opt, added_opt, deleted_opt, is_binary_opt) {
                (Some(path), Some(added), Some(deleted), Some(is_binary_int)) => Some(FileChange {
                    path,
                    added_lines: added,
                    deleted_lines: deleted,
                    is_binary: is_binary_int != 0,
                }),
                _ => None,
            };
            Ok((id, author_name, author_email, ts, offset_secs, file))
        })?;

        let mut commits_map: HashMap<String, RawCommit> = HashMap::new();
        for row in rows {
            let (id, author_name, author_email, ts, offset_secs, file) = row?;
            let commit = match commits_map.entry(id.clone()) {
                std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                std::collections::hash_map::Entry::Vacant(e) => {
                    let timestamp = cached_timestamp(ts, offset_secs)?;
                    e.insert(RawCommit {
                        id,
                        author_name,
                        author_email,
                        timestamp,
                        files: Vec::new(),
                    })
                }
            };
            if let Some(file) = file {
                commit.files.push(file);
            }
        }

        let mut result: Vec<RawCommit> = commits_map.into_values().collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(result)
    }

    pub fn store_commits(&mut self, commits: &[RawCommit]) -> Result<()> {
        let tx = self.conn.transaction()?;

        let mut insert_commit_stmt = tx.prepare(
            "INSERT OR REPLACE INTO commits (id, author_name, author_email, timestamp, tz_offset_secs)
             VALUES (?, ?, ?, ?, ?)",
        )?;
        let mut delete_files_stmt = tx.prepare("DELETE FROM files WHERE commit_id = ?")?;
        let mut insert_file_stmt = tx.prepare(
            "INSERT INTO files (commit_id, path, added_lines, deleted_lines, is_binary)
             VALUES (?, ?, ?, ?, ?)",
        )?;

        for commit in commits {
            insert_commit_stmt.execute(params![
                commit.id,
                commit.author_name,
                commit.author_email,
                commit.timestamp.timestamp(),
                commit.timestamp.offset().local_minus_utc(),
            ])?;

            delete_files_stmt.execute(params![commit.id])?;

            let mut seen_paths: HashSet<&String> = HashSet::new();
            for f in &commit.files {
                if seen_paths.insert(&f.path) {
                    insert_file_stmt.execute(params![
                        commit.id,
                        f.path,
                        f.added_lines,
                        f.deleted_lines,
                        if f.is_binary { 1 } else { 0 }
                    ])?;
                }
            }
        }

        drop(insert_commit_stmt);
        drop(delete_files_stmt);
        drop(insert_file_stmt);

        tx.commit()?;
        Ok(())
    }
}

fn cached_timestamp(secs: i64, offset_secs: i32) -> rusqlite::Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix());
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(&offset))
        .ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(3, "timestamp".to_string(), rusqlite::types::Type::Integer)
        })
}
