//! Durable record of every item ever seen, keyed by identifier.
//!
//! One SQLite table. Insertion is create-if-absent; `delivered` is the only column
//! that changes after insert, and only from false to true.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::types::{CandidateItem, CuratedItem};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("history database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("history database I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("history connection lock poisoned")]
    Poisoned,
    #[error("history record `{identifier}` has unreadable {field}: {value}")]
    Decode {
        identifier: String,
        field: &'static str,
        value: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable record per identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub identifier: String,
    pub title: String,
    pub source_name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub delivered: bool,
}

impl HistoryRecord {
    /// Fresh, undelivered record for a candidate first seen at `now`.
    pub fn from_candidate(c: &CandidateItem, now: DateTime<Utc>) -> Self {
        Self {
            identifier: c.identifier.clone(),
            title: c.title.clone(),
            source_name: c.source_name.clone(),
            category: c.category.clone(),
            gloss: None,
            score: None,
            published_at: c.published_at,
            created_at: now,
            delivered: false,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_gloss(mut self, curated: &CuratedItem) -> Self {
        self.score = Some(curated.scored.relevance_score);
        if !curated.gloss.is_empty() {
            self.gloss = Some(curated.gloss.clone());
        }
        self
    }
}

/// SQLite-backed history store. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore").finish_non_exhaustive()
    }
}

impl HistoryStore {
    /// Open (or create) the store. `":memory:"` gives a private in-memory database.
    pub fn open(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = db_path.as_ref();
        let conn = if path.to_str() == Some(":memory:") {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(path)?
        };

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_table()?;
        tracing::debug!(target: "history", path = %path.display(), "history store opened");
        Ok(store)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::open(":memory:")
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn create_table(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS seen_items (
                identifier    TEXT PRIMARY KEY,
                title         TEXT NOT NULL,
                source_name   TEXT NOT NULL,
                category      TEXT NOT NULL,
                gloss         TEXT,
                score         REAL,
                published_at  TEXT,
                created_at    TEXT NOT NULL,
                delivered     INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_seen_items_created_at ON seen_items(created_at);
            "#,
        )?;
        Ok(())
    }

    /// True iff a record exists for `identifier`, delivered or not.
    pub fn has_seen(&self, identifier: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let hit: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM seen_items WHERE identifier = ?1",
                [identifier],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// Insert if absent. Returns whether a new row was written; an existing
    /// record is never overwritten.
    pub fn record_seen(&self, record: &HistoryRecord) -> StoreResult<bool> {
        let conn = self.lock()?;
        let n = conn.execute(
            r#"
            INSERT OR IGNORE INTO seen_items (
                identifier, title, source_name, category, gloss,
                score, published_at, created_at, delivered
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
            "#,
            params![
                record.identifier,
                record.title,
                record.source_name,
                record.category,
                record.gloss,
                record.score.map(f64::from),
                record.published_at.map(fmt_ts),
                fmt_ts(record.created_at),
            ],
        )?;
        Ok(n == 1)
    }

    /// Bulk insert-if-absent in one transaction. Returns the number of new rows.
    pub fn record_seen_all(&self, records: &[HistoryRecord]) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO seen_items (
                    identifier, title, source_name, category, gloss,
                    score, published_at, created_at, delivered
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
                "#,
            )?;
            for r in records {
                inserted += stmt.execute(params![
                    r.identifier,
                    r.title,
                    r.source_name,
                    r.category,
                    r.gloss,
                    r.score.map(f64::from),
                    r.published_at.map(fmt_ts),
                    fmt_ts(r.created_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Set delivered=true for each known identifier. Unknown identifiers are
    /// ignored. Returns how many rows flipped from false to true.
    pub fn mark_delivered(&self, identifiers: &[String]) -> StoreResult<usize> {
        if identifiers.is_empty() {
            return Ok(0);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut flipped = 0usize;
        {
            let mut stmt = tx.prepare(
                "UPDATE seen_items SET delivered = 1 WHERE identifier = ?1 AND delivered = 0",
            )?;
            for id in identifiers {
                flipped += stmt.execute([id])?;
            }
        }
        tx.commit()?;
        Ok(flipped)
    }

    /// Records created within the trailing `window_hours`, newest first.
    pub fn recent_records(&self, window_hours: u32) -> StoreResult<Vec<HistoryRecord>> {
        self.recent_records_at(Utc::now(), window_hours)
    }

    /// Same as [`recent_records`](Self::recent_records) with an explicit clock.
    pub fn recent_records_at(
        &self,
        now: DateTime<Utc>,
        window_hours: u32,
    ) -> StoreResult<Vec<HistoryRecord>> {
        let since = now - ChronoDuration::hours(i64::from(window_hours));
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT identifier, title, source_name, category, gloss,
                   score, published_at, created_at, delivered
            FROM seen_items
            WHERE created_at >= ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([fmt_ts(since)], RawRow::from_row)?;

        let mut out = Vec::new();
        for raw in rows {
            out.push(raw?.decode()?);
        }
        Ok(out)
    }

    /// Single record lookup.
    pub fn get(&self, identifier: &str) -> StoreResult<Option<HistoryRecord>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                r#"
                SELECT identifier, title, source_name, category, gloss,
                       score, published_at, created_at, delivered
                FROM seen_items
                WHERE identifier = ?1
                "#,
                [identifier],
                RawRow::from_row,
            )
            .optional()?;
        raw.map(RawRow::decode).transpose()
    }

    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM seen_items", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }
}

// Fixed-width UTC timestamps so lexical order in SQLite equals time order.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

struct RawRow {
    identifier: String,
    title: String,
    source_name: String,
    category: String,
    gloss: Option<String>,
    score: Option<f64>,
    published_at: Option<String>,
    created_at: String,
    delivered: i64,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            identifier: row.get(0)?,
            title: row.get(1)?,
            source_name: row.get(2)?,
            category: row.get(3)?,
            gloss: row.get(4)?,
            score: row.get(5)?,
            published_at: row.get(6)?,
            created_at: row.get(7)?,
            delivered: row.get(8)?,
        })
    }

    fn decode(self) -> StoreResult<HistoryRecord> {
        let created_at = parse_ts(&self.identifier, "created_at", &self.created_at)?;
        let published_at = self
            .published_at
            .as_deref()
            .map(|s| parse_ts(&self.identifier, "published_at", s))
            .transpose()?;
        Ok(HistoryRecord {
            identifier: self.identifier,
            title: self.title,
            source_name: self.source_name,
            category: self.category,
            gloss: self.gloss,
            score: self.score.map(|s| s as f32),
            published_at,
            created_at,
            delivered: self.delivered != 0,
        })
    }
}

fn parse_ts(identifier: &str, field: &'static str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Decode {
            identifier: identifier.to_string(),
            field,
            value: value.to_string(),
        })
}
