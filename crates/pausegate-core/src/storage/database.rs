//! SQLite-based stats storage.
//!
//! Provides persistent storage for:
//! - Attempt and return counters fed by stats signals
//! - A log of closed sessions

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, DatabaseError};
use crate::events::StatsSignal;
use crate::guard::SessionMode;
use crate::session::SessionSummary;

use super::data_dir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub mode: String,
    pub outcome: String,
    pub required_seconds: u32,
    pub did_complete_action: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub attempts: u64,
    pub returns: u64,
}

impl Stats {
    /// Share of attempts that ended in a return, 0.0 when nothing was recorded.
    pub fn return_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.returns as f64 / self.attempts as f64
    }
}

/// SQLite database for stats counters and the session log.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/pausegate/pausegate.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("pausegate.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS stats (
                key   TEXT PRIMARY KEY,
                value INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS session_log (
                id                  TEXT PRIMARY KEY,
                mode                TEXT NOT NULL,
                outcome             TEXT NOT NULL,
                required_seconds    INTEGER NOT NULL,
                did_complete_action INTEGER NOT NULL,
                opened_at           TEXT NOT NULL,
                closed_at           TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_session_log_closed_at ON session_log(closed_at);",
        )?;
        Ok(())
    }

    fn counter_key(signal: StatsSignal) -> &'static str {
        match signal {
            StatsSignal::Attempt => "attempts",
            StatsSignal::Return => "returns",
        }
    }

    /// Increment the counter a signal maps to.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub fn apply_signal(&self, signal: StatsSignal) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO stats (key, value) VALUES (?1, 1)
             ON CONFLICT(key) DO UPDATE SET value = value + 1",
            params![Self::counter_key(signal)],
        )?;
        Ok(())
    }

    fn counter(&self, key: &str) -> Result<u64, rusqlite::Error> {
        let result = self
            .conn
            .query_row("SELECT value FROM stats WHERE key = ?1", params![key], |row| {
                row.get::<_, u64>(0)
            });
        match result {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub fn stats(&self) -> Result<Stats, DatabaseError> {
        Ok(Stats {
            attempts: self.counter(Self::counter_key(StatsSignal::Attempt))?,
            returns: self.counter(Self::counter_key(StatsSignal::Return))?,
        })
    }

    /// Zero the counters. The session log is kept.
    pub fn reset_stats(&self) -> Result<(), DatabaseError> {
        self.conn.execute("DELETE FROM stats", [])?;
        Ok(())
    }

    /// Record a closed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn log_session(&self, summary: &SessionSummary) -> Result<(), DatabaseError> {
        let mode = match summary.mode {
            SessionMode::Intercepted => "intercepted",
            SessionMode::SelfInitiated => "self_initiated",
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO session_log
                (id, mode, outcome, required_seconds, did_complete_action, opened_at, closed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                summary.id.to_string(),
                mode,
                summary.reason.as_str(),
                summary.required_seconds,
                summary.did_complete_action,
                summary.opened_at.to_rfc3339(),
                summary.closed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recently closed sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, outcome, required_seconds, did_complete_action, opened_at, closed_at
             FROM session_log
             ORDER BY closed_at DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, mode, outcome, required_seconds, did_complete_action, opened, closed) = row?;
            records.push(SessionRecord {
                id,
                mode,
                outcome,
                required_seconds,
                did_complete_action,
                opened_at: parse_timestamp(&opened)?,
                closed_at: parse_timestamp(&closed)?,
            });
        }
        Ok(records)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}")))
}
