//! SQLite database store implementation.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::*;
use crate::chart::ProbeRecord;
use crate::source::{ProbeSource, SourceError};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), DbError> {
        let conn = self.lock()?;
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // --- Monitors ---

    /// Register a monitor, replacing any existing one with the same ID.
    pub fn add_monitor(&self, monitor: &Monitor) -> Result<(), DbError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO monitors (id, name, url) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name=excluded.name, url=excluded.url",
            params![monitor.id, monitor.name, monitor.url],
        )?;
        Ok(())
    }

    /// Get a monitor by ID.
    pub fn get_monitor(&self, id: &str) -> Result<Option<Monitor>, DbError> {
        let conn = self.lock()?;
        let monitor = conn
            .query_row(
                "SELECT id, name, url FROM monitors WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Monitor {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        url: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(monitor)
    }

    // --- Probe Records ---

    /// Add probe records for a monitor in one transaction.
    pub fn add_probe_records(&self, monitor_id: &str, records: &[ProbeRecord]) -> Result<(), DbError> {
        if records.is_empty() {
            return Ok(());
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO probe_results (monitor_id, time, latency_ms, failed) VALUES (?1, ?2, ?3, ?4)",
            )?;

            for r in records {
                stmt.execute(params![
                    monitor_id,
                    r.timestamp.format(TIME_FORMAT).to_string(),
                    r.latency_ms,
                    r.failed,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get probe records for a monitor with `start <= time <= end`, oldest first.
    ///
    /// Rows may use any format `parse_db_time` reads, so SQL only narrows by
    /// calendar date (widened for UTC offsets) and the exact window is applied
    /// to parsed instants. Rows with an unreadable timestamp are skipped.
    pub fn get_probe_records(
        &self,
        monitor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProbeRecord>, DbError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT time, latency_ms, failed FROM probe_results
             WHERE monitor_id = ?1 AND time >= ?2 AND time < ?3 ORDER BY time ASC",
        )?;

        let first_day = (start - ChronoDuration::days(1)).format("%Y-%m-%d").to_string();
        let after_last_day = (end + ChronoDuration::days(2)).format("%Y-%m-%d").to_string();

        let rows = stmt.query_map(params![monitor_id, first_day, after_last_day], |row| {
            let time: String = row.get(0)?;
            let latency_ms: Option<f64> = row.get(1)?;
            let failed: bool = row.get(2)?;
            Ok((time, latency_ms, failed))
        })?;

        let mut records = Vec::new();
        let mut skipped = 0;
        for row in rows {
            let (time, latency_ms, failed) = row?;
            match parse_db_time(&time) {
                Some(timestamp) if timestamp >= start && timestamp <= end => records.push(ProbeRecord {
                    timestamp,
                    latency_ms,
                    failed,
                }),
                Some(_) => {}
                None => skipped += 1,
            }
        }
        records.sort_by_key(|r| r.timestamp);

        if skipped > 0 {
            tracing::warn!(
                "Store: Skipped {} probe rows with bad timestamps for {}",
                skipped,
                monitor_id
            );
        }

        Ok(records)
    }
}

impl ProbeSource for Store {
    fn fetch_probes(
        &self,
        monitor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProbeRecord>, SourceError> {
        if self.get_monitor(monitor_id)?.is_none() {
            return Err(SourceError::UnknownMonitor(monitor_id.to_string()));
        }
        Ok(self.get_probe_records(monitor_id, start, end)?)
    }
}

/// Parse a datetime string from the database.
fn parse_db_time(s: &str) -> Option<DateTime<Utc>> {
    let formats = [
        TIME_FORMAT,
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}
