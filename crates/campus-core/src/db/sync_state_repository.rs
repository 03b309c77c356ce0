//! Sync watermark and run history repositories

#![allow(clippy::cast_possible_wrap)] // SQLite stores counts and LIMIT as i64

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{NewSyncRun, SyncRun, SyncRunStatus, SyncState};
use crate::util::timestamp_from_millis;

/// Trait for the single persisted sync watermark
pub trait SyncStateRepository {
    /// Load the current watermark
    fn load(&self) -> Result<SyncState>;

    /// Persist a new watermark
    fn update(&self, database_update: DateTime<Utc>) -> Result<()>;
}

/// `SQLite` implementation of `SyncStateRepository`
pub struct SqliteSyncStateRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSyncStateRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SyncStateRepository for SqliteSyncStateRepository<'_> {
    fn load(&self) -> Result<SyncState> {
        let millis: i64 = self.conn.query_row(
            "SELECT database_update FROM sync_state WHERE id = 1",
            [],
            |row| row.get(0),
        )?;

        let database_update = timestamp_from_millis(millis).ok_or_else(|| {
            Error::Database(format!("stored database_update {millis} is out of range"))
        })?;
        Ok(SyncState { database_update })
    }

    fn update(&self, database_update: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sync_state (id, database_update) VALUES (1, ?)
             ON CONFLICT(id) DO UPDATE SET database_update = excluded.database_update",
            params![database_update.timestamp_millis()],
        )?;
        Ok(())
    }
}

/// Trait for the sync run history
pub trait SyncRunRepository {
    /// Append a finished pass
    fn record(&self, run: &NewSyncRun) -> Result<SyncRun>;

    /// Recent passes, newest first
    fn list(&self, limit: usize) -> Result<Vec<SyncRun>>;
}

/// `SQLite` implementation of `SyncRunRepository`
pub struct SqliteSyncRunRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSyncRunRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncRun> {
        let time_at = |index: usize| -> rusqlite::Result<DateTime<Utc>> {
            let millis: i64 = row.get(index)?;
            timestamp_from_millis(millis)
                .ok_or(rusqlite::Error::IntegralValueOutOfRange(index, millis))
        };
        let count_at = |index: usize| -> rusqlite::Result<usize> {
            let value: i64 = row.get(index)?;
            usize::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(index, value))
        };

        let status: String = row.get(4)?;
        let status = SyncRunStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown sync run status '{status}'").into(),
            )
        })?;

        Ok(SyncRun {
            id: row.get(0)?,
            service: row.get(1)?,
            started_at: time_at(2)?,
            finished_at: time_at(3)?,
            status,
            created: count_at(5)?,
            overwritten: count_at(6)?,
            unchanged: count_at(7)?,
            reason: row.get(8)?,
        })
    }
}

impl SyncRunRepository for SqliteSyncRunRepository<'_> {
    fn record(&self, run: &NewSyncRun) -> Result<SyncRun> {
        self.conn.execute(
            "INSERT INTO sync_runs
                (service, started_at, finished_at, status, created, overwritten, unchanged, reason)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                run.service,
                run.started_at.timestamp_millis(),
                run.finished_at.timestamp_millis(),
                run.status.as_str(),
                run.created as i64,
                run.overwritten as i64,
                run.unchanged as i64,
                run.reason,
            ],
        )?;

        Ok(SyncRun {
            id: self.conn.last_insert_rowid(),
            service: run.service.clone(),
            started_at: run.started_at,
            finished_at: run.finished_at,
            status: run.status,
            created: run.created,
            overwritten: run.overwritten,
            unchanged: run.unchanged,
            reason: run.reason.clone(),
        })
    }

    fn list(&self, limit: usize) -> Result<Vec<SyncRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, service, started_at, finished_at, status, created, overwritten, unchanged, reason
             FROM sync_runs
             ORDER BY started_at DESC, id DESC
             LIMIT ?",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], Self::parse_run)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(runs)
    }
}
