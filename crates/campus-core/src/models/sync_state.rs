//! Sync watermark and run history models

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::util::epoch;

/// Most recent remote `updated_at` absorbed into the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub database_update: DateTime<Utc>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            database_update: epoch(),
        }
    }
}

/// Render the watermark the way the info screen shows it:
/// `Last update: D/M/YYYY, HH:MM` in the given time zone.
pub fn format_last_update<Tz>(database_update: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let local = database_update.with_timezone(tz);
    format!("Last update: {}", local.format("%-d/%-m/%Y, %H:%M"))
}

/// Terminal state of one reconciliation pass, as persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Updated,
    AlreadyCurrent,
    Failed,
}

impl SyncRunStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::AlreadyCurrent => "already_current",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "updated" => Some(Self::Updated),
            "already_current" => Some(Self::AlreadyCurrent),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A pass to be written to the run history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncRun {
    pub service: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: SyncRunStatus,
    pub created: usize,
    pub overwritten: usize,
    pub unchanged: usize,
    pub reason: Option<String>,
}

/// A recorded pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRun {
    pub id: i64,
    pub service: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: SyncRunStatus,
    pub created: usize,
    pub overwritten: usize,
    pub unchanged: usize,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_epoch() {
        assert_eq!(SyncState::default().database_update.timestamp(), 0);
    }

    #[test]
    fn test_format_last_update() {
        let ts = Utc.with_ymd_and_hms(2023, 6, 1, 9, 5, 0).unwrap();
        assert_eq!(format_last_update(ts, &Utc), "Last update: 1/6/2023, 09:05");
    }

    #[test]
    fn test_format_last_update_applies_time_zone() {
        let ts = Utc.with_ymd_and_hms(2023, 6, 1, 23, 30, 0).unwrap();
        let plus_three = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(
            format_last_update(ts, &plus_three),
            "Last update: 2/6/2023, 02:30"
        );
    }

    #[test]
    fn test_run_status_round_trip() {
        for status in [
            SyncRunStatus::Updated,
            SyncRunStatus::AlreadyCurrent,
            SyncRunStatus::Failed,
        ] {
            assert_eq!(SyncRunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SyncRunStatus::parse("pending"), None);
    }
}
