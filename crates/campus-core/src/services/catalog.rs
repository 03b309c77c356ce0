//! Shared catalog service wrapper used by client front ends.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::{
    Database, ProgramRepository, SqliteProgramRepository, SqliteSyncRunRepository,
    SqliteSyncStateRepository, SyncRunRepository, SyncStateRepository,
};
use crate::models::{NewSyncRun, Program, ProgramId, SyncRun, SyncRunStatus, SyncState};
use crate::remote::RemoteCatalog;
use crate::sync::{ReconcileSummary, Reconciler, SyncError, SyncOutcome};
use crate::{Error, Result};

/// Everything a presentation layer needs after a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub service: String,
    pub outcome: SyncOutcome,
    pub created: usize,
    pub overwritten: usize,
    pub unchanged: usize,
    /// Watermark after the pass
    pub last_update: DateTime<Utc>,
}

impl SyncReport {
    /// Single user-facing line describing the pass
    pub fn message(&self) -> String {
        match &self.outcome {
            SyncOutcome::Updated => "Update successful".to_string(),
            SyncOutcome::AlreadyCurrent => "Your database is already up to date".to_string(),
            SyncOutcome::Failed(reason) => format!("Update failed: {reason}"),
        }
    }
}

/// Clears the in-progress flag when a pass ends, whichever way it ends
struct SyncGuard {
    flag: Arc<AtomicBool>,
}

impl SyncGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Thread-safe service for catalog storage and sync passes.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<Mutex<Database>>,
    syncing: Arc<AtomicBool>,
}

impl CatalogService {
    /// Open the catalog database at the given filesystem path.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path)?;
        Ok(Self::from_database(db))
    }

    /// Open an in-memory catalog (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            syncing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a pass is outstanding
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Fetch the remote batch and reconcile it into the local store.
    ///
    /// Returns `Error::SyncInProgress` when another pass holds the store.
    /// Fetch and write failures are reported through the outcome; only
    /// failing to record the run itself is returned as an error.
    pub async fn sync_now<C>(&self, service: &str, catalog: &C) -> Result<SyncReport>
    where
        C: RemoteCatalog,
    {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            tracing::warn!("Sync requested while another pass is running");
            return Err(Error::SyncInProgress);
        };

        let started_at = Utc::now();
        tracing::info!("Syncing catalog from {service}");
        let fetched = catalog.get_all().await;

        let db = self.db.lock().await;
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());

        let result = fetched
            .map_err(SyncError::from)
            .and_then(|batch| Reconciler::new(&programs, &state).apply(&batch));

        let (outcome, summary) = match result {
            Ok(summary) => (summary.outcome(), Some(summary)),
            Err(error) => {
                tracing::warn!("Sync from {service} failed: {error}");
                (SyncOutcome::Failed(error.reason()), error.partial().copied())
            }
        };
        let (created, overwritten, unchanged) = summary
            .map_or((0, 0, 0), |summary: ReconcileSummary| {
                (summary.created, summary.overwritten, summary.unchanged)
            });

        SqliteSyncRunRepository::new(db.connection()).record(&NewSyncRun {
            service: service.to_string(),
            started_at,
            finished_at: Utc::now(),
            status: match &outcome {
                SyncOutcome::Updated => SyncRunStatus::Updated,
                SyncOutcome::AlreadyCurrent => SyncRunStatus::AlreadyCurrent,
                SyncOutcome::Failed(_) => SyncRunStatus::Failed,
            },
            created,
            overwritten,
            unchanged,
            reason: match &outcome {
                SyncOutcome::Failed(reason) => Some(reason.clone()),
                _ => None,
            },
        })?;

        let last_update = state.load()?.database_update;
        Ok(SyncReport {
            service: service.to_string(),
            outcome,
            created,
            overwritten,
            unchanged,
            last_update,
        })
    }

    /// Current sync watermark.
    pub async fn sync_state(&self) -> Result<SyncState> {
        let db = self.db.lock().await;
        SqliteSyncStateRepository::new(db.connection()).load()
    }

    /// List programs ordered by name.
    pub async fn list_programs(&self, limit: usize, offset: usize) -> Result<Vec<Program>> {
        let db = self.db.lock().await;
        SqliteProgramRepository::new(db.connection()).list(limit, offset)
    }

    /// List programs of one domain.
    pub async fn list_programs_by_domain(
        &self,
        domain: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Program>> {
        let db = self.db.lock().await;
        SqliteProgramRepository::new(db.connection()).list_by_domain(domain, limit, offset)
    }

    /// Fetch a program by id.
    pub async fn get_program(&self, id: ProgramId) -> Result<Option<Program>> {
        let db = self.db.lock().await;
        SqliteProgramRepository::new(db.connection()).get(id)
    }

    /// Number of stored programs.
    pub async fn count_programs(&self) -> Result<usize> {
        let db = self.db.lock().await;
        SqliteProgramRepository::new(db.connection()).count()
    }

    /// Recent sync runs, newest first.
    pub async fn list_runs(&self, limit: usize) -> Result<Vec<SyncRun>> {
        let db = self.db.lock().await;
        SqliteSyncRunRepository::new(db.connection()).list(limit)
    }
}
