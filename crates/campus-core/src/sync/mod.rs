//! Catalog reconciliation.
//!
//! One pass walks the remote batch in order. A program missing locally is
//! created; a local program whose `updated_at` is strictly older than the
//! remote copy is replaced field by field in a single write. The newest
//! `updated_at` seen becomes the new sync watermark when it moves forward.
//!
//! There is no envelope around the whole batch: a failure stops the pass and
//! keeps the writes already applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{ProgramRepository, SyncStateRepository};
use crate::models::Program;
use crate::remote::FetchError;
use crate::util::epoch;

/// Result of one reconciliation pass as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The watermark moved forward
    Updated,
    /// Nothing newer than the watermark was seen
    AlreadyCurrent,
    /// The pass stopped early
    Failed(String),
}

impl SyncOutcome {
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Why a pass stopped
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote batch could not be read
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The local store rejected a read or write; `partial` counts the
    /// writes that landed before it
    #[error("{source}")]
    Write {
        source: crate::Error,
        partial: ReconcileSummary,
    },
}

impl SyncError {
    /// Description carried by `SyncOutcome::Failed`
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Work already applied when the pass stopped
    pub const fn partial(&self) -> Option<&ReconcileSummary> {
        match self {
            Self::Fetch(_) => None,
            Self::Write { partial, .. } => Some(partial),
        }
    }
}

/// What a completed pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub created: usize,
    pub overwritten: usize,
    pub unchanged: usize,
    /// Watermark before the pass
    pub previous: DateTime<Utc>,
    /// Newest `updated_at` seen, never below `previous`
    pub max_seen: DateTime<Utc>,
}

impl ReconcileSummary {
    pub const fn new(previous: DateTime<Utc>) -> Self {
        Self {
            created: 0,
            overwritten: 0,
            unchanged: 0,
            previous,
            max_seen: previous,
        }
    }

    pub fn outcome(&self) -> SyncOutcome {
        if self.max_seen > self.previous {
            SyncOutcome::Updated
        } else {
            SyncOutcome::AlreadyCurrent
        }
    }
}

/// Applies a remote batch to the local program store
pub struct Reconciler<'a, P, S> {
    programs: &'a P,
    state: &'a S,
}

impl<'a, P, S> Reconciler<'a, P, S>
where
    P: ProgramRepository,
    S: SyncStateRepository,
{
    pub const fn new(programs: &'a P, state: &'a S) -> Self {
        Self { programs, state }
    }

    /// Run a pass and fold any failure into `SyncOutcome::Failed`
    pub fn reconcile(&self, remote: &[Program]) -> SyncOutcome {
        match self.apply(remote) {
            Ok(summary) => summary.outcome(),
            Err(error) => {
                tracing::warn!("Reconciliation stopped: {error}");
                SyncOutcome::Failed(error.reason())
            }
        }
    }

    /// Run a pass, stopping at the first store failure
    pub fn apply(&self, remote: &[Program]) -> Result<ReconcileSummary, SyncError> {
        let previous = self
            .state
            .load()
            .map_err(|source| SyncError::Write {
                source,
                partial: ReconcileSummary::new(epoch()),
            })?
            .database_update;
        let mut summary = ReconcileSummary::new(previous);
        let stopped =
            |source: crate::Error, partial: ReconcileSummary| SyncError::Write { source, partial };

        for incoming in remote {
            let local = self
                .programs
                .get(incoming.id)
                .map_err(|error| stopped(error, summary))?;

            match local {
                None => {
                    self.programs
                        .create(incoming)
                        .map_err(|error| stopped(error, summary))?;
                    summary.created += 1;
                    tracing::debug!("Created program {}", incoming.id);
                }
                Some(local) if local.is_older_than(incoming) => {
                    self.programs
                        .overwrite(incoming)
                        .map_err(|error| stopped(error, summary))?;
                    summary.overwritten += 1;
                    tracing::debug!(
                        "Overwrote program {} ({} -> {})",
                        incoming.id,
                        local.updated_at,
                        incoming.updated_at
                    );
                }
                Some(_) => summary.unchanged += 1,
            }

            summary.max_seen = summary.max_seen.max(incoming.updated_at);
        }

        if summary.max_seen > previous {
            self.state
                .update(summary.max_seen)
                .map_err(|error| stopped(error, summary))?;
        }

        tracing::info!(
            created = summary.created,
            overwritten = summary.overwritten,
            unchanged = summary.unchanged,
            "Reconciled {} remote programs",
            remote.len()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, SqliteProgramRepository, SqliteSyncStateRepository};
    use crate::models::ProgramId;
    use crate::test_support::{day, sample_program};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn snapshot(db: &Database) -> Vec<Program> {
        SqliteProgramRepository::new(db.connection())
            .list(100, 0)
            .unwrap()
    }

    fn watermark(db: &Database) -> DateTime<Utc> {
        SqliteSyncStateRepository::new(db.connection())
            .load()
            .unwrap()
            .database_update
    }

    fn with_update(program: Program, updated_at: DateTime<Utc>) -> Program {
        Program {
            updated_at,
            ..program
        }
    }

    #[test]
    fn creates_missing_records_and_moves_watermark() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());
        let batch = vec![
            sample_program(1, "Informatique", 1),
            sample_program(2, "Mathématiques", 3),
            sample_program(3, "Chimie", 2),
        ];

        let summary = Reconciler::new(&programs, &state).apply(&batch).unwrap();

        assert_eq!(summary.created, 3);
        assert_eq!(summary.outcome(), SyncOutcome::Updated);
        for remote in &batch {
            assert_eq!(programs.get(remote.id).unwrap().as_ref(), Some(remote));
        }
        assert_eq!(programs.count().unwrap(), 3);
        assert_eq!(watermark(&db), batch[1].updated_at);
    }

    #[test]
    fn scenario_create_into_empty_store() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());
        state.update(day(2023, 1, 1)).unwrap();

        let remote = with_update(sample_program(1, "Informatique", 1), day(2023, 6, 1));
        let outcome = Reconciler::new(&programs, &state).reconcile(&[remote.clone()]);

        assert_eq!(outcome, SyncOutcome::Updated);
        assert_eq!(programs.get(ProgramId::new(1)).unwrap(), Some(remote));
        assert_eq!(watermark(&db), day(2023, 6, 1));
    }

    #[test]
    fn scenario_older_remote_leaves_local_untouched() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());

        let local = with_update(sample_program(1, "Informatique", 1), day(2023, 6, 1));
        programs.create(&local).unwrap();
        state.update(day(2023, 6, 1)).unwrap();

        let remote = Program {
            name: "Renamed".to_string(),
            ..with_update(local.clone(), day(2023, 5, 1))
        };
        let outcome = Reconciler::new(&programs, &state).reconcile(&[remote]);

        assert_eq!(outcome, SyncOutcome::AlreadyCurrent);
        assert_eq!(programs.get(local.id).unwrap(), Some(local));
        assert_eq!(watermark(&db), day(2023, 6, 1));
    }

    #[test]
    fn older_remote_still_advances_stale_watermark() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());

        let local = with_update(sample_program(1, "Informatique", 1), day(2023, 6, 1));
        programs.create(&local).unwrap();
        state.update(day(2023, 1, 1)).unwrap();

        let remote = with_update(local.clone(), day(2023, 5, 1));
        let summary = Reconciler::new(&programs, &state).apply(&[remote]).unwrap();

        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.outcome(), SyncOutcome::Updated);
        assert_eq!(programs.get(local.id).unwrap(), Some(local));
        assert_eq!(watermark(&db), day(2023, 5, 1));
    }

    #[test]
    fn newer_remote_replaces_every_field() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());
        programs.create(&sample_program(1, "Informatique", 1)).unwrap();

        let remote = Program {
            name: "Génie logiciel".to_string(),
            bacc: false,
            fees: None,
            document: Some("https://example.com/gl.pdf".to_string()),
            ..sample_program(1, "Informatique", 5)
        };
        let summary = Reconciler::new(&programs, &state)
            .apply(&[remote.clone()])
            .unwrap();

        assert_eq!(summary.overwritten, 1);
        assert_eq!(programs.get(remote.id).unwrap(), Some(remote));
    }

    #[test]
    fn identical_batch_writes_nothing() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());
        let batch = vec![
            sample_program(1, "Informatique", 1),
            sample_program(2, "Droit", 2),
        ];
        for program in &batch {
            programs.create(program).unwrap();
        }
        state.update(day(2023, 6, 2) + chrono::Duration::hours(8)).unwrap();

        let counting = CountingRepository::new(&programs);
        let summary = Reconciler::new(&counting, &state).apply(&batch).unwrap();

        assert_eq!(counting.writes.get(), 0);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.outcome(), SyncOutcome::AlreadyCurrent);
        assert_eq!(watermark(&db), batch[1].updated_at);
    }

    #[test]
    fn second_pass_is_idempotent() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());
        programs
            .create(&with_update(sample_program(2, "Droit", 1), day(2023, 1, 1)))
            .unwrap();
        let batch = vec![
            sample_program(1, "Informatique", 4),
            sample_program(2, "Droit", 2),
        ];

        let reconciler = Reconciler::new(&programs, &state);
        assert_eq!(reconciler.reconcile(&batch), SyncOutcome::Updated);
        let first_store = snapshot(&db);
        let first_watermark = watermark(&db);

        assert_eq!(reconciler.reconcile(&batch), SyncOutcome::AlreadyCurrent);
        assert_eq!(snapshot(&db), first_store);
        assert_eq!(watermark(&db), first_watermark);
    }

    #[test]
    fn duplicate_ids_in_batch_keep_newest() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());
        let older = sample_program(1, "Ancien", 1);
        let newer = sample_program(1, "Nouveau", 2);

        let summary = Reconciler::new(&programs, &state)
            .apply(&[older, newer.clone()])
            .unwrap();

        assert_eq!((summary.created, summary.overwritten), (1, 1));
        assert_eq!(programs.get(newer.id).unwrap(), Some(newer));
    }

    #[test]
    fn empty_batch_is_already_current() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());

        assert_eq!(
            Reconciler::new(&programs, &state).reconcile(&[]),
            SyncOutcome::AlreadyCurrent
        );
        assert_eq!(watermark(&db), crate::util::epoch());
    }

    #[test]
    fn write_failure_keeps_earlier_writes_and_watermark() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());
        state.update(day(2023, 1, 1)).unwrap();

        let failing = CountingRepository::failing_after(&programs, 1);
        let batch = vec![
            sample_program(1, "Informatique", 1),
            sample_program(2, "Droit", 2),
            sample_program(3, "Chimie", 3),
        ];
        let outcome = Reconciler::new(&failing, &state).reconcile(&batch);

        assert!(matches!(&outcome, SyncOutcome::Failed(reason) if reason.contains("disk full")));
        assert_eq!(programs.count().unwrap(), 1);
        assert!(programs.get(ProgramId::new(1)).unwrap().is_some());
        assert_eq!(watermark(&db), day(2023, 1, 1));
    }

    #[test]
    fn write_failure_reports_partial_counts() {
        let db = setup();
        let programs = SqliteProgramRepository::new(db.connection());
        let state = SqliteSyncStateRepository::new(db.connection());
        programs
            .create(&with_update(sample_program(1, "Informatique", 1), day(2023, 1, 1)))
            .unwrap();
        programs.create(&sample_program(2, "Droit", 2)).unwrap();

        let failing = CountingRepository::failing_after(&programs, 2);
        let batch = vec![
            sample_program(1, "Informatique", 1),
            sample_program(2, "Droit", 2),
            sample_program(3, "Chimie", 3),
            sample_program(4, "Physique", 4),
        ];
        let error = Reconciler::new(&failing, &state).apply(&batch).unwrap_err();

        let partial = error.partial().copied().unwrap();
        assert_eq!(
            (partial.created, partial.overwritten, partial.unchanged),
            (1, 1, 1)
        );
        assert_eq!(programs.count().unwrap(), 3);
        assert_eq!(watermark(&db), crate::util::epoch());
    }

    #[test]
    fn fetch_failure_has_no_partial_counts() {
        let error = SyncError::from(FetchError::Network("network error".to_string()));
        assert!(error.partial().is_none());
        assert_eq!(error.reason(), "network error");
    }

    /// Delegates to a real repository, counting writes and optionally
    /// rejecting them after a budget is spent.
    struct CountingRepository<'a, P> {
        inner: &'a P,
        writes: Cell<usize>,
        fail_after: Option<usize>,
    }

    impl<'a, P: ProgramRepository> CountingRepository<'a, P> {
        fn new(inner: &'a P) -> Self {
            Self {
                inner,
                writes: Cell::new(0),
                fail_after: None,
            }
        }

        fn failing_after(inner: &'a P, budget: usize) -> Self {
            Self {
                fail_after: Some(budget),
                ..Self::new(inner)
            }
        }

        fn spend(&self) -> crate::Result<()> {
            if self.fail_after.is_some_and(|budget| self.writes.get() >= budget) {
                return Err(crate::Error::Database("disk full".to_string()));
            }
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }
    }

    impl<P: ProgramRepository> ProgramRepository for CountingRepository<'_, P> {
        fn get(&self, id: ProgramId) -> crate::Result<Option<Program>> {
            self.inner.get(id)
        }

        fn create(&self, program: &Program) -> crate::Result<()> {
            self.spend()?;
            self.inner.create(program)
        }

        fn overwrite(&self, program: &Program) -> crate::Result<()> {
            self.spend()?;
            self.inner.overwrite(program)
        }

        fn list(&self, limit: usize, offset: usize) -> crate::Result<Vec<Program>> {
            self.inner.list(limit, offset)
        }

        fn list_by_domain(
            &self,
            domain: &str,
            limit: usize,
            offset: usize,
        ) -> crate::Result<Vec<Program>> {
            self.inner.list_by_domain(domain, limit, offset)
        }

        fn count(&self) -> crate::Result<usize> {
            self.inner.count()
        }
    }
}
