//! Data models for Campus

mod program;
mod sync_state;

pub use program::{Program, ProgramDoc, ProgramId};
pub use sync_state::{format_last_update, NewSyncRun, SyncRun, SyncRunStatus, SyncState};
