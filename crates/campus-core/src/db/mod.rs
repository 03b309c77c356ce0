//! Database layer for Campus

mod connection;
mod migrations;
mod program_repository;
mod sync_state_repository;

pub use connection::Database;
pub use program_repository::{ProgramRepository, SqliteProgramRepository};
pub use sync_state_repository::{
    SqliteSyncRunRepository, SqliteSyncStateRepository, SyncRunRepository, SyncStateRepository,
};
