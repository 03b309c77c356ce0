//! campus-core - Core library for Campus
//!
//! This crate contains the program models, the embedded `SQLite` catalog, the
//! remote catalog client and the reconciliation pass used by every Campus
//! front end.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod sync;
pub mod util;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use models::{Program, ProgramId, SyncState};
pub use sync::{Reconciler, SyncOutcome};
