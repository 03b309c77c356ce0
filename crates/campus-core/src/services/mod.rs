//! Service layer shared by Campus front ends

mod catalog;

pub use catalog::{CatalogService, SyncReport};
