pub mod common;
pub mod config;
pub mod history;
pub mod list;
pub mod services;
pub mod show;
pub mod status;
pub mod sync;
