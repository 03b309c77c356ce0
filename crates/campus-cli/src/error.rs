use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] campus_core::Error),
    #[error(transparent)]
    Fetch(#[from] campus_core::remote::FetchError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Program ID must be a number: {0}")]
    InvalidProgramId(String),
    #[error("Program not found: {0}")]
    ProgramNotFound(String),
    #[error("Unknown service '{0}'. Run `campus services` to list configured services.")]
    UnknownService(String),
    #[error(
        "No catalog service is configured. Run `campus config add-service --name NAME --url URL` or set CAMPUS_SERVICE_URL."
    )]
    NoServiceConfigured,
    #[error("{0}")]
    SyncFailed(String),
}
