use campus_core::models::format_last_update;
use campus_core::services::SyncReport;
use chrono::Local;

use crate::commands::common::{resolve_service, AppContext};
use crate::error::CliError;

pub async fn run_sync(
    service_name: Option<&str>,
    as_json: bool,
    context: &AppContext,
) -> Result<(), CliError> {
    let registry = context.registry()?;
    let service = resolve_service(&registry, service_name)?;
    let catalog = context.open_catalog()?;

    let report = catalog.sync_now(service.name(), service).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_sync_report(&report) {
            println!("{line}");
        }
    }

    if report.outcome.is_failed() {
        return Err(CliError::SyncFailed(report.message()));
    }
    Ok(())
}

/// Stdout lines for a finished pass; a failure is reported once, on stderr
pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    if report.outcome.is_failed() {
        return Vec::new();
    }
    vec![
        report.message(),
        format_last_update(report.last_update, &Local),
    ]
}
