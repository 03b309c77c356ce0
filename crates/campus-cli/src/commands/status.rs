use campus_core::models::format_last_update;
use chrono::Local;
use serde::Serialize;

use crate::commands::common::AppContext;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StatusItem {
    database_update: String,
    programs: usize,
    db_path: String,
}

pub async fn run_status(as_json: bool, context: &AppContext) -> Result<(), CliError> {
    let catalog = context.open_catalog()?;
    let state = catalog.sync_state().await?;
    let programs = catalog.count_programs().await?;

    if as_json {
        let item = StatusItem {
            database_update: state.database_update.to_rfc3339(),
            programs,
            db_path: context.db_path.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("{}", format_last_update(state.database_update, &Local));
    println!("{programs} programs in {}", context.db_path.display());
    Ok(())
}
