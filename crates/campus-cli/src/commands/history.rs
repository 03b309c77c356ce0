use crate::commands::common::{format_sync_run_lines, sync_run_to_item, AppContext, SyncRunItem};
use crate::error::CliError;

pub async fn run_history(limit: usize, as_json: bool, context: &AppContext) -> Result<(), CliError> {
    let runs = context.open_catalog()?.list_runs(limit).await?;

    if as_json {
        let json_items = runs.iter().map(sync_run_to_item).collect::<Vec<SyncRunItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No sync runs recorded.");
        return Ok(());
    }

    for line in format_sync_run_lines(&runs) {
        println!("{line}");
    }
    Ok(())
}
