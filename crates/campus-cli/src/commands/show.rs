use crate::commands::common::{format_program_detail, normalize_program_id, AppContext};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, context: &AppContext) -> Result<(), CliError> {
    let program_id = normalize_program_id(id)?;
    let catalog = context.open_catalog()?;
    let program = catalog
        .get_program(program_id)
        .await?
        .ok_or_else(|| CliError::ProgramNotFound(program_id.to_string()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&program)?);
    } else {
        for line in format_program_detail(&program) {
            println!("{line}");
        }
    }
    Ok(())
}
