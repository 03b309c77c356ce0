use crate::commands::common::{
    format_program_lines, program_to_list_item, AppContext, ProgramListItem,
};
use crate::error::CliError;

pub async fn run_list(
    limit: usize,
    domain: Option<&str>,
    as_json: bool,
    context: &AppContext,
) -> Result<(), CliError> {
    let catalog = context.open_catalog()?;
    let programs = match domain.map(str::trim).filter(|domain| !domain.is_empty()) {
        Some(domain) => catalog.list_programs_by_domain(domain, limit, 0).await?,
        None => catalog.list_programs(limit, 0).await?,
    };

    if as_json {
        let json_items = programs
            .iter()
            .map(program_to_list_item)
            .collect::<Vec<ProgramListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if programs.is_empty() {
        println!("No programs stored yet. Run `campus sync` first.");
        return Ok(());
    }

    for line in format_program_lines(&programs) {
        println!("{line}");
    }
    Ok(())
}
