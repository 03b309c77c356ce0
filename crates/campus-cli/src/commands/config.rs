use std::path::Path;

use campus_core::config::{CatalogConfig, ServiceEndpoint};

use crate::cli::ConfigCommands;
use crate::commands::common::AppContext;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, context: &AppContext) -> Result<(), CliError> {
    match command {
        ConfigCommands::AddService { name, url, default } => {
            run_add_service(&context.config_path, &name, &url, default)
        }
        ConfigCommands::Show => {
            println!("# {}", context.config_path.display());
            println!("{}", serde_json::to_string_pretty(&context.config)?);
            Ok(())
        }
    }
}

/// Persist a service entry; environment overrides are not written back
pub fn run_add_service(
    config_path: &Path,
    name: &str,
    url: &str,
    make_default: bool,
) -> Result<(), CliError> {
    let mut config = CatalogConfig::load_from_path(config_path)?;
    config.upsert_service(ServiceEndpoint::new(name, url))?;

    let name = name.trim();
    if make_default || config.default_service.is_none() {
        config.default_service = Some(name.to_string());
    }
    config.save_to_path(config_path)?;

    println!("Service '{name}' saved to {}", config_path.display());
    Ok(())
}
