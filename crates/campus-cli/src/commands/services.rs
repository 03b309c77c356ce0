use campus_core::remote::ServiceRegistry;

use crate::commands::common::AppContext;
use crate::error::CliError;

pub fn run_services(context: &AppContext) -> Result<(), CliError> {
    let registry = context.registry()?;
    if registry.is_empty() {
        return Err(CliError::NoServiceConfigured);
    }

    for line in format_service_lines(&registry) {
        println!("{line}");
    }
    Ok(())
}

/// One line per service, the default one marked with `*`
pub fn format_service_lines(registry: &ServiceRegistry) -> Vec<String> {
    let default = registry.default_name();
    registry
        .iter()
        .map(|service| {
            let marker = if Some(service.name()) == default { "*" } else { " " };
            format!("{marker} {:<12}  {}", service.name(), service.endpoint())
        })
        .collect()
}
