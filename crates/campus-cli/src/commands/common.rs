use std::path::PathBuf;

use campus_core::config::{default_config_path, CatalogConfig};
use campus_core::models::SyncRun;
use campus_core::remote::{HttpCatalogClient, ServiceRegistry};
use campus_core::services::CatalogService;
use campus_core::{Program, ProgramId};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CliError;

/// Resolved paths and configuration for one invocation
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: CatalogConfig,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
}

impl AppContext {
    /// Load the config file, apply environment overrides, then let explicit
    /// flags win over both
    pub fn load(
        config_path: Option<PathBuf>,
        db_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let config_path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let mut config = CatalogConfig::load_from_path(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;

        let db_path = match db_path {
            Some(path) => path,
            None => config.resolve_db_path()?,
        };

        Ok(Self {
            config,
            config_path,
            db_path,
        })
    }

    pub fn open_catalog(&self) -> Result<CatalogService, CliError> {
        Ok(CatalogService::open_path(&self.db_path)?)
    }

    pub fn registry(&self) -> Result<ServiceRegistry, CliError> {
        Ok(ServiceRegistry::from_config(&self.config)?)
    }
}

/// Pick the requested service, or the default one
pub fn resolve_service<'a>(
    registry: &'a ServiceRegistry,
    name: Option<&str>,
) -> Result<&'a HttpCatalogClient, CliError> {
    if registry.is_empty() {
        return Err(CliError::NoServiceConfigured);
    }

    let name = name.map(str::trim).filter(|name| !name.is_empty());
    registry.resolve(name).ok_or_else(|| {
        CliError::UnknownService(name.unwrap_or_default().to_string())
    })
}

#[derive(Debug, Serialize)]
pub struct ProgramListItem {
    pub id: i64,
    pub name: String,
    pub domain: String,
    pub location: String,
    pub bacc: bool,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct SyncRunItem {
    pub id: i64,
    pub service: String,
    pub started_at: String,
    pub finished_at: String,
    pub status: String,
    pub created: usize,
    pub overwritten: usize,
    pub unchanged: usize,
    pub reason: Option<String>,
}

pub fn normalize_program_id(raw: &str) -> Result<ProgramId, CliError> {
    raw.parse::<ProgramId>()
        .map_err(|_| CliError::InvalidProgramId(raw.trim().to_string()))
}

pub fn program_to_list_item(program: &Program) -> ProgramListItem {
    ProgramListItem {
        id: program.id.get(),
        name: program.name.clone(),
        domain: program.domain.clone(),
        location: program.location.clone(),
        bacc: program.bacc,
        updated_at: program.updated_at.to_rfc3339(),
    }
}

pub fn sync_run_to_item(run: &SyncRun) -> SyncRunItem {
    SyncRunItem {
        id: run.id,
        service: run.service.clone(),
        started_at: run.started_at.to_rfc3339(),
        finished_at: run.finished_at.to_rfc3339(),
        status: run.status.to_string(),
        created: run.created,
        overwritten: run.overwritten,
        unchanged: run.unchanged,
        reason: run.reason.clone(),
    }
}

pub fn format_program_lines(programs: &[Program]) -> Vec<String> {
    programs
        .iter()
        .map(|program| {
            let name = truncate(&program.name, 36);
            let domain = truncate(&program.domain, 18);
            format!(
                "{:>5}  {name:<36}  {domain:<18}  {}",
                program.id,
                truncate(&program.location, 24)
            )
        })
        .collect()
}

pub fn format_program_detail(program: &Program) -> Vec<String> {
    let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    vec![
        format!("{} (#{})", program.name, program.id),
        format!("Domain:          {}", program.domain),
        format!("Location:        {}", program.location),
        format!(
            "Baccalaureate:   {}",
            if program.bacc { "required" } else { "not required" }
        ),
        format!(
            "Enrollment:      {} - {}",
            optional(&program.inscription_open),
            optional(&program.inscription_closed)
        ),
        format!("Fees:            {}", optional(&program.fees)),
        format!(
            "Bank account:    {} ({})",
            optional(&program.bank_account),
            optional(&program.bank_account_owner)
        ),
        format!("Admission:       {}", optional(&program.admission)),
        format!("Document:        {}", optional(&program.document)),
        format!("Updated:         {}", format_sync_timestamp(program.updated_at)),
        String::new(),
        program.description.clone(),
    ]
}

pub fn format_sync_run_lines(runs: &[SyncRun]) -> Vec<String> {
    runs.iter()
        .map(|run| {
            let base = format!(
                "{}  {:<15}  {:<10}  +{} ~{} ={}",
                format_sync_timestamp(run.started_at),
                run.status,
                run.service,
                run.created,
                run.overwritten,
                run.unchanged
            );
            match &run.reason {
                Some(reason) => format!("{base}  {reason}"),
                None => base,
            }
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
