//! Client configuration.
//!
//! A JSON file lists the remote catalog services and local options. Values
//! are normalized on load and save: trimmed, empties dropped, URLs checked.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

const CONFIG_FILE_NAME: &str = "config.json";
const DATABASE_FILE_NAME: &str = "campus.db";
const APP_DIR_NAME: &str = "campus";

/// Name of the service injected from `CAMPUS_SERVICE_URL`
pub const ENV_SERVICE_NAME: &str = "env";

/// One remote catalog endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceEndpoint {
    pub name: String,
    pub url: String,
}

impl ServiceEndpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Persistent client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub services: Vec<ServiceEndpoint>,
    #[serde(default)]
    pub default_service: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            services: Vec::new(),
            default_service: None,
            http_timeout_secs: None,
            db_path: None,
        }
    }
}

const fn default_config_version() -> u32 {
    1
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("failed to resolve config directory".to_string()))
}

/// Default location of the local catalog database
pub fn default_database_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(DATABASE_FILE_NAME))
        .ok_or_else(|| Error::Config("failed to resolve data directory".to_string()))
}

impl CatalogConfig {
    /// Load a config file; a missing file yields the default config
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!("failed to parse {}: {error}", path.display()))
        })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        normalized.validate()?;
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Apply `CAMPUS_SERVICE_URL` and `CAMPUS_DB_PATH` overrides
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = normalize_text_option(lookup("CAMPUS_SERVICE_URL")) {
            self.upsert_service(ServiceEndpoint::new(ENV_SERVICE_NAME, url))?;
            self.default_service = Some(ENV_SERVICE_NAME.to_string());
        }
        if let Some(path) = normalize_text_option(lookup("CAMPUS_DB_PATH")) {
            self.db_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Add a service or replace the URL of the one with the same name
    pub fn upsert_service(&mut self, service: ServiceEndpoint) -> Result<()> {
        let name = normalize_text_option(Some(service.name))
            .ok_or_else(|| Error::Config("service name must not be empty".to_string()))?;
        let url = normalize_service_url(&name, &service.url)?;

        if let Some(existing) = self.services.iter_mut().find(|entry| entry.name == name) {
            existing.url = url;
        } else {
            self.services.push(ServiceEndpoint { name, url });
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Database path from config, falling back to the platform data dir
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_database_path(),
        }
    }

    fn normalize(&mut self) {
        for service in &mut self.services {
            service.name = service.name.trim().to_string();
            service.url = service.url.trim().trim_end_matches('/').to_string();
        }
        self.default_service = normalize_text_option(self.default_service.take());
        self.db_path = self
            .db_path
            .take()
            .filter(|path| !path.as_os_str().is_empty());
    }

    fn validate(&self) -> Result<()> {
        let mut seen = Vec::with_capacity(self.services.len());
        for service in &self.services {
            if service.name.is_empty() {
                return Err(Error::Config("service name must not be empty".to_string()));
            }
            if seen.contains(&service.name.as_str()) {
                return Err(Error::Config(format!(
                    "service '{}' is defined more than once",
                    service.name
                )));
            }
            seen.push(service.name.as_str());
            normalize_service_url(&service.name, &service.url)?;
        }

        if let Some(default) = &self.default_service {
            if !seen.contains(&default.as_str()) {
                return Err(Error::Config(format!(
                    "default service '{default}' is not defined"
                )));
            }
        }
        Ok(())
    }
}

fn normalize_service_url(name: &str, raw: &str) -> Result<String> {
    let url = normalize_text_option(Some(raw.to_string()))
        .ok_or_else(|| Error::Config(format!("service '{name}' has an empty url")))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(format!(
            "service '{name}' url must include http:// or https://"
        )))
    }
}
