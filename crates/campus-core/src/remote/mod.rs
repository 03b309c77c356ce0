//! Remote catalog service clients.
//!
//! The catalog exposes a single bulk `GET` that returns every program. It is
//! treated as an atomic snapshot; there is no paging.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::{CatalogConfig, ServiceEndpoint};
use crate::models::{Program, ProgramDoc};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Failure to obtain the remote batch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid catalog service configuration: {0}")]
    InvalidConfiguration(String),
    #[error("{0}")]
    Network(String),
    #[error("Catalog service error: {0}")]
    Status(String),
    #[error("Invalid catalog payload: {0}")]
    InvalidPayload(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// A source of the complete program list
#[allow(async_fn_in_trait)]
pub trait RemoteCatalog {
    /// Fetch every program currently published
    async fn get_all(&self) -> FetchResult<Vec<Program>>;
}

/// HTTP/JSON catalog client
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> FetchResult<Self> {
        let endpoint = normalize_endpoint(endpoint.into())?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|error| FetchError::InvalidConfiguration(error.to_string()))?;

        Ok(Self {
            name: name.into(),
            endpoint,
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RemoteCatalog for HttpCatalogClient {
    async fn get_all(&self) -> FetchResult<Vec<Program>> {
        tracing::debug!("Fetching catalog from {} ({})", self.name, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| FetchError::Network(compact_text(&error.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| FetchError::Network(compact_text(&error.to_string())))?;

        if !status.is_success() {
            return Err(FetchError::Status(parse_api_error(status, &body)));
        }

        parse_catalog_payload(&body)
    }
}

/// Parse a catalog response body into programs.
///
/// Accepts a bare JSON array of documents or `{ "data": [...] }`. Errors
/// name the offending document by its position in the batch.
pub fn parse_catalog_payload(body: &str) -> FetchResult<Vec<Program>> {
    let payload = serde_json::from_str::<Value>(body)
        .map_err(|error| FetchError::InvalidPayload(error.to_string()))?;
    let docs = match payload {
        Value::Array(docs) => docs,
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(docs)) => docs,
            _ => {
                return Err(FetchError::InvalidPayload(
                    "expected an array of programs or an object with a `data` array".to_string(),
                ))
            }
        },
        _ => {
            return Err(FetchError::InvalidPayload(
                "expected an array of programs".to_string(),
            ))
        }
    };

    docs.into_iter()
        .enumerate()
        .map(|(index, doc)| {
            let id = doc.get("id").map(ToString::to_string);
            let doc = serde_json::from_value::<ProgramDoc>(doc).map_err(|error| {
                FetchError::InvalidPayload(match id {
                    Some(id) => format!("program {id} at index {index}: {error}"),
                    None => format!("program at index {index}: {error}"),
                })
            })?;
            Program::try_from(doc).map_err(FetchError::InvalidPayload)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> FetchResult<String> {
    let endpoint = normalize_text_option(Some(raw)).ok_or_else(|| {
        FetchError::InvalidConfiguration("endpoint must not be empty".to_string())
    })?;
    if is_http_url(&endpoint) {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(FetchError::InvalidConfiguration(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}

/// The named catalog services a client may sync from
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<HttpCatalogClient>,
    default_service: Option<String>,
}

impl ServiceRegistry {
    /// Build clients for every service in the configuration
    pub fn from_config(config: &CatalogConfig) -> FetchResult<Self> {
        let timeout = config.http_timeout();
        let services = config
            .services
            .iter()
            .map(|ServiceEndpoint { name, url }| HttpCatalogClient::new(name, url, timeout))
            .collect::<FetchResult<Vec<_>>>()?;

        Ok(Self {
            services,
            default_service: config.default_service.clone(),
        })
    }

    /// Name of the service used when none is requested: the configured
    /// default, otherwise the first registered service
    pub fn default_name(&self) -> Option<&str> {
        self.default_service
            .as_deref()
            .filter(|name| self.get(name).is_some())
            .or_else(|| self.services.first().map(HttpCatalogClient::name))
    }

    pub fn get(&self, name: &str) -> Option<&HttpCatalogClient> {
        self.services.iter().find(|service| service.name() == name)
    }

    /// Resolve an explicit name, falling back to the default service
    pub fn resolve(&self, name: Option<&str>) -> Option<&HttpCatalogClient> {
        match name {
            Some(name) => self.get(name),
            None => self.default_name().and_then(|name| self.get(name)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &HttpCatalogClient> {
        self.services.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
