//! InView resource lookup client.
//!
//! This crate provides a lightweight client for the two resource endpoints
//! the query editor reads its catalogs from. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Validating the configured base URL
//! - Mapping a [`LookupQuery`] to each endpoint's query parameters
//! - Reporting transport, status and decode failures as [`LookupError`]
//!
//! The primary entry point is [`InviewClient`]. Callers that only need the
//! catalogs should depend on the [`CatalogSource`] trait instead.
//!
//! # Example
//!
//! ```ignore
//! use inview_api::{CatalogSource, InviewClient};
//! use inview_types::LookupQuery;
//!
//! async fn list() -> anyhow::Result<()> {
//!     let client = InviewClient::new("http://localhost:3000/api/datasources/uid/abc/resources", None, Default::default())?;
//!     let connections = client.connections(&LookupQuery::default()).await?;
//!     println!("{} connections", connections.len());
//!     Ok(())
//! }
//! ```

mod error;
mod source;

use std::env;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use inview_types::{Connection, LookupQuery, Resource, Variable};
use inview_util::{EditorConfig, redact_sensitive};
use reqwest::{Client, Url, header};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub use error::LookupError;
pub use source::CatalogSource;

/// Hostnames treated as local development targets.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]"];
/// Longest response body excerpt carried in a status error.
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for the resource endpoints.
///
/// Requests are resolved relative to the validated base URL and carry the
/// configured `Authorization`, `Accept` and User-Agent headers.
pub struct InviewClient {
    base_url: String,
    http: Client,
    user_agent: String,
}

impl InviewClient {
    /// Build a client for `base_url`.
    ///
    /// The API key, when present, is sent verbatim as the `Authorization` header.
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        if let Some(api_key) = api_key {
            let mut value = header::HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
            value.set_sensitive(true);
            default_headers.insert(header::AUTHORIZATION, value);
        }
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("inview-query-editor/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Construct a client from loaded configuration.
    pub fn new_from_config(config: &EditorConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow!("no base URL configured; set INVIEW_API_BASE or `baseUrl` in the config file"))?;
        Self::new(base_url, config.api_key.as_deref(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a resource endpoint.
    pub fn endpoint(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url, resource.path())
    }

    /// Run one lookup against `resource` and decode the JSON array it returns.
    ///
    /// Every call is a fresh round trip; nothing is cached or retried.
    pub async fn search<E: DeserializeOwned>(&self, resource: Resource, query: &LookupQuery) -> Result<Vec<E>, LookupError> {
        let url = self.endpoint(resource);
        let pairs = query.to_query_pairs(resource);
        debug!(%resource, %url, params = ?pairs, "lookup request");

        let started = Instant::now();
        let response = self
            .http
            .get(&url)
            .header(header::USER_AGENT, &self.user_agent)
            .query(&pairs)
            .send()
            .await
            .map_err(|source| LookupError::Network { resource, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| LookupError::Network { resource, source })?;

        if !status.is_success() {
            warn!(%resource, status = status.as_u16(), "lookup returned non-success status");
            return Err(LookupError::Status {
                resource,
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let items: Vec<E> = serde_json::from_str(&body).map_err(|source| {
            warn!(%resource, body = %excerpt(&body), "lookup body did not decode");
            LookupError::Decode { resource, source }
        })?;
        info!(
            %resource,
            item_count = items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "lookup completed"
        );
        Ok(items)
    }
}

#[async_trait]
impl CatalogSource for InviewClient {
    async fn connections(&self, query: &LookupQuery) -> Result<Vec<Connection>, LookupError> {
        self.search(Resource::Connections, query).await
    }

    async fn variables(&self, query: &LookupQuery) -> Result<Vec<Variable>, LookupError> {
        self.search(Resource::Variables, query).await
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - must parse and include a host
/// - scheme must be `http` or `https`
/// - plain `http` to a non-local host is allowed but logged
fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid base URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("base URL '{}' must include a host", base))?;

    match parsed_base_url.scheme() {
        "https" => Ok(()),
        "http" => {
            let is_local = LOCALHOST_DOMAINS
                .iter()
                .any(|&allowed| host_name.eq_ignore_ascii_case(allowed));
            if !is_local {
                warn!(host = %host_name, "base URL uses plain http for a non-local host");
            }
            Ok(())
        }
        other => Err(anyhow!("base URL must use http or https; got '{}://'", other)),
    }
}

fn excerpt(body: &str) -> String {
    let redacted = redact_sensitive(body);
    match redacted.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((index, _)) => format!("{}…", &redacted[..index]),
        None => redacted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_https_and_local_http() {
        assert!(validate_base_url("https://grafana.example.com/api/datasources/uid/x/resources").is_ok());
        assert!(validate_base_url("http://localhost:3000/resources").is_ok());
        assert!(validate_base_url("http://192.168.22.48:5123").is_ok());
    }

    #[test]
    fn validate_rejects_other_schemes_and_garbage() {
        assert!(validate_base_url("ftp://example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("file:///tmp/x").is_err());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = InviewClient::new("http://localhost:3000/resources/", None, Duration::from_secs(5)).expect("client");
        assert_eq!(client.endpoint(Resource::Variables), "http://localhost:3000/resources/Variables");
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(ERROR_BODY_LIMIT + 50);
        let short = excerpt(&long);
        assert_eq!(short.chars().count(), ERROR_BODY_LIMIT + 1);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn new_from_config_requires_base_url() {
        let error = InviewClient::new_from_config(&EditorConfig::default()).expect_err("missing base url");
        assert!(error.to_string().contains("INVIEW_API_BASE"));
    }
}
