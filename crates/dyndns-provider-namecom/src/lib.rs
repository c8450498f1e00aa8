// # Name.com DNS Provider
//
// This crate provides a Name.com DNS provider implementation for the dyndns system.
//
// ## Implementation Notes
//
// - ✅ One HTTP request per operation (pagination aside)
// - ✅ Full error propagation to the reconciler (no retries here)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Status mapping: 401/403 → authentication, other non-2xx → api status
// - ✅ Dry-run mode for safe testing
// - ✅ Production and development endpoints
// - ❌ NO retry logic (a failed pass is retried by the reconciler)
// - ❌ NO caching (records are listed fresh on every pass)
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Every request carries HTTP Basic credentials (username + token)
//
// ## API Reference
//
// - Name.com API v4: https://www.name.com/api-docs
// - List Records:  GET    `/domains/:domain/records`
// - Create Record: POST   `/domains/:domain/records`
// - Update Record: PUT    `/domains/:domain/records/:id`
// - Delete Record: DELETE `/domains/:domain/records/:id`

use async_trait::async_trait;
use dyndns_core::config::{Credentials, DomainConfig, Environment};
use dyndns_core::traits::{DnsProvider, DnsProviderFactory, DnsRecord, RecordType};
use dyndns_core::{Error, ProviderErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name.com production API base URL
pub const PRODUCTION_API_BASE: &str = "https://api.name.com/v4";

/// Name.com development (sandbox) API base URL
pub const DEVELOPMENT_API_BASE: &str = "https://api.dev.name.com/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "namecom";

/// Record as it appears on the wire
///
/// Name.com omits `host` for apex records and may omit other empty fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRecord {
    id: u64,
    #[serde(default)]
    domain_name: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    fqdn: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    ttl: u32,
}

impl ApiRecord {
    fn into_record(self, domain: &str) -> DnsRecord {
        DnsRecord {
            id: self.id.to_string(),
            domain: if self.domain_name.is_empty() {
                domain.to_string()
            } else {
                self.domain_name
            },
            host: self.host,
            fqdn: self.fqdn,
            record_type: RecordType::from(self.record_type.as_str()),
            answer: self.answer,
            ttl: self.ttl,
        }
    }
}

/// Response of the list endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRecordsResponse {
    #[serde(default)]
    records: Vec<ApiRecord>,
    #[serde(default)]
    next_page: Option<u32>,
}

/// Body of create and update requests
#[derive(Debug, Serialize)]
struct RecordBody<'a> {
    host: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    answer: &'a str,
    ttl: u32,
}

impl<'a> From<&'a DnsRecord> for RecordBody<'a> {
    fn from(record: &'a DnsRecord) -> Self {
        Self {
            host: &record.host,
            record_type: record.record_type.as_str(),
            answer: &record.answer,
            ttl: record.ttl,
        }
    }
}

/// Name.com DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (record listing)
/// - Log the intended create/update/delete
/// - **NOT** actually modify DNS records
pub struct NameComProvider {
    /// API base URL, selected by environment
    base_url: String,

    /// Account username
    username: String,

    /// API token
    /// ⚠️ NEVER log this value
    token: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for NameComProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameComProvider")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("token", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl NameComProvider {
    /// Create a new Name.com provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: Username and API token
    /// - `environment`: Production or development endpoint
    pub fn new(credentials: &Credentials, environment: Environment) -> Self {
        let base_url = match environment {
            Environment::Production => PRODUCTION_API_BASE,
            Environment::Development => DEVELOPMENT_API_BASE,
        };

        Self {
            base_url: base_url.to_string(),
            username: credentials.username.clone(),
            token: credentials.token.clone(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            dry_run: false,
        }
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// API base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}/domains/{}/records", self.base_url, domain)
    }

    fn record_url(&self, record: &DnsRecord) -> String {
        format!("{}/{}", self.records_url(&record.domain), record.id)
    }

    /// Authenticate and send a request, mapping failures to provider errors
    async fn send(&self, request: reqwest::RequestBuilder, action: &str) -> Result<reqwest::Response> {
        let response = request
            .basic_auth(&self.username, Some(&self.token))
            .send()
            .await
            .map_err(|e| {
                Error::provider(
                    PROVIDER_NAME,
                    ProviderErrorKind::Transport,
                    format!("{}: HTTP request failed: {}", action, e),
                )
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(match status.as_u16() {
            401 | 403 => Error::provider(
                PROVIDER_NAME,
                ProviderErrorKind::Authentication,
                format!(
                    "{}: Authentication failed: Invalid username/token or insufficient permissions. Status: {}",
                    action, status
                ),
            ),
            code => Error::provider(
                PROVIDER_NAME,
                ProviderErrorKind::Api { status: code },
                format!("{} failed: {} - {}", action, status, error_text),
            ),
        })
    }

    /// Decode a JSON response body
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        action: &str,
    ) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                ProviderErrorKind::Decode,
                format!("{}: Failed to parse response: {}", action, e),
            )
        })
    }
}

#[async_trait]
impl DnsProvider for NameComProvider {
    /// List every record of a domain
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /domains/:domain/records[?page=N]
    /// Authorization: Basic <username:token>
    /// ```
    ///
    /// Pages are followed while the response carries a `nextPage`.
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        let base = self.records_url(domain);
        let mut records = Vec::new();
        let mut page: Option<u32> = None;

        loop {
            let url = match page {
                Some(page) => format!("{}?page={}", base, page),
                None => base.clone(),
            };

            tracing::debug!("Listing Name.com records: {}", url);

            let response = self.send(self.client.get(&url), "List records").await?;
            let body: ListRecordsResponse = Self::decode(response, "List records").await?;

            records.extend(body.records.into_iter().map(|r| r.into_record(domain)));

            match body.next_page {
                Some(next) if next > page.unwrap_or(1) => page = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    /// Update a record in place
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /domains/:domain/records/:id
    /// { "host": "www", "type": "A", "answer": "1.2.3.4", "ttl": 300 }
    /// ```
    async fn update_record(&self, record: &DnsRecord) -> Result<()> {
        let url = self.record_url(record);
        let body = RecordBody::from(record);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&body).unwrap_or_default()
            );
            return Ok(());
        }

        tracing::debug!("Updating Name.com record {} ({})", record.fqdn, record.id);
        self.send(self.client.put(&url).json(&body), "Update record")
            .await?;

        Ok(())
    }

    /// Create a record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /domains/:domain/records
    /// { "host": "www", "type": "A", "answer": "1.2.3.4", "ttl": 300 }
    /// ```
    async fn create_record(&self, record: &DnsRecord) -> Result<DnsRecord> {
        let url = self.records_url(&record.domain);
        let body = RecordBody::from(record);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                serde_json::to_string(&body).unwrap_or_default()
            );
            return Ok(record.clone());
        }

        let response = self
            .send(self.client.post(&url).json(&body), "Create record")
            .await?;
        let created: ApiRecord = Self::decode(response, "Create record").await?;

        tracing::info!("Created Name.com record {} ({})", created.fqdn, created.id);
        Ok(created.into_record(&record.domain))
    }

    /// Delete a record
    ///
    /// # API Call
    ///
    /// ```http
    /// DELETE /domains/:domain/records/:id
    /// ```
    async fn delete_record(&self, record: &DnsRecord) -> Result<()> {
        let url = self.record_url(record);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
            return Ok(());
        }

        self.send(self.client.delete(&url), "Delete record").await?;

        tracing::info!("Deleted Name.com record {} ({})", record.fqdn, record.id);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Name.com providers
#[derive(Debug, Default)]
pub struct NameComFactory {
    dry_run: bool,
}

impl NameComFactory {
    /// Create a factory; `dry_run` applies to every provider it builds
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl DnsProviderFactory for NameComFactory {
    fn create(&self, config: &DomainConfig) -> Result<Box<dyn DnsProvider>> {
        config.credentials.validate()?;

        if self.dry_run {
            tracing::warn!(
                "Name.com provider for {} running in DRY-RUN mode - no changes will be made",
                config.domain
            );
        }

        Ok(Box::new(
            NameComProvider::new(&config.credentials, config.environment)
                .with_dry_run(self.dry_run),
        ))
    }
}
