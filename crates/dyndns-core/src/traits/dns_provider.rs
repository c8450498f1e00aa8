// # DNS Provider Trait
//
// Defines the interface for reading and mutating a domain's record set via a
// provider API.
//
// ## Implementations
//
// - Name.com: `dyndns-provider-namecom` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     for mut record in provider.list_records("example.com").await? {
//         if record.fqdn == "www.example.com." {
//             record.answer = "203.0.113.5".to_string();
//             provider.update_record(&record).await?;
//         }
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

use crate::config::DomainConfig;

/// DNS record type
///
/// Only `A` and `AAAA` records are reconciled; everything else is carried
/// through verbatim so it can still be listed or administered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
    /// Any other record type, as reported by the provider
    Other(String),
}

impl RecordType {
    /// Wire representation of the type
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Other(other) => other,
        }
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        match value {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            other => RecordType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS record as reported by the provider
///
/// Records are fetched fresh on every pass. The reconciler mutates a local
/// copy and hands it back through [`DnsProvider::update_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned identifier
    pub id: String,
    /// Domain the record belongs to (e.g. "example.com")
    pub domain: String,
    /// Subdomain label, empty for the apex
    pub host: String,
    /// Fully-qualified name, trailing-dot terminated (e.g. "www.example.com.")
    pub fqdn: String,
    /// Record type
    pub record_type: RecordType,
    /// Record value (the address for A/AAAA)
    pub answer: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl DnsRecord {
    /// Whether the record's answer already holds `ip`
    ///
    /// Answers are compared as addresses when they parse, so that
    /// equivalent IPv6 spellings are not treated as stale. Otherwise the
    /// trimmed strings are compared.
    pub fn answer_matches(&self, ip: IpAddr) -> bool {
        let answer = self.answer.trim();
        match answer.parse::<IpAddr>() {
            Ok(current) => current == ip,
            Err(_) => answer == ip.to_string(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// One instance is scoped to one set of credentials and one endpoint, chosen
/// at construction time.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform authenticated HTTP/HTTPS API calls to their endpoint only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (the reconciler decides what happens next)
///
/// ## Forbidden Capabilities
/// - ❌ Retry logic or backoff (owned by the reconciler's pass scheduling)
/// - ❌ Deciding whether an update is needed (owned by the reconciler)
/// - ❌ Spawning tasks or threads
/// - ❌ Caching records between calls
///
/// ## Update Strategy
///
/// [`update_record`](DnsProvider::update_record) must mutate the record in
/// place with a single remote call. Deleting and recreating a record leaves a
/// window in which the name resolves to nothing, so
/// [`create_record`](DnsProvider::create_record) and
/// [`delete_record`](DnsProvider::delete_record) exist for administrative
/// use only and are never called by the reconciler.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record of a domain, regardless of type
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Update a record in place
    ///
    /// Sends the record's host, type, answer and ttl for the record's id.
    /// This is a single atomic remote operation from the caller's view.
    async fn update_record(&self, record: &DnsRecord) -> Result<(), crate::Error>;

    /// Create a record; the `id` of the input is ignored
    ///
    /// # Returns
    ///
    /// The record as stored by the provider, with its assigned id
    async fn create_record(&self, record: &DnsRecord) -> Result<DnsRecord, crate::Error>;

    /// Delete a record by id
    async fn delete_record(&self, record: &DnsRecord) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
///
/// The runner calls this once per [`DomainConfig`] so that every
/// reconciliation task owns its own client.
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance for a domain configuration
    fn create(&self, config: &DomainConfig) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
