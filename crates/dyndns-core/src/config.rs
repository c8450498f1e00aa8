//! Configuration types for the dyndns system
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is immutable once loaded: each [`DomainConfig`] is moved into
//! exactly one reconciler and lives there for the rest of the process.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default IPv4 mirror
pub const DEFAULT_IPV4_MIRROR: &str = "https://api.ipify.org";

/// Default IPv6 mirror
pub const DEFAULT_IPV6_MIRROR: &str = "https://api6.ipify.org";

/// Main dyndns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DyndnsConfig {
    /// One entry per managed domain
    pub configs: Vec<DomainConfig>,

    /// Mirror lists used by the IP resolver
    #[serde(flatten)]
    pub mirrors: MirrorConfig,
}

impl DyndnsConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.configs.is_empty() {
            return Err(crate::Error::config("No domain configurations provided"));
        }

        for config in &self.configs {
            config.validate()?;
        }

        self.mirrors.validate()
    }
}

/// Mirror endpoints for public IP discovery
///
/// Read-only after startup. Mirrors are tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// IPv4 mirrors
    #[serde(rename = "ipv4_mirrors", default = "default_ipv4_mirrors")]
    pub ipv4: Vec<String>,

    /// IPv6 mirrors
    #[serde(rename = "ipv6_mirrors", default = "default_ipv6_mirrors")]
    pub ipv6: Vec<String>,
}

impl MirrorConfig {
    /// Validate the mirror lists
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ipv4.is_empty() {
            return Err(crate::Error::config("IPv4 mirror list cannot be empty"));
        }
        if self.ipv6.is_empty() {
            return Err(crate::Error::config("IPv6 mirror list cannot be empty"));
        }

        for url in self.ipv4.iter().chain(&self.ipv6) {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "Mirror URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }

        Ok(())
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            ipv4: default_ipv4_mirrors(),
            ipv6: default_ipv6_mirrors(),
        }
    }
}

fn default_ipv4_mirrors() -> Vec<String> {
    vec![DEFAULT_IPV4_MIRROR.to_string()]
}

fn default_ipv6_mirrors() -> Vec<String> {
    vec![DEFAULT_IPV6_MIRROR.to_string()]
}

/// Strip surrounding whitespace and trailing dots from a domain name
pub fn normalize_domain(domain: &str) -> &str {
    domain.trim().trim_end_matches('.')
}

/// Per-domain configuration
///
/// Drives exactly one reconciliation loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain name (e.g. "example.com")
    pub domain: String,

    /// Hostnames under the domain; "" denotes the apex
    pub hostnames: Vec<String>,

    /// Seconds between passes (also the retry delay after a failed pass)
    #[serde(rename = "interval")]
    pub interval_secs: u64,

    /// Provider credentials
    #[serde(flatten)]
    pub credentials: Credentials,

    /// Provider endpoint selector
    #[serde(rename = "dev", default)]
    pub environment: Environment,
}

impl DomainConfig {
    /// Create a new production configuration
    pub fn new(
        domain: impl Into<String>,
        hostnames: Vec<String>,
        interval_secs: u64,
        credentials: Credentials,
    ) -> Self {
        Self {
            domain: domain.into(),
            hostnames,
            interval_secs,
            credentials,
            environment: Environment::Production,
        }
    }

    /// Select the provider environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Copy of this configuration with the domain in canonical form
    pub fn normalized(mut self) -> Self {
        self.domain = normalize_domain(&self.domain).to_string();
        self
    }

    /// Interval between passes
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the domain configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let domain = normalize_domain(&self.domain);
        if domain.is_empty() {
            return Err(crate::Error::config("Domain cannot be empty"));
        }
        if domain.chars().any(char::is_whitespace) {
            return Err(crate::Error::config(format!(
                "Domain contains whitespace: '{}'",
                self.domain
            )));
        }

        if self.hostnames.is_empty() {
            return Err(crate::Error::config(format!(
                "No hostnames configured for {} (use \"\" for the apex)",
                domain
            )));
        }

        for hostname in &self.hostnames {
            if hostname.chars().any(char::is_whitespace) {
                return Err(crate::Error::config(format!(
                    "Hostname contains whitespace: '{}'",
                    hostname
                )));
            }
            if hostname.starts_with('.') || hostname.ends_with('.') {
                return Err(crate::Error::config(format!(
                    "Hostname must be a bare label without leading or trailing dots: '{}'",
                    hostname
                )));
            }
        }

        if self.interval_secs == 0 {
            return Err(crate::Error::config(format!(
                "Interval for {} must be > 0",
                domain
            )));
        }

        self.credentials.validate()
    }
}

/// Provider credentials
///
/// The Debug implementation intentionally does NOT expose the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username
    pub username: String,
    /// API token
    /// ⚠️ NEVER log this value
    pub token: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Validate the credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.username.is_empty() {
            return Err(crate::Error::config("Provider username cannot be empty"));
        }
        if self.token.is_empty() {
            return Err(crate::Error::config("Provider token cannot be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// Provider endpoint selector
///
/// Serialized as the `dev` boolean of the configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Environment {
    /// Live provider endpoint
    #[default]
    Production,
    /// Alternate (development/staging) endpoint
    Development,
}

impl From<bool> for Environment {
    fn from(dev: bool) -> Self {
        if dev {
            Environment::Development
        } else {
            Environment::Production
        }
    }
}

impl From<Environment> for bool {
    fn from(environment: Environment) -> Self {
        environment == Environment::Development
    }
}

/// Whether reconciliation runs a single pass or loops forever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One pass per configuration, then exit
    Once,
    /// Loop at each configuration's interval until cancelled
    Daemon,
}

impl RunMode {
    /// Map the global daemon flag onto a run mode
    pub fn from_daemon_flag(daemon: bool) -> Self {
        if daemon { RunMode::Daemon } else { RunMode::Once }
    }
}
