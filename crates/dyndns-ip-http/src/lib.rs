// # HTTP IP Resolver
//
// This crate provides an HTTP mirror-based IP resolver for the dyndns system.
//
// ## Architecture
//
// Each address family has an ordered list of "what is my IP" mirrors
// (e.g. api.ipify.org, api6.ipify.org). A mirror answers a plain GET with the
// literal address as the body. Mirrors are tried in order with one attempt
// each; the first valid answer wins. Transport failures, non-success
// statuses, empty bodies and malformed addresses all fall through to the
// next mirror.
//
// Mirror lists are plain configuration passed in at construction and never
// change afterwards.

use async_trait::async_trait;
use dyndns_core::config::MirrorConfig;
use dyndns_core::traits::{IpResolver, IpVersion};
use dyndns_core::{Error, Result};

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP timeout for mirror requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP mirror-based IP resolver
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// IPv4 mirrors, tried in order
    ipv4_mirrors: Vec<String>,

    /// IPv6 mirrors, tried in order
    ipv6_mirrors: Vec<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver from the configured mirror lists
    pub fn new(mirrors: &MirrorConfig) -> Self {
        Self::with_mirrors(mirrors.ipv4.clone(), mirrors.ipv6.clone())
    }

    /// Create a resolver with explicit mirror lists
    pub fn with_mirrors(ipv4_mirrors: Vec<String>, ipv6_mirrors: Vec<String>) -> Self {
        Self {
            ipv4_mirrors,
            ipv6_mirrors,
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Fetch the raw body from a single mirror
    async fn try_mirror(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))
    }

    /// Walk the mirrors for a family until one yields a valid address
    async fn resolve<T: FromStr + Send>(&self, version: IpVersion) -> Result<T> {
        let mirrors = match version {
            IpVersion::V4 => &self.ipv4_mirrors,
            IpVersion::V6 => &self.ipv6_mirrors,
        };

        let mut last_error = String::from("no mirrors configured");

        for url in mirrors {
            let outcome = match self.try_mirror(url).await {
                Ok(body) => parse_address::<T>(version, &body),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(ip) => {
                    tracing::debug!(mirror = %url, "Resolved {} address", version);
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!(mirror = %url, "{} mirror failed: {}", version, e);
                    last_error = format!("{}: {}", url, e);
                }
            }
        }

        Err(Error::resolution(version, last_error))
    }
}

/// Validate a mirror body as an address of the given family
///
/// Surrounding whitespace is ignored. An IPv6 answer without a colon is
/// rejected outright, which catches mirrors that fall back to IPv4.
fn parse_address<T: FromStr>(version: IpVersion, body: &str) -> std::result::Result<T, String> {
    let text = body.trim();

    if text.is_empty() {
        return Err("Empty response".to_string());
    }

    if version == IpVersion::V6 && !text.contains(':') {
        return Err(format!("IPv6 address received was not valid: {}", text));
    }

    text.parse::<T>()
        .map_err(|_| format!("Invalid {} address: {}", version, text))
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve_ipv4(&self) -> Result<Ipv4Addr> {
        self.resolve(IpVersion::V4).await
    }

    async fn resolve_ipv6(&self) -> Result<Ipv6Addr> {
        self.resolve(IpVersion::V6).await
    }
}
