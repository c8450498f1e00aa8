//! Hostname matching
//!
//! Decides whether a provider record belongs to a configuration. The
//! configured names are normalized once; the comparison against the
//! provider's FQDN is then an exact, case-sensitive string match with the
//! trailing dot required.

use std::collections::HashSet;

use crate::config::{DomainConfig, normalize_domain};

/// Set of FQDNs a configuration manages
#[derive(Debug, Clone)]
pub struct HostnameMatcher {
    fqdns: HashSet<String>,
}

impl HostnameMatcher {
    /// Build the matcher for a domain and its hostnames
    ///
    /// An empty hostname denotes the apex and expands to `"{domain}."`;
    /// any other hostname `h` expands to `"{h}.{domain}."`.
    pub fn new<S: AsRef<str>>(domain: &str, hostnames: &[S]) -> Self {
        let domain = normalize_domain(domain);

        let fqdns = hostnames
            .iter()
            .map(|hostname| {
                let hostname = hostname.as_ref();
                if hostname.is_empty() {
                    format!("{}.", domain)
                } else {
                    format!("{}.{}.", hostname, domain)
                }
            })
            .collect();

        Self { fqdns }
    }

    /// Build the matcher for a domain configuration
    pub fn from_config(config: &DomainConfig) -> Self {
        Self::new(&config.domain, &config.hostnames)
    }

    /// Whether a provider FQDN is managed by this configuration
    pub fn matches(&self, fqdn: &str) -> bool {
        self.fqdns.contains(fqdn)
    }
}
