//! Core traits for the dyndns system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpResolver`]: Discover the host's public IPv4/IPv6 addresses
//! - [`DnsProvider`]: List and mutate a domain's records via a provider API

pub mod ip_resolver;
pub mod dns_provider;

pub use ip_resolver::{IpResolver, IpVersion};
pub use dns_provider::{DnsProvider, DnsProviderFactory, DnsRecord, RecordType};
