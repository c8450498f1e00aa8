// # IP Resolver Trait
//
// Defines the interface for discovering the host's public addresses.
//
// ## Implementations
//
// - HTTP mirrors: `dyndns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//
//     let v4 = resolver.resolve_ipv4().await?;
//     println!("public IPv4: {}", v4);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for public IP resolver implementations
///
/// The two families are resolved independently: a failure in one must never
/// prevent the other from being attempted.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Outbound requests to the configured mirrors
/// - ✅ Fall through to the next mirror on failure
///
/// ## Forbidden Capabilities
/// - ❌ Retrying a single mirror (one attempt per mirror per call)
/// - ❌ Caching results across calls (every pass resolves fresh)
/// - ❌ Spawning tasks or sleeping
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The first valid address reported by a mirror
    /// - `Err(Error::Resolution)`: If every mirror failed
    async fn resolve_ipv4(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Resolve the public IPv6 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv6Addr)`: The first valid address reported by a mirror
    /// - `Err(Error::Resolution)`: If every mirror failed
    async fn resolve_ipv6(&self) -> Result<Ipv6Addr, crate::Error>;
}
