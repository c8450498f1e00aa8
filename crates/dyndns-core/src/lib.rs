// # dyndns-core
//
// Core library for the name-dyndns updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpResolver**: Trait for discovering the host's public IPv4/IPv6 addresses
// - **DnsProvider**: Trait for listing and updating a domain's records
// - **Reconciler**: Per-domain loop that resolves, fetches, matches and updates
// - **Runner**: Fans out one reconciler per configuration and joins them
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **In-place Updates**: Records are mutated with a single update call, never delete+create
// 3. **Independent Families**: IPv4 and IPv6 are resolved and applied independently
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: Records already holding the resolved address are never touched

pub mod traits;
pub mod reconciler;
pub mod runner;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsProviderFactory, DnsRecord, IpResolver, IpVersion, RecordType};
pub use reconciler::{
    HostnameMatcher, PassError, PassReport, Reconciler, ResolvedAddresses, TaskExit, TaskSummary,
};
pub use runner::Runner;
pub use config::{Credentials, DomainConfig, DyndnsConfig, Environment, MirrorConfig, RunMode};
pub use error::{Error, ProviderErrorKind, Result};
