//! Per-domain reconciliation loop
//!
//! The Reconciler is responsible for:
//! - Resolving the public IPv4/IPv6 addresses via IpResolver
//! - Fetching the domain's current records via DnsProvider
//! - Matching records against the configured hostnames
//! - Updating stale A/AAAA records in place
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────┐
//!                │  Reconciler  │
//!                └──────────────┘
//!                        │
//!         ┌──────────────┼───────────────────┐
//!         │              │                   │
//!         ▼              ▼                   ▼
//! ┌─────────────┐ ┌──────────────┐  ┌─────────────────┐
//! │ IpResolver  │ │ DnsProvider  │  │ HostnameMatcher │
//! │ (v4 + v6)   │ │ (list/update)│  │ (fqdn filter)   │
//! └─────────────┘ └──────────────┘  └─────────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Resolve both families independently; fail the pass only if both fail
//! 2. List the domain's records; a failure here fails the pass
//! 3. Skip records whose FQDN is not configured
//! 4. For A (AAAA) records, update when the resolved IPv4 (IPv6) differs
//! 5. Record-level failures are logged and never abort the pass
//!
//! In daemon mode the loop sleeps for the configured interval after every
//! pass, successful or not, and starts over. In one-shot mode it stops
//! after the first pass.

pub mod matcher;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{DomainConfig, RunMode};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord, IpResolver, RecordType};

pub use matcher::HostnameMatcher;

/// Addresses resolved at the start of a pass
///
/// Absence of one family never blocks handling of the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedAddresses {
    /// Public IPv4 address, if resolution succeeded
    pub ipv4: Option<Ipv4Addr>,
    /// Public IPv6 address, if resolution succeeded
    pub ipv6: Option<Ipv6Addr>,
}

impl ResolvedAddresses {
    /// The address a record of `record_type` should hold, if known
    ///
    /// The record type pins the family: A records only ever receive the
    /// IPv4 address and AAAA records the IPv6 address.
    pub fn target_for(&self, record_type: &RecordType) -> Option<IpAddr> {
        match record_type {
            RecordType::A => self.ipv4.map(IpAddr::V4),
            RecordType::Aaaa => self.ipv6.map(IpAddr::V6),
            RecordType::Other(_) => None,
        }
    }
}

/// Outcome of a completed pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Domain the pass ran for
    pub domain: String,
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// Addresses resolved for this pass
    pub addresses: ResolvedAddresses,
    /// Records whose FQDN matched a configured hostname
    pub matched: usize,
    /// Records successfully updated
    pub updated: usize,
    /// Matching records already holding the resolved address
    pub unchanged: usize,
    /// Matching records left alone (family unresolved or type not A/AAAA)
    pub skipped: usize,
    /// Updates that failed
    pub failed: usize,
}

impl PassReport {
    fn new(domain: &str, started_at: DateTime<Utc>, addresses: ResolvedAddresses) -> Self {
        Self {
            domain: domain.to_string(),
            started_at,
            addresses,
            matched: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

/// Why a pass was abandoned before any record was touched
#[derive(Error, Debug)]
pub enum PassError {
    /// Neither address family could be resolved; records were not fetched
    #[error("no address family could be resolved (IPv4: {ipv4}; IPv6: {ipv6})")]
    Resolution {
        /// IPv4 failure
        ipv4: Error,
        /// IPv6 failure
        ipv6: Error,
    },

    /// The record listing failed
    #[error("failed to fetch records: {0}")]
    Fetch(#[source] Error),
}

/// How a reconciliation task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// One-shot pass completed (regardless of per-record outcomes)
    Completed,
    /// One-shot pass failed during resolution or fetch
    Aborted,
    /// Shutdown was requested
    Cancelled,
}

/// Summary of a reconciliation task's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    /// Domain the task managed
    pub domain: String,
    /// Passes started
    pub passes: usize,
    /// Passes abandoned with a [`PassError`]
    pub failed_passes: usize,
    /// How the task ended
    pub exit: TaskExit,
}

enum RecordOutcome {
    Updated,
    Unchanged,
    Skipped,
    Failed,
}

/// Reconciliation loop for a single domain configuration
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Drive with [`Reconciler::run()`], or a single [`Reconciler::run_pass()`]
/// 3. Cancel the token passed to `run()` to stop a daemon-mode loop
///
/// ## Threading
///
/// Each reconciler owns its provider client and configuration. The resolver
/// is shared read-only between reconcilers.
pub struct Reconciler {
    /// Configuration driving this loop
    config: DomainConfig,

    /// FQDN filter derived from the configuration
    matcher: HostnameMatcher,

    /// Public address resolver
    resolver: Arc<dyn IpResolver>,

    /// Provider client scoped to this configuration's credentials
    provider: Box<dyn DnsProvider>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `config`: Domain configuration (validated and normalized here)
    /// - `resolver`: IP resolver implementation
    /// - `provider`: DNS provider client for this configuration
    pub fn new(
        config: DomainConfig,
        resolver: Arc<dyn IpResolver>,
        provider: Box<dyn DnsProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let config = config.normalized();
        let matcher = HostnameMatcher::from_config(&config);

        Ok(Self {
            config,
            matcher,
            resolver,
            provider,
        })
    }

    /// Domain this reconciler manages
    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    /// Run the loop until it terminates
    ///
    /// In [`RunMode::Once`] this performs exactly one pass. In
    /// [`RunMode::Daemon`] it loops until `shutdown` is cancelled; the token
    /// is checked before every pass and raced against the inter-pass sleep.
    /// A pass already in flight is never interrupted.
    pub async fn run(&self, mode: RunMode, shutdown: CancellationToken) -> TaskSummary {
        let domain = self.domain().to_string();
        let mut passes = 0;
        let mut failed_passes = 0;

        info!(domain = %domain, ?mode, interval_secs = self.config.interval_secs, "Starting reconciler");

        let exit = loop {
            if shutdown.is_cancelled() {
                break TaskExit::Cancelled;
            }

            passes += 1;
            match self.run_pass().await {
                Ok(report) => {
                    info!(
                        domain = %domain,
                        matched = report.matched,
                        updated = report.updated,
                        unchanged = report.unchanged,
                        failed = report.failed,
                        "Update complete"
                    );
                    if mode == RunMode::Once {
                        break TaskExit::Completed;
                    }
                }
                Err(e) => {
                    failed_passes += 1;
                    error!(domain = %domain, "Pass failed: {}", e);
                    if mode == RunMode::Once {
                        warn!(domain = %domain, "Non daemon mode, giving up");
                        break TaskExit::Aborted;
                    }
                }
            }

            debug!(domain = %domain, "Next pass in {}s", self.config.interval_secs);
            tokio::select! {
                _ = shutdown.cancelled() => break TaskExit::Cancelled,
                _ = tokio::time::sleep(self.config.interval()) => {}
            }
        };

        info!(domain = %domain, passes, failed_passes, ?exit, "Reconciler stopped");

        TaskSummary {
            domain,
            passes,
            failed_passes,
            exit,
        }
    }

    /// Perform one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(PassReport)`: The pass reached the update stage; per-record
    ///   failures are counted in the report
    /// - `Err(PassError)`: Resolution or fetch failed; nothing was updated
    pub async fn run_pass(&self) -> std::result::Result<PassReport, PassError> {
        let started_at = Utc::now();

        let addresses = self.resolve().await?;

        let records = self
            .provider
            .list_records(&self.config.domain)
            .await
            .map_err(PassError::Fetch)?;

        debug!(domain = %self.config.domain, count = records.len(), "Fetched records");

        let mut report = PassReport::new(&self.config.domain, started_at, addresses);

        for record in records {
            if !self.matcher.matches(&record.fqdn) {
                continue;
            }

            report.matched += 1;
            match self.reconcile_record(record, &addresses).await {
                RecordOutcome::Updated => report.updated += 1,
                RecordOutcome::Unchanged => report.unchanged += 1,
                RecordOutcome::Skipped => report.skipped += 1,
                RecordOutcome::Failed => report.failed += 1,
            }
        }

        Ok(report)
    }

    /// Resolve both address families independently
    async fn resolve(&self) -> std::result::Result<ResolvedAddresses, PassError> {
        let (ipv4, ipv6) = tokio::join!(self.resolver.resolve_ipv4(), self.resolver.resolve_ipv6());

        match (ipv4, ipv6) {
            (Err(ipv4), Err(ipv6)) => Err(PassError::Resolution { ipv4, ipv6 }),
            (ipv4, ipv6) => {
                let ipv4 = ipv4
                    .inspect(|ip| info!(domain = %self.config.domain, "Retrieved IPv4: {}", ip))
                    .inspect_err(|e| warn!(domain = %self.config.domain, "Failed to retrieve IPv4: {}", e))
                    .ok();
                let ipv6 = ipv6
                    .inspect(|ip| info!(domain = %self.config.domain, "Retrieved IPv6: {}", ip))
                    .inspect_err(|e| warn!(domain = %self.config.domain, "Failed to retrieve IPv6: {}", e))
                    .ok();

                Ok(ResolvedAddresses { ipv4, ipv6 })
            }
        }
    }

    /// Bring one matching record up to date
    async fn reconcile_record(
        &self,
        mut record: DnsRecord,
        addresses: &ResolvedAddresses,
    ) -> RecordOutcome {
        debug!(
            "Checking against {} ({} - {})",
            record.fqdn, record.record_type, record.answer
        );

        let Some(ip) = addresses.target_for(&record.record_type) else {
            return RecordOutcome::Skipped;
        };

        if record.answer_matches(ip) {
            return RecordOutcome::Unchanged;
        }

        let previous = std::mem::replace(&mut record.answer, ip.to_string());

        match self.provider.update_record(&record).await {
            Ok(()) => {
                info!(
                    fqdn = %record.fqdn,
                    record_type = %record.record_type,
                    previous = %previous,
                    "Updated record with IP: {}",
                    record.answer
                );
                RecordOutcome::Updated
            }
            Err(e) => {
                warn!(
                    fqdn = %record.fqdn,
                    "Failed to update record with IP {}: {}",
                    record.answer,
                    e
                );
                RecordOutcome::Failed
            }
        }
    }
}
