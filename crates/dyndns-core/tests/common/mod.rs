//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides minimal test doubles that record every call so the
//! contract tests can assert on exactly which remote operations happened.

#![allow(dead_code)]

use dyndns_core::error::Result;
use dyndns_core::traits::{DnsProvider, DnsProviderFactory, DnsRecord, IpResolver, RecordType};
use dyndns_core::{Credentials, DomainConfig, Error, IpVersion, ProviderErrorKind};
use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A resolver whose answers the test controls
///
/// `None` for a family makes that family fail with a resolution error.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    ipv4: Arc<Mutex<Option<Ipv4Addr>>>,
    ipv6: Arc<Mutex<Option<Ipv6Addr>>>,
    ipv4_calls: Arc<AtomicUsize>,
    ipv6_calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> Self {
        Self {
            ipv4: Arc::new(Mutex::new(ipv4)),
            ipv6: Arc::new(Mutex::new(ipv6)),
            ..Default::default()
        }
    }

    /// A resolver that fails both families
    pub fn failing() -> Self {
        Self::new(None, None)
    }

    pub fn set_ipv4(&self, ip: Option<Ipv4Addr>) {
        *self.ipv4.lock().unwrap() = ip;
    }

    pub fn set_ipv6(&self, ip: Option<Ipv6Addr>) {
        *self.ipv6.lock().unwrap() = ip;
    }

    pub fn ipv4_calls(&self) -> usize {
        self.ipv4_calls.load(Ordering::SeqCst)
    }

    pub fn ipv6_calls(&self) -> usize {
        self.ipv6_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve_ipv4(&self) -> Result<Ipv4Addr> {
        self.ipv4_calls.fetch_add(1, Ordering::SeqCst);
        (*self.ipv4.lock().unwrap())
            .ok_or_else(|| Error::resolution(IpVersion::V4, "scripted failure"))
    }

    async fn resolve_ipv6(&self) -> Result<Ipv6Addr> {
        self.ipv6_calls.fetch_add(1, Ordering::SeqCst);
        (*self.ipv6.lock().unwrap())
            .ok_or_else(|| Error::resolution(IpVersion::V6, "scripted failure"))
    }
}

/// An in-memory provider that records every call
///
/// Successful updates are applied to the stored records, so a later
/// listing reflects them just like a real provider would.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    updates: Arc<Mutex<Vec<DnsRecord>>>,
    list_calls: Arc<AtomicUsize>,
    listed_domains: Arc<Mutex<Vec<String>>>,
    create_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
    fail_list: Arc<AtomicBool>,
    failing_ids: Arc<Mutex<HashSet<String>>>,
}

impl MockDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            ..Default::default()
        }
    }

    /// Make list_records() fail until reset
    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make update_record() fail for a record id
    pub fn fail_updates_for(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Domains passed to list_records(), in call order
    pub fn listed_domains(&self) -> Vec<String> {
        self.listed_domains.lock().unwrap().clone()
    }

    /// Records passed to update_record(), in call order (including failures)
    pub fn updates(&self) -> Vec<DnsRecord> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Current stored answer for a record id
    pub fn answer_of(&self, id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.answer.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.listed_domains.lock().unwrap().push(domain.to_string());
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::provider(
                "mock",
                ProviderErrorKind::Transport,
                "connection refused",
            ));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn update_record(&self, record: &DnsRecord) -> Result<()> {
        self.updates.lock().unwrap().push(record.clone());

        if self.failing_ids.lock().unwrap().contains(&record.id) {
            return Err(Error::provider(
                "mock",
                ProviderErrorKind::Api { status: 500 },
                "internal error",
            ));
        }

        let mut records = self.records.lock().unwrap();
        if let Some(stored) = records.iter_mut().find(|r| r.id == record.id) {
            *stored = record.clone();
        }
        Ok(())
    }

    async fn create_record(&self, record: &DnsRecord) -> Result<DnsRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn delete_record(&self, _record: &DnsRecord) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A factory handing out pre-built mock providers by domain
#[derive(Default)]
pub struct MockProviderFactory {
    providers: HashMap<String, MockDnsProvider>,
    create_calls: AtomicUsize,
}

impl MockProviderFactory {
    pub fn with_provider(mut self, domain: &str, provider: MockDnsProvider) -> Self {
        self.providers.insert(domain.to_string(), provider);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl DnsProviderFactory for MockProviderFactory {
    fn create(&self, config: &DomainConfig) -> Result<Box<dyn DnsProvider>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let provider = self
            .providers
            .get(&config.domain)
            .cloned()
            .ok_or_else(|| Error::config(format!("no provider for {}", config.domain)))?;
        Ok(Box::new(provider))
    }
}

/// Build a provider record
pub fn record(id: &str, fqdn: &str, record_type: &str, answer: &str) -> DnsRecord {
    let domain = "example.com";
    let host = fqdn
        .trim_end_matches('.')
        .strip_suffix(domain)
        .unwrap_or("")
        .trim_end_matches('.')
        .to_string();

    DnsRecord {
        id: id.to_string(),
        domain: domain.to_string(),
        host,
        fqdn: fqdn.to_string(),
        record_type: RecordType::from(record_type),
        answer: answer.to_string(),
        ttl: 300,
    }
}

/// Helper to create a domain configuration for testing
pub fn domain_config(domain: &str, hostnames: &[&str], interval_secs: u64) -> DomainConfig {
    DomainConfig::new(
        domain,
        hostnames.iter().map(|h| h.to_string()).collect(),
        interval_secs,
        Credentials::new("test-user", "test-token"),
    )
}

pub fn ipv4(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

pub fn ipv6(s: &str) -> Ipv6Addr {
    s.parse().unwrap()
}
