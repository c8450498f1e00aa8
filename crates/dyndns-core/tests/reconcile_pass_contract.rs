//! Contract Test: Reconciliation Pass
//!
//! This test verifies the decisions made inside a single pass.
//!
//! Constraints verified:
//! - Only records whose FQDN matches a configured hostname are considered
//! - A records follow the IPv4 address, AAAA records the IPv6 address
//! - Records already holding the resolved address are never touched
//! - Updates happen in place; create/delete are never used
//! - A failed family or a failed update never blocks the rest of the pass
//! - With no address at all, the provider is not contacted
//!
//! If this test fails, the reconciler is issuing wrong or extra mutations.

mod common;

use common::*;
use dyndns_core::{PassError, Reconciler};
use std::sync::Arc;

fn reconciler(
    hostnames: &[&str],
    resolver: &ScriptedResolver,
    provider: &MockDnsProvider,
) -> Reconciler {
    Reconciler::new(
        domain_config("example.com", hostnames, 60),
        Arc::new(resolver.clone()),
        Box::new(provider.clone()),
    )
    .expect("reconciler construction succeeds")
}

#[tokio::test]
async fn apex_scenario_updates_only_the_stale_record() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), None);
    let provider = MockDnsProvider::new(vec![
        record("1", "example.com.", "A", "9.9.9.9"),
        record("2", "www.example.com.", "A", "1.2.3.4"),
    ]);

    let report = reconciler(&["", "www"], &resolver, &provider)
        .run_pass()
        .await
        .expect("pass succeeds");

    let updates = provider.updates();
    assert_eq!(updates.len(), 1, "Expected exactly one update, got {:?}", updates);
    assert_eq!(updates[0].id, "1");
    assert_eq!(updates[0].fqdn, "example.com.");
    assert_eq!(updates[0].answer, "1.2.3.4");

    assert_eq!(report.matched, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(provider.answer_of("2").as_deref(), Some("1.2.3.4"));
}

#[tokio::test]
async fn second_pass_without_ip_change_issues_no_updates() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), Some(ipv6("2001:db8::1")));
    let provider = MockDnsProvider::new(vec![
        record("1", "example.com.", "A", "9.9.9.9"),
        record("2", "example.com.", "AAAA", "2001:db8::ff"),
        record("3", "www.example.com.", "A", "5.6.7.8"),
    ]);
    let reconciler = reconciler(&["", "www"], &resolver, &provider);

    reconciler.run_pass().await.expect("first pass succeeds");
    assert_eq!(provider.update_call_count(), 3);

    let report = reconciler.run_pass().await.expect("second pass succeeds");
    assert_eq!(
        provider.update_call_count(),
        3,
        "Second pass with unchanged IPs must not update anything"
    );
    assert_eq!(report.updated, 0);
    assert_eq!(report.unchanged, 3);
}

#[tokio::test]
async fn ip_change_between_passes_triggers_update() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), None);
    let provider = MockDnsProvider::new(vec![record("1", "example.com.", "A", "1.2.3.4")]);
    let reconciler = reconciler(&[""], &resolver, &provider);

    reconciler.run_pass().await.unwrap();
    assert_eq!(provider.update_call_count(), 0);

    resolver.set_ipv4(Some(ipv4("10.0.0.1")));
    reconciler.run_pass().await.unwrap();

    assert_eq!(provider.update_call_count(), 1);
    assert_eq!(provider.answer_of("1").as_deref(), Some("10.0.0.1"));
}

#[tokio::test]
async fn ipv4_failure_still_updates_aaaa_records() {
    let resolver = ScriptedResolver::new(None, Some(ipv6("2001:db8::42")));
    let provider = MockDnsProvider::new(vec![
        record("1", "www.example.com.", "A", "9.9.9.9"),
        record("2", "www.example.com.", "AAAA", "2001:db8::1"),
    ]);

    let report = reconciler(&["www"], &resolver, &provider)
        .run_pass()
        .await
        .expect("pass succeeds with one family");

    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, "2");
    assert_eq!(updates[0].answer, "2001:db8::42");
    assert_eq!(provider.answer_of("1").as_deref(), Some("9.9.9.9"));

    assert_eq!(report.addresses.ipv4, None);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.updated, 1);
}

#[tokio::test]
async fn ipv6_failure_still_updates_a_records() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), None);
    let provider = MockDnsProvider::new(vec![
        record("1", "www.example.com.", "A", "9.9.9.9"),
        record("2", "www.example.com.", "AAAA", "2001:db8::1"),
    ]);

    reconciler(&["www"], &resolver, &provider)
        .run_pass()
        .await
        .expect("pass succeeds with one family");

    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, "1");
    assert_eq!(provider.answer_of("2").as_deref(), Some("2001:db8::1"));
}

#[tokio::test]
async fn both_families_failing_skips_fetch_entirely() {
    let resolver = ScriptedResolver::failing();
    let provider = MockDnsProvider::new(vec![record("1", "example.com.", "A", "9.9.9.9")]);

    let result = reconciler(&[""], &resolver, &provider).run_pass().await;

    assert!(
        matches!(result, Err(PassError::Resolution { .. })),
        "Expected resolution failure, got {:?}",
        result
    );
    assert_eq!(resolver.ipv4_calls(), 1);
    assert_eq!(resolver.ipv6_calls(), 1);
    assert_eq!(provider.list_calls(), 0, "Records must not be fetched");
    assert_eq!(provider.update_call_count(), 0);
}

#[tokio::test]
async fn fetch_failure_fails_pass_without_updates() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), None);
    let provider = MockDnsProvider::new(vec![record("1", "example.com.", "A", "9.9.9.9")]);
    provider.set_fail_list(true);

    let result = reconciler(&[""], &resolver, &provider).run_pass().await;

    assert!(matches!(result, Err(PassError::Fetch(_))));
    assert_eq!(provider.list_calls(), 1);
    assert_eq!(provider.update_call_count(), 0);
}

#[tokio::test]
async fn failed_update_does_not_abort_remaining_records() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), None);
    let provider = MockDnsProvider::new(vec![
        record("1", "example.com.", "A", "9.9.9.9"),
        record("2", "www.example.com.", "A", "9.9.9.9"),
        record("3", "vpn.example.com.", "A", "9.9.9.9"),
    ]);
    provider.fail_updates_for("1");

    let report = reconciler(&["", "www", "vpn"], &resolver, &provider)
        .run_pass()
        .await
        .expect("record failures do not fail the pass");

    assert_eq!(provider.update_call_count(), 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.updated, 2);
    assert_eq!(provider.answer_of("1").as_deref(), Some("9.9.9.9"));
    assert_eq!(provider.answer_of("2").as_deref(), Some("1.2.3.4"));
    assert_eq!(provider.answer_of("3").as_deref(), Some("1.2.3.4"));
}

#[tokio::test]
async fn unmatched_and_non_address_records_are_ignored() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), Some(ipv6("2001:db8::1")));
    let provider = MockDnsProvider::new(vec![
        record("1", "mail.example.com.", "A", "9.9.9.9"),
        record("2", "www.example.com", "A", "9.9.9.9"),
        record("3", "WWW.example.com.", "A", "9.9.9.9"),
        record("4", "www.example.com.", "CNAME", "example.com."),
        record("5", "www.example.com.", "TXT", "v=spf1 -all"),
        record("6", "example.com.", "A", "9.9.9.9"),
    ]);

    let report = reconciler(&["www"], &resolver, &provider)
        .run_pass()
        .await
        .unwrap();

    assert_eq!(provider.update_call_count(), 0);
    assert_eq!(report.matched, 2);
    assert_eq!(report.skipped, 2);
}

#[tokio::test]
async fn update_mutates_only_the_answer_and_never_recreates() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), None);
    let mut stale = record("42", "www.example.com.", "A", "9.9.9.9");
    stale.ttl = 3600;
    let provider = MockDnsProvider::new(vec![stale.clone()]);

    reconciler(&["www"], &resolver, &provider)
        .run_pass()
        .await
        .unwrap();

    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    let sent = &updates[0];
    assert_eq!(sent.id, stale.id);
    assert_eq!(sent.host, "www");
    assert_eq!(sent.ttl, 3600);
    assert_eq!(sent.record_type, stale.record_type);
    assert_eq!(sent.answer, "1.2.3.4");

    assert_eq!(provider.create_calls(), 0, "Reconciler must never create records");
    assert_eq!(provider.delete_calls(), 0, "Reconciler must never delete records");
}

#[tokio::test]
async fn equivalent_ipv6_spelling_is_not_stale() {
    let resolver = ScriptedResolver::new(None, Some(ipv6("2001:db8::1")));
    let provider = MockDnsProvider::new(vec![record(
        "1",
        "example.com.",
        "AAAA",
        "2001:0db8:0:0:0:0:0:1",
    )]);

    let report = reconciler(&[""], &resolver, &provider)
        .run_pass()
        .await
        .unwrap();

    assert_eq!(provider.update_call_count(), 0);
    assert_eq!(report.unchanged, 1);
}

#[tokio::test]
async fn configured_domain_is_normalized_before_reaching_the_provider() {
    let resolver = ScriptedResolver::new(Some(ipv4("1.2.3.4")), None);
    let provider = MockDnsProvider::new(vec![
        record("1", "example.com.", "A", "9.9.9.9"),
        record("2", "www.example.com.", "A", "9.9.9.9"),
    ]);

    for domain in ["example.com.", " example.com "] {
        let reconciler = Reconciler::new(
            domain_config(domain, &["", "www"], 60),
            Arc::new(resolver.clone()),
            Box::new(provider.clone()),
        )
        .expect("reconciler construction succeeds");
        assert_eq!(reconciler.domain(), "example.com");

        let report = reconciler.run_pass().await.unwrap();
        assert_eq!(report.domain, "example.com");
        assert_eq!(report.matched, 2);
    }

    assert_eq!(provider.listed_domains(), vec!["example.com", "example.com"]);
}

#[test]
fn invalid_configuration_is_rejected() {
    let resolver = ScriptedResolver::failing();
    let provider = MockDnsProvider::default();

    let result = Reconciler::new(
        domain_config("example.com", &["www"], 0),
        Arc::new(resolver),
        Box::new(provider),
    );

    assert!(matches!(result, Err(dyndns_core::Error::Config(_))));
}
