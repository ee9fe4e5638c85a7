//! Contract Test: Failure Isolation
//!
//! Constraints verified:
//! - Resolution, lookup, update and notification failures never escape a cycle
//! - A failed step skips the rest of its cycle
//! - A failed update is attempted again on the next cycle
//! - An invalid configuration is rejected before any component is used

mod common;

use common::*;
use ipsync_core::{CycleOutcome, Error, SyncEngine, SyncState};
use std::net::Ipv4Addr;

const CURRENT_IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 5);
const PREVIOUS_IP: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 7);

#[tokio::test]
async fn resolution_failure_skips_cycle() {
    let resolver = MockResolver::failing();
    let client = MockDnsClient::with_record("198.51.100.7", false);
    let notifier = MockNotifier::new();

    let engine = SyncEngine::new(
        Box::new(resolver.clone()),
        Box::new(client.clone()),
        Some(Box::new(notifier.clone())),
        &minimal_config(),
    )
    .expect("engine construction succeeds");

    let state = SyncState {
        last_known_ip: Some(PREVIOUS_IP),
    };
    let (next, outcome) = engine.run_cycle(state).await;

    assert!(matches!(outcome, CycleOutcome::ResolutionFailed { .. }));
    assert_eq!(next, state, "state is untouched by a failed cycle");
    assert_eq!(resolver.calls(), 1);
    assert_eq!(client.get_calls(), 0, "record must not be read");
    assert!(client.updates().is_empty());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn lookup_failure_skips_cycle() {
    let client = MockDnsClient::with_record("198.51.100.7", false);
    client.set_fail_lookup(true);
    let notifier = MockNotifier::new();

    let engine = SyncEngine::new(
        Box::new(MockResolver::returning(CURRENT_IP)),
        Box::new(client.clone()),
        Some(Box::new(notifier.clone())),
        &minimal_config(),
    )
    .expect("engine construction succeeds");

    let state = SyncState {
        last_known_ip: Some(PREVIOUS_IP),
    };
    let (next, outcome) = engine.run_cycle(state).await;

    match outcome {
        CycleOutcome::LookupFailed { ip, error } => {
            assert_eq!(ip, CURRENT_IP);
            assert!(error.contains(RECORD_NAME));
        }
        other => panic!("expected LookupFailed, got {:?}", other),
    }
    assert_eq!(next, state, "an unconfirmed IP is not recorded");
    assert!(client.updates().is_empty());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn update_failure_does_not_escape_and_is_retried_next_cycle() {
    let client = MockDnsClient::with_record("198.51.100.7", false);
    client.set_fail_update(true);
    let notifier = MockNotifier::new();

    let engine = SyncEngine::new(
        Box::new(MockResolver::returning(CURRENT_IP)),
        Box::new(client.clone()),
        Some(Box::new(notifier.clone())),
        &minimal_config(),
    )
    .expect("engine construction succeeds");

    let (state, outcome) = engine.run_cycle(SyncState::default()).await;
    assert!(matches!(outcome, CycleOutcome::UpdateFailed { .. }));
    assert_eq!(state.last_known_ip, None);
    assert_eq!(client.updates().len(), 1, "no retry within a cycle");
    assert!(notifier.messages().is_empty(), "no notification on failure");

    // Provider recovers: same decision, next cycle succeeds
    client.set_fail_update(false);
    let (state, outcome) = engine.run_cycle(state).await;
    assert!(matches!(outcome, CycleOutcome::Updated { .. }));
    assert_eq!(state.last_known_ip, Some(CURRENT_IP));
    assert_eq!(client.updates().len(), 2);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn notifier_failure_is_swallowed() {
    let client = MockDnsClient::with_record("198.51.100.7", false);
    let notifier = MockNotifier::failing();

    let engine = SyncEngine::new(
        Box::new(MockResolver::returning(CURRENT_IP)),
        Box::new(client.clone()),
        Some(Box::new(notifier.clone())),
        &minimal_config(),
    )
    .expect("engine construction succeeds");

    let (state, outcome) = engine.run_cycle(SyncState::default()).await;

    assert!(matches!(
        outcome,
        CycleOutcome::Updated { notified: false, .. }
    ));
    assert_eq!(state.last_known_ip, Some(CURRENT_IP));
    assert_eq!(notifier.messages().len(), 1, "delivery was attempted");
    assert_eq!(client.record().content, "203.0.113.5");
}

#[tokio::test]
async fn missing_credential_fails_before_any_call() {
    let resolver = MockResolver::returning(CURRENT_IP);
    let client = MockDnsClient::with_record("198.51.100.7", false);
    let notifier = MockNotifier::new();

    let mut config = minimal_config();
    config.api_token.clear();

    let result = SyncEngine::new(
        Box::new(resolver.clone()),
        Box::new(client.clone()),
        Some(Box::new(notifier.clone())),
        &config,
    );

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(resolver.calls(), 0);
    assert_eq!(client.get_calls(), 0);
    assert!(client.updates().is_empty());
    assert!(notifier.messages().is_empty());
}
