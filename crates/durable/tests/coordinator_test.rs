//! Integration tests for DecisionCoordinator
//!
//! Timer tests run on a paused tokio clock, so they complete instantly.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use tradegate_core::{Decision, DecisionStatus};
use tradegate_durable::coordinator::{DecisionCoordinator, DecisionRequest, BYPASS_NOTE};
use tradegate_durable::persistence::{
    DecisionSnapshot, DecisionStore, InMemoryDecisionStore, JsonFileDecisionStore,
};
use tradegate_durable::CoordinatorConfig;

async fn memory_coordinator(config: CoordinatorConfig) -> DecisionCoordinator {
    DecisionCoordinator::open(Arc::new(InMemoryDecisionStore::new()), config).await
}

fn allocation_request() -> DecisionRequest {
    DecisionRequest::new("portfolio", "allocation")
        .with_payload(json!({"risk": "High", "budget": 150000}))
        .with_rationale("large high-risk allocation")
        .with_requester("alice")
}

#[test_log::test(tokio::test)]
async fn test_scenario_override_then_approve() {
    let coordinator = memory_coordinator(CoordinatorConfig::default()).await;
    coordinator.set_owner_override("portfolio", true);

    let decision = coordinator.request_decision(allocation_request()).await;
    assert_eq!(decision.status, DecisionStatus::Pending);
    assert!(decision.resolved_at.is_none());

    assert!(coordinator.approve(decision.id, Some("ok".into())));

    let approved = coordinator.get_decision(decision.id).unwrap();
    assert_eq!(approved.status, DecisionStatus::Approved);
    assert_eq!(approved.resolution_note.as_deref(), Some("ok"));
    assert!(approved.resolved_at.is_some());

    let history = coordinator.history(Some("portfolio"), 10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].decision.id, decision.id);
    assert!(coordinator.list_pending(None).is_empty());
}

#[test_log::test(tokio::test)]
async fn test_scenario_autonomous_bypass() {
    let coordinator = memory_coordinator(CoordinatorConfig::default()).await;
    coordinator.set_owner_override("portfolio", true);
    coordinator.set_autonomous(true);

    let decision = coordinator.request_decision(allocation_request()).await;
    assert_eq!(decision.status, DecisionStatus::Bypassed);
    assert_eq!(decision.resolution_note.as_deref(), Some("autonomous mode enabled"));
    assert_eq!(decision.resolution_note.as_deref(), Some(BYPASS_NOTE));
    assert!(decision.resolved_at.is_some());

    // Nothing to approve
    assert!(!coordinator.approve(decision.id, None));
    assert_eq!(
        coordinator.get_decision(decision.id).unwrap().status,
        DecisionStatus::Bypassed
    );
}

#[test_log::test(tokio::test)]
async fn test_autonomous_from_config() {
    let coordinator = memory_coordinator(
        CoordinatorConfig::default()
            .with_autonomous(true)
            .with_default_requires_human(true),
    )
    .await;

    for owner in ["portfolio", "timing", "compliance"] {
        let decision = coordinator
            .request_decision(DecisionRequest::new(owner, "review"))
            .await;
        assert_eq!(decision.status, DecisionStatus::Bypassed);
        assert!(decision.resolved_at.is_some());
    }
    assert_eq!(coordinator.stats().bypassed, 3);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_scenario_timeout_without_resolution() {
    let coordinator =
        memory_coordinator(CoordinatorConfig::default().with_default_requires_human(true)).await;

    let decision = coordinator
        .request_decision(allocation_request().with_timeout(Duration::from_secs(1)))
        .await;

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let timed_out = coordinator.get_decision(decision.id).unwrap();
    assert_eq!(timed_out.status, DecisionStatus::TimedOut);
    assert_eq!(
        timed_out.resolution_note.as_deref(),
        Some("timed out after 1 seconds")
    );
    assert_eq!(coordinator.history(None, 10).len(), 1);
    assert_eq!(coordinator.armed_timers(), 0);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_approval_before_deadline_wins_race() {
    let coordinator =
        memory_coordinator(CoordinatorConfig::default().with_default_requires_human(true)).await;
    let mut resolutions = coordinator.subscribe();

    let decision = coordinator
        .request_decision(allocation_request().with_timeout(Duration::from_secs(1)))
        .await;

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(coordinator.approve(decision.id, None));

    tokio::time::sleep(Duration::from_millis(300)).await;

    let stored = coordinator.get_decision(decision.id).unwrap();
    assert_eq!(stored.status, DecisionStatus::Approved);
    assert_eq!(coordinator.history(None, 10).len(), 1);

    // Exactly one resolution was broadcast
    let resolved = resolutions.recv().await.unwrap();
    assert_eq!(resolved.status, DecisionStatus::Approved);
    assert!(resolutions.try_recv().is_err());
}

#[test_log::test(tokio::test)]
async fn test_reject_then_approve_only_first_applies() {
    let coordinator =
        memory_coordinator(CoordinatorConfig::default().with_default_requires_human(true)).await;
    let decision = coordinator.request_decision(allocation_request()).await;

    assert!(coordinator.reject(decision.id, Some("too risky".into())));
    let after_reject = coordinator.get_decision(decision.id).unwrap();

    assert!(!coordinator.approve(decision.id, Some("changed my mind".into())));
    let after_approve = coordinator.get_decision(decision.id).unwrap();

    assert_eq!(after_reject, after_approve);
    assert_eq!(after_approve.status, DecisionStatus::Rejected);
    assert_eq!(after_approve.resolution_note.as_deref(), Some("too risky"));
}

#[test_log::test(tokio::test)]
async fn test_reads_are_idempotent() {
    let coordinator =
        memory_coordinator(CoordinatorConfig::default().with_default_requires_human(true)).await;
    let decision = coordinator.request_decision(allocation_request()).await;

    let first = coordinator.get_decision(decision.id);
    let second = coordinator.get_decision(decision.id);
    assert_eq!(first, second);
    assert_eq!(
        coordinator.list_pending(Some("portfolio")),
        coordinator.list_pending(Some("portfolio"))
    );
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_reopen_restores_state_and_pending_timer() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoordinatorConfig::default()
        .with_data_dir(dir.path())
        .with_default_requires_human(true);

    let (approved_id, pending_id) = {
        let coordinator = DecisionCoordinator::from_config(config.clone()).await.unwrap();
        let approved = coordinator.request_decision(allocation_request()).await;
        let pending = coordinator
            .request_decision(
                DecisionRequest::new("timing", "entry").with_timeout(Duration::from_secs(2)),
            )
            .await;
        assert!(coordinator.approve(approved.id, Some("ok".into())));
        (approved.id, pending.id)
    };

    let reopened = DecisionCoordinator::from_config(config).await.unwrap();
    assert_eq!(
        reopened.get_decision(approved_id).unwrap().status,
        DecisionStatus::Approved
    );
    assert_eq!(reopened.history(None, 10).len(), 1);
    assert_eq!(
        reopened
            .list_pending(None)
            .iter()
            .map(|d| d.id)
            .collect::<Vec<_>>(),
        vec![pending_id]
    );
    assert_eq!(reopened.armed_timers(), 1);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(
        reopened.get_decision(pending_id).unwrap().status,
        DecisionStatus::TimedOut
    );

    // And the timeout itself was persisted
    let on_disk = JsonFileDecisionStore::open(dir.path()).unwrap().load().unwrap();
    let persisted = on_disk
        .decisions
        .iter()
        .find(|d| d.id == pending_id)
        .unwrap();
    assert_eq!(persisted.status, DecisionStatus::TimedOut);
    assert_eq!(on_disk.history.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_overdue_pending_decision_times_out_on_open() {
    let mut stale = Decision::pending("market_data", "data_review", json!({}), "stale", "bob", 60);
    stale.created_at = Utc::now() - chrono::Duration::minutes(10);
    let store = Arc::new(InMemoryDecisionStore::with_snapshot(DecisionSnapshot {
        decisions: vec![stale.clone()],
        history: Vec::new(),
    }));

    let coordinator = DecisionCoordinator::open(store.clone(), CoordinatorConfig::default()).await;

    let recovered = coordinator.get_decision(stale.id).unwrap();
    assert_eq!(recovered.status, DecisionStatus::TimedOut);
    assert_eq!(
        recovered.resolution_note.as_deref(),
        Some("timed out after 60 seconds")
    );
    assert_eq!(coordinator.armed_timers(), 0);
    assert_eq!(
        store.snapshot().decisions[0].status,
        DecisionStatus::TimedOut
    );
}

#[test_log::test(tokio::test)]
async fn test_history_cap_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoordinatorConfig::default()
        .with_data_dir(dir.path())
        .with_history_cap(2);

    let mut ids = Vec::new();
    {
        let coordinator = DecisionCoordinator::from_config(config.clone()).await.unwrap();
        for _ in 0..4 {
            ids.push(
                coordinator
                    .request_decision(DecisionRequest::new("market_data", "data_review"))
                    .await
                    .id,
            );
        }
    }

    let reopened = DecisionCoordinator::from_config(config).await.unwrap();
    let history: Vec<_> = reopened
        .history(None, 10)
        .into_iter()
        .map(|e| e.decision.id)
        .collect();
    assert_eq!(history, vec![ids[3], ids[2]]);
    // Evicted from history, still known
    assert!(reopened.get_decision(ids[0]).is_some());
}
