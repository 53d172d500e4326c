//! DecisionCoordinator implementation

use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use tradegate_core::{Decision, DecisionId, DecisionStatus, HistoryEntry};

use super::policy::{Policy, PolicySnapshot};
use super::request::{CompletionCallback, DecisionRequest};
use crate::config::CoordinatorConfig;
use crate::persistence::{DecisionSnapshot, DecisionStore, JsonFileDecisionStore, StoreError};

/// Resolution note of decisions bypassed by policy
pub const BYPASS_NOTE: &str = "autonomous mode enabled";
/// Default note for an approval without reviewer comment
pub const APPROVED_NOTE: &str = "approved by reviewer";
/// Default note for a rejection without reviewer comment
pub const REJECTED_NOTE: &str = "rejected by reviewer";

/// Counts over the coordinator's indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    pub pending: usize,
    pub resolved: usize,
    pub history: usize,
    pub approved: usize,
    pub rejected: usize,
    pub timed_out: usize,
    pub bypassed: usize,
}

/// Everything guarded by the coordinator mutex
#[derive(Default)]
struct Ledger {
    pending: HashMap<DecisionId, Decision>,
    resolved: HashMap<DecisionId, Decision>,
    /// Newest first
    history: VecDeque<HistoryEntry>,
    timers: HashMap<DecisionId, JoinHandle<()>>,
    callbacks: HashMap<DecisionId, CompletionCallback>,
}

impl Ledger {
    fn record_history(&mut self, decision: Decision, cap: usize) {
        self.history.push_front(HistoryEntry::new(decision));
        self.history.truncate(cap);
    }

    fn persist(&mut self, store: &dyn DecisionStore) {
        let history = self.history.make_contiguous();
        let mut decisions: Vec<&Decision> = self
            .pending
            .values()
            .chain(self.resolved.values())
            .collect();
        decisions.sort_by_key(|d| (d.created_at, d.id));

        if let Err(err) = store.save(&decisions, history) {
            warn!(error = %err, "failed to persist decision state; in-memory state stays authoritative");
        }
    }

    fn get(&self, id: &DecisionId) -> Option<&Decision> {
        self.pending.get(id).or_else(|| self.resolved.get(id))
    }
}

struct Inner {
    config: CoordinatorConfig,
    store: Arc<dyn DecisionStore>,
    policy: RwLock<Policy>,
    ledger: Mutex<Ledger>,
    resolutions: broadcast::Sender<Decision>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (_, timer) in self.ledger.get_mut().timers.drain() {
            timer.abort();
        }
    }
}

/// Process-wide authority over human-approval decisions.
///
/// Creates decisions, applies the bypass policy, times out unanswered
/// decisions and records approvals and rejections. Every mutation is
/// persisted before the call returns.
///
/// The handle is cheap to clone; all clones share one state.
///
/// # Example
///
/// ```ignore
/// use tradegate_durable::prelude::*;
///
/// let coordinator = DecisionCoordinator::from_config(CoordinatorConfig::from_env()).await?;
/// coordinator.set_owner_override("portfolio_optimizer", true);
///
/// let decision = coordinator
///     .request_decision(DecisionRequest::new("portfolio_optimizer", "allocation"))
///     .await;
///
/// // later, from a reviewer
/// coordinator.approve(decision.id, Some("looks good".into()));
/// ```
#[derive(Clone)]
pub struct DecisionCoordinator {
    inner: Arc<Inner>,
}

impl DecisionCoordinator {
    /// Open a coordinator persisting to `config.data_dir`
    pub async fn from_config(config: CoordinatorConfig) -> Result<Self, StoreError> {
        let store = JsonFileDecisionStore::open(&config.data_dir)?;
        Ok(Self::open(Arc::new(store), config).await)
    }

    /// Open a coordinator over `store`.
    ///
    /// Persisted decisions are loaded into the indices. Pending ones get their
    /// timers re-armed for the remaining time; those past their deadline time
    /// out immediately.
    #[instrument(skip_all, fields(history_cap = config.history_cap))]
    pub async fn open(store: Arc<dyn DecisionStore>, config: CoordinatorConfig) -> Self {
        let snapshot = match store.load() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "failed to load persisted decisions; starting empty");
                DecisionSnapshot::default()
            }
        };

        let mut ledger = Ledger::default();
        for decision in snapshot.decisions {
            if decision.status.is_pending() {
                ledger.pending.insert(decision.id, decision);
            } else {
                ledger.resolved.insert(decision.id, decision);
            }
        }
        ledger.history = snapshot.history.into();
        ledger.history.truncate(config.history_cap);

        let (resolutions, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let policy = Policy::new(config.autonomous, config.default_requires_human);

        let coordinator = Self {
            inner: Arc::new(Inner {
                config,
                store,
                policy: RwLock::new(policy),
                ledger: Mutex::new(ledger),
                resolutions,
            }),
        };
        coordinator.recover();
        coordinator
    }

    fn recover(&self) {
        let now = Utc::now();
        let mut overdue = Vec::new();
        let mut restored = 0usize;
        {
            let mut ledger = self.inner.ledger.lock();
            let deadlines: Vec<_> = ledger
                .pending
                .values()
                .map(|d| (d.id, d.deadline()))
                .collect();
            for (id, deadline) in deadlines {
                match (deadline - now).to_std() {
                    Ok(remaining) if !remaining.is_zero() => {
                        self.arm_timer(&mut ledger, id, remaining);
                        restored += 1;
                    }
                    _ => overdue.push(id),
                }
            }
        }

        if restored > 0 || !overdue.is_empty() {
            info!(
                restored,
                overdue = overdue.len(),
                "recovered pending decisions"
            );
        }
        for id in overdue {
            self.expire(id);
        }
    }

    /// Spawn the timeout task. Called with the ledger locked so the timer
    /// cannot fire before its handle is registered.
    fn arm_timer(&self, ledger: &mut Ledger, id: DecisionId, after: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = weak.upgrade() {
                DecisionCoordinator { inner }.expire(id);
            }
        });
        ledger.timers.insert(id, handle);
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a decision.
    ///
    /// Bypassed immediately when the owner does not require a human, otherwise
    /// stored as pending with a timeout armed. Never waits for a reviewer.
    #[instrument(skip(self, request), fields(owner = %request.owner, category = %request.category))]
    pub async fn request_decision(&self, request: DecisionRequest) -> Decision {
        let DecisionRequest {
            owner,
            category,
            payload,
            rationale,
            requester,
            timeout,
            on_complete,
        } = request;
        let timeout = timeout.unwrap_or(self.inner.config.default_timeout);
        let requires_human = self.requires_human(&owner);
        // Whole seconds, rounded up so a sub-second timeout is never recorded as 0
        let timeout_seconds = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);

        let mut decision = Decision::pending(
            owner,
            category,
            payload,
            rationale,
            requester,
            timeout_seconds,
        );
        let id = decision.id;

        if !requires_human && decision.bypass(BYPASS_NOTE).is_ok() {
            let mut ledger = self.inner.ledger.lock();
            ledger.resolved.insert(id, decision.clone());
            ledger.record_history(decision.clone(), self.inner.config.history_cap);
            ledger.persist(self.inner.store.as_ref());
            drop(ledger);

            info!(decision_id = %id, "decision bypassed by autonomous policy");
            return decision;
        }

        let mut ledger = self.inner.ledger.lock();
        ledger.pending.insert(id, decision.clone());
        if let Some(callback) = on_complete {
            ledger.callbacks.insert(id, callback);
        }
        ledger.persist(self.inner.store.as_ref());
        self.arm_timer(&mut ledger, id, timeout);
        drop(ledger);

        info!(
            decision_id = %id,
            timeout_secs = timeout_seconds,
            "decision pending review"
        );
        decision
    }

    /// Approve a pending decision. Returns `false` if the id is unknown or
    /// already resolved.
    #[instrument(skip(self, note), fields(decision_id = %id))]
    pub fn approve(&self, id: DecisionId, note: Option<String>) -> bool {
        self.settle(id, DecisionStatus::Approved, note).is_some()
    }

    /// Reject a pending decision. Returns `false` if the id is unknown or
    /// already resolved.
    #[instrument(skip(self, note), fields(decision_id = %id))]
    pub fn reject(&self, id: DecisionId, note: Option<String>) -> bool {
        self.settle(id, DecisionStatus::Rejected, note).is_some()
    }

    /// Timeout action. A decision resolved in the meantime is left untouched.
    fn expire(&self, id: DecisionId) {
        if self.settle(id, DecisionStatus::TimedOut, None).is_none() {
            debug!(decision_id = %id, "timer fired for an already resolved decision");
        }
    }

    /// Move a pending decision to `status` under the lock, then notify.
    fn settle(
        &self,
        id: DecisionId,
        status: DecisionStatus,
        note: Option<String>,
    ) -> Option<Decision> {
        let (decision, callback) = {
            let mut ledger = self.inner.ledger.lock();
            let mut decision = ledger.pending.remove(&id)?;

            let note = note.unwrap_or_else(|| default_note(status, &decision));
            if let Err(err) = decision.resolve(status, Some(note), Utc::now()) {
                warn!(decision_id = %id, error = %err, "refused decision transition");
                ledger.pending.insert(id, decision);
                return None;
            }

            if let Some(timer) = ledger.timers.remove(&id) {
                // The timeout path runs inside the timer task itself
                if status != DecisionStatus::TimedOut {
                    timer.abort();
                }
            }
            ledger.resolved.insert(id, decision.clone());
            ledger.record_history(decision.clone(), self.inner.config.history_cap);
            ledger.persist(self.inner.store.as_ref());
            (decision, ledger.callbacks.remove(&id))
        };

        info!(
            decision_id = %id,
            owner = %decision.owner,
            status = %decision.status,
            "decision resolved"
        );

        if let Some(callback) = callback {
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(&decision))).is_err() {
                error!(decision_id = %id, "completion callback panicked");
            }
        }
        // No subscribers is not an error
        let _ = self.inner.resolutions.send(decision.clone());

        Some(decision)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get_decision(&self, id: DecisionId) -> Option<Decision> {
        self.inner.ledger.lock().get(&id).cloned()
    }

    /// Pending decisions, oldest first
    pub fn list_pending(&self, owner: Option<&str>) -> Vec<Decision> {
        let ledger = self.inner.ledger.lock();
        let mut pending: Vec<Decision> = ledger
            .pending
            .values()
            .filter(|d| owner.map_or(true, |o| d.owner == o))
            .cloned()
            .collect();
        drop(ledger);
        pending.sort_by_key(|d| (d.created_at, d.id));
        pending
    }

    /// History entries, newest first
    pub fn history(&self, owner: Option<&str>, limit: usize) -> Vec<HistoryEntry> {
        self.inner
            .ledger
            .lock()
            .history
            .iter()
            .filter(|entry| owner.map_or(true, |o| entry.owner() == o))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> CoordinatorStats {
        let ledger = self.inner.ledger.lock();
        let mut stats = CoordinatorStats {
            pending: ledger.pending.len(),
            resolved: ledger.resolved.len(),
            history: ledger.history.len(),
            ..Default::default()
        };
        for decision in ledger.resolved.values() {
            match decision.status {
                DecisionStatus::Approved => stats.approved += 1,
                DecisionStatus::Rejected => stats.rejected += 1,
                DecisionStatus::TimedOut => stats.timed_out += 1,
                DecisionStatus::Bypassed => stats.bypassed += 1,
                DecisionStatus::Pending => {}
            }
        }
        stats
    }

    /// Number of armed timeout timers
    pub fn armed_timers(&self) -> usize {
        self.inner.ledger.lock().timers.len()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // =========================================================================
    // Resolution stream
    // =========================================================================

    /// Every decision that leaves pending (approve, reject, timeout)
    pub fn subscribe(&self) -> broadcast::Receiver<Decision> {
        self.inner.resolutions.subscribe()
    }

    /// Wait until the decision is no longer pending or `timeout` elapses.
    ///
    /// Returns the latest view of the decision (still pending if the wait
    /// elapsed), or `None` if the id is unknown.
    pub async fn wait_for_resolution(
        &self,
        id: DecisionId,
        timeout: Duration,
    ) -> Option<Decision> {
        let mut resolutions = self.subscribe();
        let current = self.get_decision(id)?;
        if current.status.is_terminal() {
            return Some(current);
        }

        let wait = async {
            loop {
                match resolutions.recv().await {
                    Ok(decision) if decision.id == id => return Some(decision),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "resolution stream lagged; re-reading decision");
                        if let Some(decision) =
                            self.get_decision(id).filter(|d| d.status.is_terminal())
                        {
                            return Some(decision);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(Some(decision)) => Some(decision),
            _ => self.get_decision(id),
        }
    }

    // =========================================================================
    // Policy
    // =========================================================================

    pub fn set_autonomous(&self, enabled: bool) {
        self.inner.policy.write().set_autonomous(enabled);
        info!(enabled, "autonomous mode updated");
    }

    pub fn set_owner_override(&self, owner: impl Into<String>, requires_human: bool) {
        let owner = owner.into();
        info!(owner = %owner, requires_human, "owner override set");
        self.inner.policy.write().set_override(owner, requires_human);
    }

    /// Remove an owner override, returning the previous value
    pub fn clear_owner_override(&self, owner: &str) -> Option<bool> {
        self.inner.policy.write().clear_override(owner)
    }

    pub fn requires_human(&self, owner: &str) -> bool {
        self.inner.policy.read().requires_human(owner)
    }

    pub fn policy(&self) -> PolicySnapshot {
        self.inner.policy.read().snapshot()
    }
}

impl std::fmt::Debug for DecisionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionCoordinator")
            .field("stats", &self.stats())
            .field("policy", &self.policy())
            .finish()
    }
}

fn default_note(status: DecisionStatus, decision: &Decision) -> String {
    match status {
        DecisionStatus::Approved => APPROVED_NOTE.to_string(),
        DecisionStatus::Rejected => REJECTED_NOTE.to_string(),
        _ => format!("timed out after {} seconds", decision.timeout_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryDecisionStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn coordinator(config: CoordinatorConfig) -> (DecisionCoordinator, Arc<InMemoryDecisionStore>) {
        let store = Arc::new(InMemoryDecisionStore::new());
        let coordinator = DecisionCoordinator::open(store.clone(), config).await;
        (coordinator, store)
    }

    fn gated_config() -> CoordinatorConfig {
        CoordinatorConfig::default().with_default_requires_human(true)
    }

    #[tokio::test]
    async fn test_bypass_when_no_review_required() {
        let (coordinator, store) = coordinator(CoordinatorConfig::default()).await;

        let decision = coordinator
            .request_decision(DecisionRequest::new("market_data", "data_review"))
            .await;

        assert_eq!(decision.status, DecisionStatus::Bypassed);
        assert_eq!(decision.resolution_note.as_deref(), Some(BYPASS_NOTE));
        assert!(decision.resolved_at.is_some());
        assert_eq!(coordinator.armed_timers(), 0);
        assert_eq!(coordinator.history(None, 10).len(), 1);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_pending_decision_is_persisted_and_timed() {
        let (coordinator, store) = coordinator(gated_config()).await;

        let decision = coordinator
            .request_decision(
                DecisionRequest::new("portfolio_optimizer", "allocation")
                    .with_payload(json!({"budget": 250000})),
            )
            .await;

        assert_eq!(decision.status, DecisionStatus::Pending);
        assert_eq!(decision.timeout_seconds, 300);
        assert_eq!(coordinator.armed_timers(), 1);
        assert_eq!(store.snapshot().decisions, vec![decision.clone()]);
        assert!(coordinator.history(None, 10).is_empty());
    }

    #[tokio::test]
    async fn test_second_resolution_is_a_noop() {
        let (coordinator, _) = coordinator(gated_config()).await;
        let decision = coordinator
            .request_decision(DecisionRequest::new("portfolio_optimizer", "allocation"))
            .await;

        assert!(coordinator.approve(decision.id, None));
        assert!(!coordinator.reject(decision.id, Some("too late".into())));

        let stored = coordinator.get_decision(decision.id).unwrap();
        assert_eq!(stored.status, DecisionStatus::Approved);
        assert_eq!(stored.resolution_note.as_deref(), Some(APPROVED_NOTE));
        assert_eq!(coordinator.armed_timers(), 0);
        assert_eq!(coordinator.history(None, 10).len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_returns_false() {
        let (coordinator, store) = coordinator(gated_config()).await;
        assert!(!coordinator.approve(DecisionId::new(), None));
        assert!(!coordinator.reject(DecisionId::new(), None));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_callback_runs_once_and_panics_are_contained() {
        let (coordinator, _) = coordinator(gated_config()).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let first = coordinator
            .request_decision(
                DecisionRequest::new("timing_advisor", "entry").on_complete(move |d| {
                    assert_eq!(d.status, DecisionStatus::Rejected);
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;
        let second = coordinator
            .request_decision(
                DecisionRequest::new("timing_advisor", "entry")
                    .on_complete(|_| panic!("callback failure")),
            )
            .await;

        assert!(coordinator.reject(first.id, None));
        assert!(!coordinator.reject(first.id, None));
        assert!(coordinator.approve(second.id, None));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            coordinator.get_decision(second.id).unwrap().status,
            DecisionStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_memory_authoritative() {
        let (coordinator, store) = coordinator(gated_config()).await;
        store.set_failing(true);

        let decision = coordinator
            .request_decision(DecisionRequest::new("compliance_monitor", "review"))
            .await;
        assert!(coordinator.approve(decision.id, None));

        assert_eq!(
            coordinator.get_decision(decision.id).unwrap().status,
            DecisionStatus::Approved
        );
        assert!(store.snapshot().decisions.is_empty());
    }

    #[tokio::test]
    async fn test_list_pending_filters_and_orders() {
        let (coordinator, _) = coordinator(gated_config()).await;
        let a = coordinator
            .request_decision(DecisionRequest::new("portfolio_optimizer", "allocation"))
            .await;
        let b = coordinator
            .request_decision(DecisionRequest::new("timing_advisor", "entry"))
            .await;
        let c = coordinator
            .request_decision(DecisionRequest::new("portfolio_optimizer", "allocation"))
            .await;

        let ids: Vec<_> = coordinator.list_pending(None).iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);

        let ids: Vec<_> = coordinator
            .list_pending(Some("portfolio_optimizer"))
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_capped() {
        let (coordinator, store) = coordinator(CoordinatorConfig::default().with_history_cap(3)).await;

        let mut ids = Vec::new();
        for _ in 0..5 {
            let decision = coordinator
                .request_decision(DecisionRequest::new("market_data", "data_review"))
                .await;
            ids.push(decision.id);
        }

        let history: Vec<_> = coordinator
            .history(None, 10)
            .iter()
            .map(|e| e.decision.id)
            .collect();
        assert_eq!(history, vec![ids[4], ids[3], ids[2]]);
        assert_eq!(store.snapshot().history.len(), 3);
        // The resolved index keeps everything
        assert_eq!(coordinator.stats().resolved, 5);
        assert_eq!(coordinator.stats().bypassed, 5);
    }

    #[tokio::test]
    async fn test_policy_controls() {
        let (coordinator, _) = coordinator(CoordinatorConfig::default()).await;
        assert!(!coordinator.requires_human("portfolio_optimizer"));

        coordinator.set_owner_override("portfolio_optimizer", true);
        assert!(coordinator.requires_human("portfolio_optimizer"));

        coordinator.set_autonomous(true);
        assert!(!coordinator.requires_human("portfolio_optimizer"));
        assert!(coordinator.policy().autonomous);

        coordinator.set_autonomous(false);
        assert_eq!(coordinator.clear_owner_override("portfolio_optimizer"), Some(true));
        assert!(!coordinator.requires_human("portfolio_optimizer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_with_default_note() {
        let (coordinator, _) = coordinator(gated_config()).await;
        let decision = coordinator
            .request_decision(
                DecisionRequest::new("timing_advisor", "entry").with_timeout(Duration::from_secs(2)),
            )
            .await;

        tokio::time::sleep(Duration::from_millis(2100)).await;

        let stored = coordinator.get_decision(decision.id).unwrap();
        assert_eq!(stored.status, DecisionStatus::TimedOut);
        assert_eq!(
            stored.resolution_note.as_deref(),
            Some("timed out after 2 seconds")
        );
        assert_eq!(coordinator.armed_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_timeout_rounds_up() {
        let (coordinator, _) = coordinator(gated_config()).await;
        let decision = coordinator
            .request_decision(
                DecisionRequest::new("timing_advisor", "entry")
                    .with_timeout(Duration::from_millis(500)),
            )
            .await;
        assert_eq!(decision.timeout_seconds, 1);

        tokio::time::sleep(Duration::from_millis(600)).await;

        let stored = coordinator.get_decision(decision.id).unwrap();
        assert_eq!(stored.status, DecisionStatus::TimedOut);
        assert_eq!(
            stored.resolution_note.as_deref(),
            Some("timed out after 1 seconds")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_resolution() {
        let (coordinator, _) = coordinator(gated_config()).await;
        let decision = coordinator
            .request_decision(DecisionRequest::new("portfolio_optimizer", "allocation"))
            .await;

        let reviewer = coordinator.clone();
        let id = decision.id;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            reviewer.approve(id, Some("ok".into()));
        });

        let resolved = coordinator
            .wait_for_resolution(id, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(resolved.status, DecisionStatus::Approved);

        let other = coordinator
            .request_decision(DecisionRequest::new("portfolio_optimizer", "allocation"))
            .await;
        let still_pending = coordinator
            .wait_for_resolution(other.id, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(still_pending.status, DecisionStatus::Pending);

        assert!(coordinator
            .wait_for_resolution(DecisionId::new(), Duration::from_secs(1))
            .await
            .is_none());
    }
}
