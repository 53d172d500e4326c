//! In-memory implementation of DecisionStore for testing

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use tradegate_core::{Decision, HistoryEntry};

use super::store::*;

/// In-memory implementation of DecisionStore
///
/// Keeps the last saved snapshot. Writes can be made to fail on demand so
/// callers can exercise their error paths.
///
/// # Example
///
/// ```
/// use tradegate_durable::InMemoryDecisionStore;
///
/// let store = InMemoryDecisionStore::new();
/// assert_eq!(store.save_count(), 0);
/// ```
#[derive(Default)]
pub struct InMemoryDecisionStore {
    snapshot: RwLock<DecisionSnapshot>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryDecisionStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a snapshot
    pub fn with_snapshot(snapshot: DecisionSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    /// Last saved snapshot
    pub fn snapshot(&self) -> DecisionSnapshot {
        self.snapshot.read().clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following save fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl DecisionStore for InMemoryDecisionStore {
    fn load(&self) -> Result<DecisionSnapshot, StoreError> {
        Ok(self.snapshot.read().clone())
    }

    fn save(&self, decisions: &[&Decision], history: &[HistoryEntry]) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        *self.snapshot.write() = DecisionSnapshot {
            decisions: decisions.iter().map(|d| (*d).clone()).collect(),
            history: history.to_vec(),
        };
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_then_load() {
        let store = InMemoryDecisionStore::new();
        let decision = Decision::pending("portfolio", "allocation", json!({}), "r", "u", 5);
        let history = vec![HistoryEntry::new(decision.clone())];

        store.save(&[&decision], &history).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.decisions, vec![decision]);
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_failing_store_keeps_previous_snapshot() {
        let store = InMemoryDecisionStore::new();
        store.set_failing(true);
        let decision = Decision::pending("portfolio", "allocation", json!({}), "r", "u", 5);

        let err = store.save(&[&decision], &[]).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.load().unwrap().decisions.is_empty());
        assert_eq!(store.save_count(), 0);
    }
}
