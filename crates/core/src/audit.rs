// Audit record
//
// One record per terminal workflow outcome.
// Decision: The full final state is embedded so a record is self-contained
// Decision: The sequence is assigned by the sink, not by the engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decision::DecisionRef;
use crate::state::{RunStatus, WorkflowState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Monotonic per-sink sequence number, starting at 1
    pub sequence: u64,
    pub invocation_id: Uuid,
    pub owner: String,
    pub status: RunStatus,
    /// Active decision at the time the run ended
    pub decision: Option<DecisionRef>,
    pub state: WorkflowState,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Snapshot a terminal state. The sequence is filled in by the sink.
    pub fn snapshot(state: &WorkflowState) -> Self {
        Self {
            sequence: 0,
            invocation_id: state.invocation_id,
            owner: state.owner.clone(),
            status: state.status.clone(),
            decision: state.active_decision().cloned(),
            state: state.clone(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Decision;

    #[test]
    fn test_snapshot_copies_active_decision() {
        let mut state = WorkflowState::new("compliance_monitor");
        let decision = Decision::pending(
            "compliance_monitor",
            "compliance_review",
            serde_json::json!({}),
            "review",
            "engine",
            60,
        );
        state.record_decision(&decision);
        state.status = RunStatus::Completed;

        let record = AuditRecord::snapshot(&state).with_sequence(7);
        assert_eq!(record.sequence, 7);
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.decision.map(|d| d.id), Some(decision.id));
        assert_eq!(record.invocation_id, state.invocation_id);
    }
}
