// Decision domain types
//
// A Decision is one human-approval request and its resolution.
// Decision: The Pending -> terminal transition is enforced here, not by callers
// Decision: Ids are UUID v7 so persisted decisions sort by creation time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DecisionError;

/// Identifier of a decision, assigned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(Uuid);

impl DecisionId {
    /// Generate a fresh, time-ordered id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DecisionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for DecisionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Decision status.
/// - `pending`: waiting for a reviewer
/// - `approved` / `rejected`: resolved by a reviewer
/// - `timed_out`: nobody answered before the deadline
/// - `bypassed`: resolved at creation by autonomous policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Pending,
    Approved,
    Rejected,
    TimedOut,
    Bypassed,
}

impl DecisionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, DecisionStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Pending => write!(f, "pending"),
            DecisionStatus::Approved => write!(f, "approved"),
            DecisionStatus::Rejected => write!(f, "rejected"),
            DecisionStatus::TimedOut => write!(f, "timed_out"),
            DecisionStatus::Bypassed => write!(f, "bypassed"),
        }
    }
}

/// One approval request and its resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,
    /// Workflow/agent the decision and its policy overrides are scoped to
    pub owner: String,
    pub category: String,
    pub payload: serde_json::Value,
    /// Human-readable summary shown to the reviewer
    pub rationale: String,
    pub status: DecisionStatus,
    pub requester: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub timeout_seconds: u64,
    pub resolution_note: Option<String>,
}

impl Decision {
    /// Create a pending decision.
    pub fn pending(
        owner: impl Into<String>,
        category: impl Into<String>,
        payload: serde_json::Value,
        rationale: impl Into<String>,
        requester: impl Into<String>,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            id: DecisionId::new(),
            owner: owner.into(),
            category: category.into(),
            payload,
            rationale: rationale.into(),
            status: DecisionStatus::Pending,
            requester: requester.into(),
            created_at: Utc::now(),
            resolved_at: None,
            timeout_seconds,
            resolution_note: None,
        }
    }

    /// Resolve a freshly created decision as bypassed.
    ///
    /// Bypass happens only at creation; a decision that is already
    /// resolved cannot be bypassed.
    pub fn bypass(&mut self, note: impl Into<String>) -> Result<(), DecisionError> {
        if !self.status.is_pending() || self.resolved_at.is_some() {
            return Err(DecisionError::AlreadyResolved(self.id));
        }
        self.status = DecisionStatus::Bypassed;
        self.resolved_at = Some(self.created_at);
        self.resolution_note = Some(note.into());
        Ok(())
    }

    /// Move a pending decision to a terminal status.
    ///
    /// Only `Approved`, `Rejected` and `TimedOut` are reachable this way.
    /// `resolved_at` is written exactly once.
    pub fn resolve(
        &mut self,
        status: DecisionStatus,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DecisionError> {
        if !self.status.is_pending() {
            return Err(DecisionError::AlreadyResolved(self.id));
        }
        if !matches!(
            status,
            DecisionStatus::Approved | DecisionStatus::Rejected | DecisionStatus::TimedOut
        ) {
            return Err(DecisionError::IllegalTransition {
                id: self.id,
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.resolved_at = Some(at);
        self.resolution_note = note;
        Ok(())
    }

    /// Absolute deadline of a pending decision.
    pub fn deadline(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.timeout_seconds).unwrap_or(i64::MAX);
        self.created_at + chrono::Duration::seconds(secs.min(i64::from(i32::MAX)))
    }

    pub fn to_ref(&self) -> DecisionRef {
        DecisionRef {
            id: self.id,
            status: self.status,
            category: self.category.clone(),
        }
    }
}

/// The part of a decision a workflow keeps in its own state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRef {
    pub id: DecisionId,
    pub status: DecisionStatus,
    pub category: String,
}

/// A decision snapshot taken when it entered the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub decision: Decision,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            recorded_at: Utc::now(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.decision.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Decision {
        Decision::pending(
            "portfolio",
            "allocation",
            json!({"risk": "High"}),
            "review allocation",
            "tester",
            5,
        )
    }

    #[test]
    fn test_pending_decision_has_no_resolution() {
        let decision = sample();
        assert_eq!(decision.status, DecisionStatus::Pending);
        assert!(decision.resolved_at.is_none());
        assert!(decision.resolution_note.is_none());
    }

    #[test]
    fn test_resolve_sets_resolved_at_once() {
        let mut decision = sample();
        let at = Utc::now();
        decision
            .resolve(DecisionStatus::Approved, Some("ok".into()), at)
            .unwrap();
        assert_eq!(decision.resolved_at, Some(at));

        let later = at + chrono::Duration::seconds(10);
        let err = decision
            .resolve(DecisionStatus::Rejected, None, later)
            .unwrap_err();
        assert!(matches!(err, DecisionError::AlreadyResolved(_)));
        assert_eq!(decision.status, DecisionStatus::Approved);
        assert_eq!(decision.resolved_at, Some(at));
    }

    #[test]
    fn test_cannot_resolve_to_pending_or_bypassed() {
        let mut decision = sample();
        for status in [DecisionStatus::Pending, DecisionStatus::Bypassed] {
            let err = decision.resolve(status, None, Utc::now()).unwrap_err();
            assert!(matches!(err, DecisionError::IllegalTransition { .. }));
        }
        assert!(decision.status.is_pending());
    }

    #[test]
    fn test_bypass_only_at_creation() {
        let mut decision = sample();
        decision.bypass("autonomous mode enabled").unwrap();
        assert_eq!(decision.status, DecisionStatus::Bypassed);
        assert_eq!(decision.resolved_at, Some(decision.created_at));

        assert!(decision.bypass("again").is_err());
        assert_eq!(
            decision.resolution_note.as_deref(),
            Some("autonomous mode enabled")
        );
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&DecisionStatus::TimedOut).unwrap();
        assert_eq!(json, "\"timed_out\"");
        assert_eq!(DecisionStatus::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn test_decision_id_parses_from_display() {
        let id = DecisionId::new();
        let parsed: DecisionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_deadline_adds_timeout() {
        let decision = sample();
        assert_eq!(
            decision.deadline() - decision.created_at,
            chrono::Duration::seconds(5)
        );
    }
}
