// Workflow state
//
// The per-invocation record threaded through workflow steps.
// Decision: One concrete record for every agent; agent-specific values live in the
// keyed `data` and `scores` maps instead of per-agent state structs
// Decision: List fields only grow through the mutators below

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collaborators::{Allocation, Violation};
use crate::decision::{Decision, DecisionRef, DecisionStatus};

/// Status discriminator callers must branch on before trusting outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    /// Steps are still executing
    Running,
    /// Halted at a gate waiting for a decision; resume later
    Suspended { at: String },
    /// Reached a terminal marker normally
    Completed,
    /// Reached a terminal marker through the escalation path
    Escalated { reason: String },
    /// A step failed; outputs are partial
    Failed { step: String, message: String },
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Escalated { .. } | RunStatus::Failed { .. }
        )
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, RunStatus::Suspended { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Suspended { .. } => "suspended",
            RunStatus::Completed => "completed",
            RunStatus::Escalated { .. } => "escalated",
            RunStatus::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Suspended { at } => write!(f, "suspended at {at}"),
            RunStatus::Escalated { reason } => write!(f, "escalated: {reason}"),
            RunStatus::Failed { step, message } => write!(f, "failed in {step}: {message}"),
            other => f.write_str(other.label()),
        }
    }
}

/// A recovered problem: the workflow continued with a default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    /// Step or collaborator that degraded
    pub source: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Per-invocation record. Never shared across invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub invocation_id: Uuid,
    pub owner: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Caller parameters, normalised by validation
    pub inputs: serde_json::Map<String, serde_json::Value>,
    /// Collected data by name
    pub data: BTreeMap<String, serde_json::Value>,
    /// Computed scores by name
    pub scores: BTreeMap<String, f64>,
    /// Ranked allocation suggestions from the latest scoring pass
    pub recommendations: Vec<Allocation>,
    /// Rule violations from every evaluation pass; only grows via `push_violations`
    violations: Vec<Violation>,

    /// Every decision requested during this invocation; the last one is active
    pub decisions: Vec<DecisionRef>,
    /// Opaque narration log; never read by routing
    pub narration: Vec<String>,
    pub degradations: Vec<Degradation>,
    /// Executed step names, in order
    pub path: Vec<String>,

    pub status: RunStatus,
    /// Set by an escalation step; turns the terminal status into `Escalated`
    pub escalation: Option<String>,
}

impl WorkflowState {
    pub fn new(owner: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            invocation_id: Uuid::now_v7(),
            owner: owner.into(),
            started_at: now,
            updated_at: now,
            inputs: serde_json::Map::new(),
            data: BTreeMap::new(),
            scores: BTreeMap::new(),
            recommendations: Vec::new(),
            violations: Vec::new(),
            decisions: Vec::new(),
            narration: Vec::new(),
            degradations: Vec::new(),
            path: Vec::new(),
            status: RunStatus::Running,
            escalation: None,
        }
    }

    /// Set a caller input
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn input(&self, key: &str) -> Option<&serde_json::Value> {
        self.inputs.get(key)
    }

    pub fn input_f64(&self, key: &str) -> Option<f64> {
        self.inputs.get(key).and_then(serde_json::Value::as_f64)
    }

    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(serde_json::Value::as_str)
    }

    pub fn set_input(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.inputs.insert(key.into(), value.into());
        self.touch();
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
        self.touch();
    }

    pub fn data(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    pub fn set_score(&mut self, key: impl Into<String>, value: f64) {
        self.scores.insert(key.into(), value);
        self.touch();
    }

    pub fn score(&self, key: &str) -> Option<f64> {
        self.scores.get(key).copied()
    }

    pub fn set_recommendations(&mut self, recommendations: Vec<Allocation>) {
        self.recommendations = recommendations;
        self.touch();
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn push_violations(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.violations.extend(violations);
        self.touch();
    }

    pub fn narrate(&mut self, line: impl Into<String>) {
        self.narration.push(line.into());
        self.touch();
    }

    pub fn degrade(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.degradations.push(Degradation {
            source: source.into(),
            message: message.into(),
            at: Utc::now(),
        });
        self.touch();
    }

    /// Record a newly requested decision as the active one
    pub fn record_decision(&mut self, decision: &Decision) {
        self.decisions.push(decision.to_ref());
        self.touch();
    }

    /// Refresh the status of the active decision
    pub fn update_active_decision(&mut self, status: DecisionStatus) {
        if let Some(active) = self.decisions.last_mut() {
            active.status = status;
        }
        self.touch();
    }

    pub fn active_decision(&self) -> Option<&DecisionRef> {
        self.decisions.last()
    }

    /// Number of decisions in this invocation that ended with `status`
    pub fn decisions_with(&self, status: DecisionStatus) -> usize {
        self.decisions.iter().filter(|d| d.status == status).count()
    }

    pub fn escalate(&mut self, reason: impl Into<String>) {
        self.escalation = Some(reason.into());
        self.touch();
    }

    /// Record that a step is about to run
    pub fn enter(&mut self, step: impl Into<String>) {
        self.path.push(step.into());
        self.touch();
    }

    pub fn suspend(&mut self, at: impl Into<String>) {
        self.status = RunStatus::Suspended { at: at.into() };
        self.touch();
    }

    /// Mark the run as resumed
    pub fn reactivate(&mut self) {
        self.status = RunStatus::Running;
        self.touch();
    }

    /// Write the terminal marker: `Escalated` when an escalation reason is set
    pub fn finish(&mut self) {
        self.status = match &self.escalation {
            Some(reason) => RunStatus::Escalated {
                reason: reason.clone(),
            },
            None => RunStatus::Completed,
        };
        self.touch();
    }

    /// Write the failure marker
    pub fn fail(&mut self, step: impl Into<String>, message: impl Into<String>) {
        self.status = RunStatus::Failed {
            step: step.into(),
            message: message.into(),
        };
        self.touch();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_state_is_running() {
        let state = WorkflowState::new("portfolio");
        assert_eq!(state.status, RunStatus::Running);
        assert!(state.decisions.is_empty());
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_scalars_overwrite_lists_append() {
        let mut state = WorkflowState::new("portfolio");
        state.set_score("risk", 1.0);
        state.set_score("risk", 2.0);
        state.narrate("first");
        state.narrate("second");

        assert_eq!(state.score("risk"), Some(2.0));
        assert_eq!(state.narration, vec!["first", "second"]);
    }

    #[test]
    fn test_violations_accumulate_and_serialize() {
        use crate::collaborators::Severity;

        let mut state = WorkflowState::new("compliance");
        state.push_violations([Violation::new("a", Severity::High, "")]);
        state.push_violations([Violation::new("b", Severity::Low, "")]);
        assert_eq!(state.violations().len(), 2);

        let restored: WorkflowState = serde_json::from_value(serde_json::to_value(&state).unwrap()).unwrap();
        assert_eq!(restored.violations(), state.violations());
    }

    #[test]
    fn test_active_decision_is_last() {
        let mut state = WorkflowState::new("portfolio");
        let first = Decision::pending("portfolio", "allocation", json!({}), "a", "t", 5);
        let second = Decision::pending("portfolio", "allocation", json!({}), "b", "t", 5);
        state.record_decision(&first);
        state.update_active_decision(DecisionStatus::Rejected);
        state.record_decision(&second);

        assert_eq!(state.active_decision().map(|d| d.id), Some(second.id));
        assert_eq!(state.decisions_with(DecisionStatus::Rejected), 1);
        assert_eq!(state.decisions_with(DecisionStatus::Pending), 1);
    }

    #[test]
    fn test_run_status_serialization() {
        let status = RunStatus::Suspended {
            at: "await_decision".into(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, json!({"state": "suspended", "at": "await_decision"}));
        assert!(status.is_suspended());
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_finish_respects_escalation() {
        let mut state = WorkflowState::new("timing_advisor");
        state.finish();
        assert_eq!(state.status, RunStatus::Completed);

        let mut state = WorkflowState::new("timing_advisor");
        state.escalate("too many rejections");
        state.finish();
        assert_eq!(
            state.status,
            RunStatus::Escalated {
                reason: "too many rejections".into()
            }
        );
        assert!(state.is_terminal());
    }

    #[test]
    fn test_inputs_accessors() {
        let state = WorkflowState::new("portfolio")
            .with_input("budget", 5000.0)
            .with_input("timeframe", "Long");
        assert_eq!(state.input_f64("budget"), Some(5000.0));
        assert_eq!(state.input_str("timeframe"), Some("Long"));
        assert!(state.input("missing").is_none());
    }
}
