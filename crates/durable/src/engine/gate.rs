//! Decision gate steps
//!
//! A gate is two steps plus a router:
//! - `RequestDecisionStep` asks the predicate whether review is needed and, if
//!   so, requests a decision from the coordinator
//! - `AwaitDecisionStep` reads the active decision and stores the gate outcome
//! - [`gate_router`] maps that outcome to a route label
//!
//! Both steps are safe to re-run: the await step only reads the coordinator,
//! which is what resumption relies on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tradegate_core::{DecisionId, DecisionStatus, WorkflowState};

use super::step::{Step, StepError};
use crate::coordinator::{DecisionCoordinator, DecisionRequest};

/// Key of the gate marker in [`WorkflowState::data`]
pub const GATE_DATA_KEY: &str = "gate";

/// Route labels produced by [`gate_router`]
pub mod labels {
    pub const PROCEED: &str = "proceed";
    pub const REVISE: &str = "revise";
    pub const PENDING: &str = "pending";
    pub const ESCALATE: &str = "escalate";
}

/// What to do when a decision times out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Treat as a rejection (counts towards `max_rejections`)
    Reject,
    /// Leave the loop through the escalation path
    #[default]
    Escalate,
    /// Continue as if approved
    Proceed,
}

/// Gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Owner the decisions and policy overrides are scoped to
    pub owner: String,
    pub category: String,
    pub requester: String,
    pub timeout: Duration,
    /// Escalate once this many decisions were rejected in one invocation.
    /// `None` loops back for as long as reviewers keep rejecting.
    pub max_rejections: Option<u32>,
    pub timeout_policy: TimeoutPolicy,
}

impl GateConfig {
    pub fn new(owner: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            category: category.into(),
            requester: "workflow".to_string(),
            timeout: Duration::from_secs(300),
            max_rejections: Some(3),
            timeout_policy: TimeoutPolicy::default(),
        }
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = requester.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_rejections(mut self, max: Option<u32>) -> Self {
        self.max_rejections = max;
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    /// Outcome for a decision in `status`, given the decisions already in `state`
    pub fn outcome_for(&self, status: DecisionStatus, state: &WorkflowState) -> (GateOutcome, Option<String>) {
        match status {
            DecisionStatus::Pending => (GateOutcome::Pending, None),
            DecisionStatus::Approved | DecisionStatus::Bypassed => (GateOutcome::Proceed, None),
            DecisionStatus::Rejected => self.after_rejection(state),
            DecisionStatus::TimedOut => match self.timeout_policy {
                TimeoutPolicy::Proceed => (GateOutcome::Proceed, None),
                TimeoutPolicy::Escalate => (
                    GateOutcome::Escalate,
                    Some("decision timed out without review".to_string()),
                ),
                TimeoutPolicy::Reject => self.after_rejection(state),
            },
        }
    }

    fn after_rejection(&self, state: &WorkflowState) -> (GateOutcome, Option<String>) {
        let mut rejections = state.decisions_with(DecisionStatus::Rejected);
        if self.timeout_policy == TimeoutPolicy::Reject {
            rejections += state.decisions_with(DecisionStatus::TimedOut);
        }
        match self.max_rejections {
            Some(max) if rejections >= max as usize => (
                GateOutcome::Escalate,
                Some(format!("rejected {rejections} times")),
            ),
            _ => (GateOutcome::Revise, None),
        }
    }
}

/// Result of evaluating the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    Proceed,
    Revise,
    Pending,
    Escalate,
}

impl GateOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            GateOutcome::Proceed => labels::PROCEED,
            GateOutcome::Revise => labels::REVISE,
            GateOutcome::Pending => labels::PENDING,
            GateOutcome::Escalate => labels::ESCALATE,
        }
    }
}

/// Gate bookkeeping stored in the workflow state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateMarker {
    /// Decision requested on the current pass, if any
    pub decision_id: Option<DecisionId>,
    pub outcome: Option<GateOutcome>,
    pub reason: Option<String>,
}

impl GateMarker {
    pub fn read(state: &WorkflowState) -> Option<Self> {
        state
            .data(GATE_DATA_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn write(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let value = serde_json::to_value(self).map_err(anyhow::Error::from)?;
        state.set_data(GATE_DATA_KEY, value);
        Ok(())
    }
}

/// Route label for the current gate outcome
pub fn gate_router(state: &WorkflowState) -> String {
    GateMarker::read(state)
        .and_then(|m| m.outcome)
        .map(|o| o.label().to_string())
        .unwrap_or_else(|| "unevaluated".to_string())
}

/// Decides whether the current state needs human review
pub trait GatePredicate: Send + Sync {
    fn should_gate(&self, state: &WorkflowState) -> bool;

    /// Summary shown to the reviewer
    fn rationale(&self, state: &WorkflowState) -> String {
        format!("{} requests review", state.owner)
    }

    /// Data attached to the decision
    fn payload(&self, state: &WorkflowState) -> serde_json::Value {
        let mut payload = serde_json::Map::new();
        payload.insert(
            "scores".to_string(),
            serde_json::to_value(&state.scores).unwrap_or_default(),
        );
        payload.insert(
            "recommendations".to_string(),
            serde_json::to_value(&state.recommendations).unwrap_or_default(),
        );
        payload.insert(
            "violations".to_string(),
            serde_json::to_value(state.violations()).unwrap_or_default(),
        );
        serde_json::Value::Object(payload)
    }
}

/// Predicate built from a closure
pub struct FnPredicate<F>(F);

pub fn predicate_fn<F>(f: F) -> FnPredicate<F>
where
    F: Fn(&WorkflowState) -> bool + Send + Sync,
{
    FnPredicate(f)
}

impl<F> GatePredicate for FnPredicate<F>
where
    F: Fn(&WorkflowState) -> bool + Send + Sync,
{
    fn should_gate(&self, state: &WorkflowState) -> bool {
        (self.0)(state)
    }
}

/// Evaluates the predicate and requests a decision when review is needed
pub struct RequestDecisionStep {
    coordinator: DecisionCoordinator,
    config: GateConfig,
    predicate: Arc<dyn GatePredicate>,
}

impl RequestDecisionStep {
    pub fn new(
        coordinator: DecisionCoordinator,
        config: GateConfig,
        predicate: Arc<dyn GatePredicate>,
    ) -> Self {
        Self {
            coordinator,
            config,
            predicate,
        }
    }
}

#[async_trait]
impl Step for RequestDecisionStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        if !self.predicate.should_gate(state) {
            debug!(owner = %self.config.owner, "no review needed");
            state.narrate(format!("{}: no review needed", self.config.category));
            return GateMarker::default().write(state);
        }

        let request = DecisionRequest::new(&self.config.owner, &self.config.category)
            .with_payload(self.predicate.payload(state))
            .with_rationale(self.predicate.rationale(state))
            .with_requester(&self.config.requester)
            .with_timeout(self.config.timeout);
        let decision = self.coordinator.request_decision(request).await;

        state.record_decision(&decision);
        state.narrate(format!(
            "{}: review requested ({})",
            self.config.category, decision.status
        ));
        GateMarker {
            decision_id: Some(decision.id),
            ..Default::default()
        }
        .write(state)
    }
}

/// Reads the active decision and records the gate outcome
pub struct AwaitDecisionStep {
    coordinator: DecisionCoordinator,
    config: GateConfig,
}

impl AwaitDecisionStep {
    pub fn new(coordinator: DecisionCoordinator, config: GateConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }
}

#[async_trait]
impl Step for AwaitDecisionStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let marker = GateMarker::read(state)
            .ok_or_else(|| StepError::message("decision gate was not evaluated"))?;

        let (outcome, reason) = match marker.decision_id {
            None => (GateOutcome::Proceed, None),
            Some(id) => match self.coordinator.get_decision(id) {
                None => (
                    GateOutcome::Escalate,
                    Some(format!("decision {id} is no longer known")),
                ),
                Some(decision) => {
                    state.update_active_decision(decision.status);
                    self.config.outcome_for(decision.status, state)
                }
            },
        };

        debug!(owner = %self.config.owner, outcome = outcome.label(), "gate evaluated");
        if outcome != GateOutcome::Pending {
            state.narrate(format!("{}: {}", self.config.category, outcome.label()));
        }
        GateMarker {
            outcome: Some(outcome),
            reason,
            ..marker
        }
        .write(state)
    }
}

/// Marks the run as escalated, then runs an optional follow-up step
pub struct EscalateStep {
    then: Option<Arc<dyn Step>>,
}

impl EscalateStep {
    pub fn new(then: Option<Arc<dyn Step>>) -> Self {
        Self { then }
    }
}

#[async_trait]
impl Step for EscalateStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let reason = GateMarker::read(state)
            .and_then(|m| m.reason)
            .unwrap_or_else(|| "escalated at decision gate".to_string());
        state.escalate(reason);
        match &self.then {
            Some(step) => step.run(state).await,
            None => Ok(()),
        }
    }
}
