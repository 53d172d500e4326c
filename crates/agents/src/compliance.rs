//! Compliance monitor agent
//!
//! The caller submits a portfolio snapshot under the `portfolio` input. Rules
//! are evaluated by an injected [`RuleEvaluator`]; the agent only scores the
//! result and decides whether a compliance officer must look at it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tradegate_core::{PortfolioSnapshot, RuleEvaluator, Severity, Violation, WorkflowState};
use tradegate_durable::coordinator::DecisionCoordinator;
use tradegate_durable::engine::{GateConfig, GatePredicate, GatedWorkflow, Step, StepError};

use crate::market::{bounded, read, write, DEFAULT_COLLABORATOR_TIMEOUT};
use crate::validation::{keys, VALIDATION_SOURCE};

pub const OWNER: &str = "compliance_monitor";
pub const CATEGORY: &str = "compliance_review";

pub mod data_keys {
    pub const SNAPSHOT: &str = "portfolio_snapshot";
    pub const REPORT: &str = "compliance_report";
    /// Violations found by the latest evaluation pass
    pub const CURRENT_VIOLATIONS: &str = "current_violations";
}

pub mod score_keys {
    pub const COMPLIANCE: &str = "compliance_score";
    pub const RULES_VIOLATED: &str = "rules_violated";
}

pub const EVALUATOR_SOURCE: &str = "rule_evaluator";

/// 100 minus the severity penalties, floored at 0
pub fn compliance_score(violations: &[Violation]) -> f64 {
    let penalty: f64 = violations.iter().map(|v| v.severity.penalty()).sum();
    (100.0 - penalty).max(0.0)
}

pub fn distinct_rules(violations: &[Violation]) -> usize {
    violations
        .iter()
        .map(|v| v.rule_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Violations from the latest pass. `WorkflowState::violations` keeps every pass.
pub fn current_violations(state: &WorkflowState) -> Vec<Violation> {
    read(state, data_keys::CURRENT_VIOLATIONS)
}

/// Summary written by [`FinalizeCompliance`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub score: f64,
    pub violations: Vec<Violation>,
    pub portfolio_value: f64,
}

/// Reads the submitted snapshot. A missing or malformed one is treated as empty.
pub struct LoadSnapshot;

#[async_trait]
impl Step for LoadSnapshot {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let snapshot = match state.input(keys::PORTFOLIO) {
            Some(value) => match serde_json::from_value::<PortfolioSnapshot>(value.clone()) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    state.degrade(VALIDATION_SOURCE, format!("invalid portfolio: {err}"));
                    PortfolioSnapshot::default()
                }
            },
            None => {
                state.degrade(VALIDATION_SOURCE, "no portfolio submitted");
                PortfolioSnapshot::default()
            }
        };
        state.narrate(format!(
            "reviewing {} positions worth {:.2}",
            snapshot.positions.len(),
            snapshot.total_value()
        ));
        write(state, data_keys::SNAPSHOT, &snapshot)
    }
}

/// Runs the rule evaluator. Scores cover the latest pass only, while the
/// state's violation log accumulates across revisions.
pub struct EvaluateRules {
    evaluator: Arc<dyn RuleEvaluator>,
    timeout: Duration,
}

impl EvaluateRules {
    pub fn new(evaluator: Arc<dyn RuleEvaluator>) -> Self {
        Self {
            evaluator,
            timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Step for EvaluateRules {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let snapshot: PortfolioSnapshot = read(state, data_keys::SNAPSHOT);
        let call = self.evaluator.evaluate(&snapshot);
        let violations = match bounded("rule evaluator", self.timeout, call).await {
            Ok(violations) => violations,
            Err(err) => {
                warn!(error = %err, "rule evaluation unavailable");
                state.degrade(EVALUATOR_SOURCE, err.to_string());
                Vec::new()
            }
        };

        let score = compliance_score(&violations);
        let rules = distinct_rules(&violations);
        state.set_score(score_keys::COMPLIANCE, score);
        state.set_score(score_keys::RULES_VIOLATED, rules as f64);
        state.narrate(format!(
            "{} violations across {rules} rules; score {score:.0}",
            violations.len()
        ));
        write(state, data_keys::CURRENT_VIOLATIONS, &violations)?;
        state.push_violations(violations);
        Ok(())
    }
}

/// Gates serious violations, low scores and broad rule breakage
#[derive(Debug, Clone)]
pub struct ComplianceGate {
    pub min_severity: Severity,
    pub min_score: f64,
    pub max_rules: usize,
}

impl Default for ComplianceGate {
    fn default() -> Self {
        Self {
            min_severity: Severity::High,
            min_score: 80.0,
            max_rules: 3,
        }
    }
}

impl ComplianceGate {
    pub fn reasons(&self, state: &WorkflowState) -> Vec<String> {
        let violations = current_violations(state);
        let mut reasons = Vec::new();
        let serious = violations
            .iter()
            .filter(|v| v.severity >= self.min_severity)
            .count();
        if serious > 0 {
            reasons.push(format!("{serious} violations of severity {:?} or worse", self.min_severity));
        }
        let score = state.score(score_keys::COMPLIANCE).unwrap_or(100.0);
        if score < self.min_score {
            reasons.push(format!("compliance score {score:.0} below {}", self.min_score));
        }
        let rules = distinct_rules(&violations);
        if rules > self.max_rules {
            reasons.push(format!("{rules} distinct rules violated"));
        }
        reasons
    }
}

impl GatePredicate for ComplianceGate {
    fn should_gate(&self, state: &WorkflowState) -> bool {
        !self.reasons(state).is_empty()
    }

    fn rationale(&self, state: &WorkflowState) -> String {
        format!("Compliance review: {}", self.reasons(state).join("; "))
    }
}

pub struct FinalizeCompliance;

#[async_trait]
impl Step for FinalizeCompliance {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let snapshot: PortfolioSnapshot = read(state, data_keys::SNAPSHOT);
        let report = ComplianceReport {
            score: state.score(score_keys::COMPLIANCE).unwrap_or(100.0),
            violations: current_violations(state),
            portfolio_value: snapshot.total_value(),
        };
        state.narrate(format!("compliance report filed, score {:.0}", report.score));
        write(state, data_keys::REPORT, &report)
    }
}

pub fn workflow(coordinator: DecisionCoordinator, evaluator: Arc<dyn RuleEvaluator>) -> GatedWorkflow {
    GatedWorkflow::new(coordinator, GateConfig::new(OWNER, CATEGORY))
        .predicate(ComplianceGate::default())
        .collect(LoadSnapshot)
        .score(EvaluateRules::new(evaluator))
        .finalize(FinalizeCompliance)
}

/// Initial state for reviewing `portfolio`
pub fn request(portfolio: &PortfolioSnapshot) -> Result<WorkflowState, serde_json::Error> {
    Ok(WorkflowState::new(OWNER).with_input(keys::PORTFOLIO, serde_json::to_value(portfolio)?))
}
