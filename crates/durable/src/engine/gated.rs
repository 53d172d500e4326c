//! Gated workflow template
//!
//! ```text
//! collect ──▶ score ──▶ request_decision ──▶ await_decision ──┬── proceed ──▶ finalize ──▶ End
//!               ▲                                             ├── revise ───▶ score
//!               └─────────────────────────────────────────────┤
//!                                                             ├── pending ──▶ Suspend
//!                                                             └── escalate ─▶ escalate ──▶ End
//! ```

use std::sync::Arc;

use super::executor::{ExecutorConfig, StepGraph};
use super::gate::{
    gate_router, labels, AwaitDecisionStep, EscalateStep, GateConfig, GatePredicate,
    RequestDecisionStep,
};
use super::graph::{GraphError, StepGraphBuilder, Target};
use super::step::Step;
use crate::audit::AuditSink;
use crate::coordinator::DecisionCoordinator;

/// Step names used by the template
pub mod steps {
    pub const COLLECT: &str = "collect";
    pub const SCORE: &str = "score";
    pub const REQUEST_DECISION: &str = "request_decision";
    pub const AWAIT_DECISION: &str = "await_decision";
    pub const FINALIZE: &str = "finalize";
    pub const ESCALATE: &str = "escalate";
}

/// Builds the collect, score, gate, finalize graph shared by every agent.
///
/// # Example
///
/// ```ignore
/// let graph = GatedWorkflow::new(coordinator, GateConfig::new("portfolio_optimizer", "allocation"))
///     .predicate(PortfolioGate)
///     .collect(CollectMarketData::new(provider))
///     .score(ScoreAllocations::new(scorer))
///     .finalize(FinalizePortfolio)
///     .build()?;
///
/// let state = graph.run(WorkflowState::new("portfolio_optimizer")).await;
/// ```
pub struct GatedWorkflow {
    coordinator: DecisionCoordinator,
    gate: GateConfig,
    predicate: Option<Arc<dyn GatePredicate>>,
    collect: Option<Arc<dyn Step>>,
    score: Option<Arc<dyn Step>>,
    finalize: Option<Arc<dyn Step>>,
    escalation: Option<Arc<dyn Step>>,
    config: ExecutorConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

impl GatedWorkflow {
    pub fn new(coordinator: DecisionCoordinator, gate: GateConfig) -> Self {
        Self {
            coordinator,
            gate,
            predicate: None,
            collect: None,
            score: None,
            finalize: None,
            escalation: None,
            config: ExecutorConfig::default(),
            audit: None,
        }
    }

    pub fn predicate(mut self, predicate: impl GatePredicate + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn collect(mut self, step: impl Step + 'static) -> Self {
        self.collect = Some(Arc::new(step));
        self
    }

    pub fn score(mut self, step: impl Step + 'static) -> Self {
        self.score = Some(Arc::new(step));
        self
    }

    pub fn finalize(mut self, step: impl Step + 'static) -> Self {
        self.finalize = Some(Arc::new(step));
        self
    }

    /// Extra work after the run is marked escalated
    pub fn escalation(mut self, step: impl Step + 'static) -> Self {
        self.escalation = Some(Arc::new(step));
        self
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn build(self) -> Result<StepGraph, GraphError> {
        let predicate = self.predicate.ok_or(GraphError::MissingStep("predicate"))?;
        let collect = self.collect.ok_or(GraphError::MissingStep(steps::COLLECT))?;
        let score = self.score.ok_or(GraphError::MissingStep(steps::SCORE))?;
        let finalize = self.finalize.ok_or(GraphError::MissingStep(steps::FINALIZE))?;

        let request = RequestDecisionStep::new(self.coordinator.clone(), self.gate.clone(), predicate);
        let wait = AwaitDecisionStep::new(self.coordinator, self.gate.clone());

        let mut builder = StepGraphBuilder::new(self.gate.owner.clone())
            .shared_step(steps::COLLECT, collect)
            .shared_step(steps::SCORE, score)
            .step(steps::REQUEST_DECISION, request)
            .step(steps::AWAIT_DECISION, wait)
            .shared_step(steps::FINALIZE, finalize)
            .step(steps::ESCALATE, EscalateStep::new(self.escalation))
            .entry(steps::COLLECT)
            .edge(steps::COLLECT, Target::step(steps::SCORE))
            .edge(steps::SCORE, Target::step(steps::REQUEST_DECISION))
            .edge(steps::REQUEST_DECISION, Target::step(steps::AWAIT_DECISION))
            .conditional(
                steps::AWAIT_DECISION,
                gate_router,
                [
                    (labels::PROCEED, Target::step(steps::FINALIZE)),
                    (labels::REVISE, Target::step(steps::SCORE)),
                    (labels::PENDING, Target::Suspend),
                    (labels::ESCALATE, Target::step(steps::ESCALATE)),
                ],
            )
            .edge(steps::FINALIZE, Target::End)
            .edge(steps::ESCALATE, Target::End)
            .with_config(self.config);

        if let Some(sink) = self.audit {
            builder = builder.with_audit(sink);
        }
        builder.build()
    }
}
