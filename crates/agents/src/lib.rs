// Trading Agents
//
// Four agents built on the gated step graph template:
// collect -> score -> request_decision -> await_decision -> finalize
//
// Key design decisions:
// - Each agent module exposes `workflow(..)` returning a GatedWorkflow, so callers
//   can attach audit sinks or executor limits before `build()`
// - Gate predicates are plain structs with public thresholds
// - Collaborator failures degrade to defaults and are recorded on the state
// - Agents share one DecisionCoordinator; owner ids scope the bypass policy

pub mod compliance;
pub mod market;
pub mod market_data;
pub mod portfolio;
pub mod timing;
pub mod validation;

// In-memory collaborators for examples and testing
pub mod memory;

use std::sync::Arc;

use tradegate_core::{MarketDataProvider, RecommendationScorer, RuleEvaluator};
use tradegate_durable::coordinator::DecisionCoordinator;
use tradegate_durable::engine::{GraphError, StepGraph};

// Re-exports for convenience
pub use compliance::ComplianceGate;
pub use market::CollectMarketData;
pub use market_data::MarketDataGate;
pub use portfolio::{PortfolioGate, PortfolioThresholds};
pub use timing::TimingGate;
pub use validation::{InvestmentInputs, RiskLevel, Timeframe, MIN_BUDGET};

/// All four agent graphs over one coordinator
#[derive(Debug)]
pub struct Agents {
    pub market_data: StepGraph,
    pub portfolio: StepGraph,
    pub timing: StepGraph,
    pub compliance: StepGraph,
}

impl Agents {
    pub fn build(
        coordinator: DecisionCoordinator,
        provider: Arc<dyn MarketDataProvider>,
        scorer: Arc<dyn RecommendationScorer>,
        evaluator: Arc<dyn RuleEvaluator>,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            market_data: market_data::workflow(coordinator.clone(), provider.clone()).build()?,
            portfolio: portfolio::workflow(coordinator.clone(), provider.clone(), scorer.clone())
                .build()?,
            timing: timing::workflow(coordinator.clone(), provider, scorer).build()?,
            compliance: compliance::workflow(coordinator, evaluator).build()?,
        })
    }

    /// Graph for an owner id
    pub fn by_owner(&self, owner: &str) -> Option<&StepGraph> {
        match owner {
            market_data::OWNER => Some(&self.market_data),
            portfolio::OWNER => Some(&self.portfolio),
            timing::OWNER => Some(&self.timing),
            compliance::OWNER => Some(&self.compliance),
            _ => None,
        }
    }
}
