//! Portfolio optimizer agent
//!
//! Collects quotes, asks the scorer for allocations, and sends risky, large,
//! concentrated or implausibly profitable portfolios to a reviewer.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tradegate_core::{
    Allocation, MarketDataProvider, RecommendationScorer, ScoringRequest, WorkflowState,
};
use tradegate_durable::coordinator::DecisionCoordinator;
use tradegate_durable::engine::{GateConfig, GatePredicate, GatedWorkflow, Step, StepError};

use crate::market::{
    bounded, read_quotes, read_sentiment, write, CollectMarketData, DEFAULT_COLLABORATOR_TIMEOUT,
};
use crate::validation::{investment_inputs, keys};

pub const OWNER: &str = "portfolio_optimizer";
pub const CATEGORY: &str = "portfolio_allocation";

/// Universe used when the caller names no symbols
pub const DEFAULT_SYMBOLS: &[&str] = &["AAPL", "MSFT", "GOOGL", "JNJ", "JPM", "XOM", "PG", "NEE"];

/// Score keys written by [`ScoreAllocations`]
pub mod score_keys {
    pub const BUDGET: &str = "budget";
    pub const RISK: &str = "risk_score";
    pub const EXPECTED_RETURN: &str = "expected_return";
    pub const DIVERSIFICATION: &str = "diversification";
}

/// Key of the finalized portfolio in [`WorkflowState::data`]
pub const PORTFOLIO_DATA_KEY: &str = "portfolio";

/// Degradation source for scorer failures
pub const SCORER_SOURCE: &str = "scorer";

/// Allocation with its dollar amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioLine {
    pub symbol: String,
    pub sector: String,
    pub weight: f64,
    pub amount: f64,
}

/// min(100, distinct sectors x 25)
pub fn diversification_score(allocations: &[Allocation]) -> f64 {
    let sectors: BTreeSet<&str> = allocations.iter().map(|a| a.sector.as_str()).collect();
    (sectors.len() as f64 * 25.0).min(100.0)
}

/// Rescale weights to sum to 1. Non-positive weights are dropped.
fn normalize(allocations: Vec<Allocation>) -> Vec<Allocation> {
    let mut kept: Vec<Allocation> = allocations.into_iter().filter(|a| a.weight > 0.0).collect();
    let total: f64 = kept.iter().map(|a| a.weight).sum();
    if total > 0.0 {
        for allocation in &mut kept {
            allocation.weight /= total;
        }
    }
    kept
}

fn weighted(allocations: &[Allocation], value: impl Fn(&Allocation) -> f64) -> f64 {
    allocations.iter().map(|a| a.weight * value(a)).sum()
}

/// Asks the scorer for allocations and derives the portfolio metrics
pub struct ScoreAllocations {
    scorer: Arc<dyn RecommendationScorer>,
    timeout: Duration,
}

impl ScoreAllocations {
    pub fn new(scorer: Arc<dyn RecommendationScorer>) -> Self {
        Self {
            scorer,
            timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Step for ScoreAllocations {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let (inputs, _) = investment_inputs(state);
        let request = ScoringRequest {
            budget: inputs.budget,
            timeframe: inputs.timeframe.to_string(),
            risk_level: inputs.risk_level.to_string(),
            quotes: read_quotes(state),
            sentiment: read_sentiment(state),
        };

        let call = self.scorer.allocations(&request);
        let allocations = match bounded("scorer", self.timeout, call).await {
            Ok(allocations) => normalize(allocations),
            Err(err) => {
                warn!(error = %err, "allocations unavailable");
                state.degrade(SCORER_SOURCE, err.to_string());
                Vec::new()
            }
        };

        state.set_score(score_keys::BUDGET, inputs.budget);
        if allocations.is_empty() {
            state.narrate("no allocations available");
        } else {
            let risk = weighted(&allocations, |a| a.risk_score);
            let expected = weighted(&allocations, |a| a.expected_return);
            let diversification = diversification_score(&allocations);
            state.set_score(score_keys::RISK, risk);
            state.set_score(score_keys::EXPECTED_RETURN, expected);
            state.set_score(score_keys::DIVERSIFICATION, diversification);
            state.narrate(format!(
                "{} positions; risk {risk:.2}, expected return {expected:.1}%, diversification {diversification:.0}",
                allocations.len()
            ));
        }
        state.set_recommendations(allocations);
        Ok(())
    }
}

/// Review thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioThresholds {
    pub max_risk: f64,
    pub max_budget: f64,
    pub min_diversification: f64,
    pub max_expected_return: f64,
}

impl Default for PortfolioThresholds {
    fn default() -> Self {
        Self {
            max_risk: 2.5,
            max_budget: 100_000.0,
            min_diversification: 60.0,
            max_expected_return: 20.0,
        }
    }
}

/// Gates risky, large, concentrated or high-return portfolios
#[derive(Debug, Clone, Default)]
pub struct PortfolioGate {
    pub thresholds: PortfolioThresholds,
}

impl PortfolioGate {
    /// Reasons the portfolio needs review; empty when it does not
    pub fn reasons(&self, state: &WorkflowState) -> Vec<String> {
        let t = &self.thresholds;
        let mut reasons = Vec::new();

        let risk = state.score(score_keys::RISK).unwrap_or(0.0);
        if risk > t.max_risk {
            reasons.push(format!("risk score {risk:.2} above {}", t.max_risk));
        }
        let budget = state.score(score_keys::BUDGET).unwrap_or(0.0);
        if budget > t.max_budget {
            reasons.push(format!("budget {budget:.0} above {}", t.max_budget));
        }
        let diversification = state.score(score_keys::DIVERSIFICATION).unwrap_or(100.0);
        if diversification < t.min_diversification {
            reasons.push(format!(
                "diversification {diversification:.0} below {}",
                t.min_diversification
            ));
        }
        let expected = state.score(score_keys::EXPECTED_RETURN).unwrap_or(0.0);
        if expected > t.max_expected_return {
            reasons.push(format!(
                "expected return {expected:.1}% above {}%",
                t.max_expected_return
            ));
        }
        reasons
    }
}

impl GatePredicate for PortfolioGate {
    fn should_gate(&self, state: &WorkflowState) -> bool {
        !self.reasons(state).is_empty()
    }

    fn rationale(&self, state: &WorkflowState) -> String {
        let (inputs, _) = investment_inputs(state);
        format!(
            "Portfolio allocation for ${:.2} with {} risk and {} timeframe: {}",
            inputs.budget,
            inputs.risk_level,
            inputs.timeframe,
            self.reasons(state).join("; ")
        )
    }
}

/// Turns weights into dollar amounts
pub struct FinalizePortfolio;

#[async_trait]
impl Step for FinalizePortfolio {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let budget = state.input_f64(keys::BUDGET).unwrap_or(0.0);
        let lines: Vec<PortfolioLine> = state
            .recommendations
            .iter()
            .map(|a| PortfolioLine {
                symbol: a.symbol.clone(),
                sector: a.sector.clone(),
                weight: a.weight,
                amount: a.weight * budget,
            })
            .collect();
        state.narrate(format!("portfolio finalized with {} positions", lines.len()));
        write(state, PORTFOLIO_DATA_KEY, &lines)
    }
}

/// Gated workflow for the portfolio optimizer
pub fn workflow(
    coordinator: DecisionCoordinator,
    provider: Arc<dyn MarketDataProvider>,
    scorer: Arc<dyn RecommendationScorer>,
) -> GatedWorkflow {
    GatedWorkflow::new(coordinator, GateConfig::new(OWNER, CATEGORY))
        .predicate(PortfolioGate::default())
        .collect(CollectMarketData::new(provider, DEFAULT_SYMBOLS).with_investment_inputs())
        .score(ScoreAllocations::new(scorer))
        .finalize(FinalizePortfolio)
}

/// Initial state for one optimization request
pub fn request(budget: f64, timeframe: &str, risk_level: &str) -> WorkflowState {
    WorkflowState::new(OWNER)
        .with_input(keys::BUDGET, budget)
        .with_input(keys::TIMEFRAME, timeframe)
        .with_input(keys::RISK_LEVEL, risk_level)
}
