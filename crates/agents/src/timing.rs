//! Timing advisor agent

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;
use tradegate_core::{
    MarketDataProvider, RecommendationScorer, ScoringRequest, SentimentRegime, TimingAssessment,
    VolatilityRegime, WorkflowState,
};
use tradegate_durable::coordinator::DecisionCoordinator;
use tradegate_durable::engine::{GateConfig, GatePredicate, GatedWorkflow, Step, StepError};

use crate::market::{
    bounded, read, read_quotes, read_sentiment, write, CollectMarketData,
    DEFAULT_COLLABORATOR_TIMEOUT,
};
use crate::validation::{investment_inputs, keys};

pub const OWNER: &str = "timing_advisor";
pub const CATEGORY: &str = "market_timing";

pub const DEFAULT_SYMBOLS: &[&str] = &["SPY"];

/// Data keys written by the timing steps
pub mod data_keys {
    pub const ASSESSMENT: &str = "timing";
    pub const REGIME: &str = "market_regime";
    pub const ADVICE: &str = "timing_advice";
}

pub const CONFIDENCE_SCORE: &str = "timing_confidence";

pub const SCORER_SOURCE: &str = "scorer";

/// Sentiment and volatility regime at assessment time
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarketRegime {
    pub sentiment: SentimentRegime,
    pub volatility: VolatilityRegime,
}

impl Default for MarketRegime {
    fn default() -> Self {
        Self {
            sentiment: SentimentRegime::Neutral,
            volatility: VolatilityRegime::Normal,
        }
    }
}

pub fn read_assessment(state: &WorkflowState) -> TimingAssessment {
    read(state, data_keys::ASSESSMENT)
}

pub fn read_regime(state: &WorkflowState) -> MarketRegime {
    read(state, data_keys::REGIME)
}

/// Asks the scorer for a timing signal and classifies the market regime.
/// A scorer failure or timeout degrades to a neutral signal with zero confidence.
pub struct AssessTiming {
    scorer: Arc<dyn RecommendationScorer>,
    timeout: Duration,
}

impl AssessTiming {
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
impl Step for AssessTiming {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let (inputs, _) = investment_inputs(state);
        let sentiment = read_sentiment(state);
        let request = ScoringRequest {
            budget: inputs.budget,
            timeframe: inputs.timeframe.to_string(),
            risk_level: inputs.risk_level.to_string(),
            quotes: read_quotes(state),
            sentiment,
        };

        let call = self.scorer.timing(&request);
        let assessment = match bounded("scorer", self.timeout, call).await {
            Ok(assessment) => assessment,
            Err(err) => {
                warn!(error = %err, "timing assessment unavailable");
                state.degrade(SCORER_SOURCE, err.to_string());
                TimingAssessment::default()
            }
        };
        let regime = MarketRegime {
            sentiment: sentiment.regime(),
            volatility: sentiment.volatility_regime(),
        };

        state.set_score(CONFIDENCE_SCORE, assessment.confidence);
        state.narrate(format!(
            "signal {:?} at {:.0}% confidence; sentiment {:?}, volatility {:?}",
            assessment.signal, assessment.confidence, regime.sentiment, regime.volatility
        ));
        write(state, data_keys::ASSESSMENT, &assessment)?;
        write(state, data_keys::REGIME, &regime)
    }
}

/// Gates strong signals, extreme sentiment, low confidence and high volatility
#[derive(Debug, Clone)]
pub struct TimingGate {
    pub min_confidence: f64,
}

impl Default for TimingGate {
    fn default() -> Self {
        Self {
            min_confidence: 60.0,
        }
    }
}

impl TimingGate {
    pub fn reasons(&self, state: &WorkflowState) -> Vec<String> {
        let assessment = read_assessment(state);
        let regime = read_regime(state);
        let mut reasons = Vec::new();

        if assessment.signal.is_strong() {
            reasons.push(format!("strong signal {:?}", assessment.signal));
        }
        if regime.sentiment.is_extreme() {
            reasons.push(format!("extreme sentiment {:?}", regime.sentiment));
        }
        if assessment.confidence < self.min_confidence {
            reasons.push(format!(
                "confidence {:.0} below {}",
                assessment.confidence, self.min_confidence
            ));
        }
        if regime.volatility == VolatilityRegime::High {
            reasons.push("high volatility".to_string());
        }
        reasons
    }
}

impl GatePredicate for TimingGate {
    fn should_gate(&self, state: &WorkflowState) -> bool {
        !self.reasons(state).is_empty()
    }

    fn rationale(&self, state: &WorkflowState) -> String {
        format!("Market timing advice: {}", self.reasons(state).join("; "))
    }
}

/// Publishes the assessment as advice
pub struct FinalizeTiming;

#[async_trait]
impl Step for FinalizeTiming {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let assessment = read_assessment(state);
        state.narrate(format!("advice: {:?}", assessment.signal));
        write(state, data_keys::ADVICE, &assessment)
    }
}

pub fn workflow(
    coordinator: DecisionCoordinator,
    provider: Arc<dyn MarketDataProvider>,
    scorer: Arc<dyn RecommendationScorer>,
) -> GatedWorkflow {
    GatedWorkflow::new(coordinator, GateConfig::new(OWNER, CATEGORY))
        .predicate(TimingGate::default())
        .collect(CollectMarketData::new(provider, DEFAULT_SYMBOLS))
        .score(AssessTiming::new(scorer))
        .finalize(FinalizeTiming)
}

/// Initial state for one timing request
pub fn request(symbols: &[&str], timeframe: &str) -> WorkflowState {
    WorkflowState::new(OWNER)
        .with_input(keys::SYMBOLS, symbols.to_vec())
        .with_input(keys::TIMEFRAME, timeframe)
}
