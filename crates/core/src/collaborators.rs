// Collaborator contracts
//
// External services an agent workflow consumes: market data, recommendation
// scoring and compliance rule evaluation.
// Decision: Contracts only. Implementations live with the application (or in test fakes)
// Decision: Every call is treated as pure; retries and defaults are the caller's job

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

// ============================================================================
// Market data
// ============================================================================

/// A single price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    /// Percentage change against the previous close
    pub change_percent: f64,
    pub volume: u64,
    pub at: DateTime<Utc>,
}

/// Market-wide sentiment indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// 0 (extreme fear) to 100 (extreme greed)
    pub fear_greed_index: f64,
    pub vix: f64,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            fear_greed_index: 50.0,
            vix: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentRegime {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl SentimentRegime {
    pub fn is_extreme(&self) -> bool {
        matches!(self, SentimentRegime::ExtremeFear | SentimentRegime::ExtremeGreed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityRegime {
    Low,
    Normal,
    High,
}

impl Sentiment {
    pub fn regime(&self) -> SentimentRegime {
        let index = self.fear_greed_index;
        if index > 75.0 {
            SentimentRegime::ExtremeGreed
        } else if index > 55.0 {
            SentimentRegime::Greed
        } else if index < 25.0 {
            SentimentRegime::ExtremeFear
        } else if index < 45.0 {
            SentimentRegime::Fear
        } else {
            SentimentRegime::Neutral
        }
    }

    /// Volatility regime derived from the VIX level
    pub fn volatility_regime(&self) -> VolatilityRegime {
        if self.vix > 25.0 {
            VolatilityRegime::High
        } else if self.vix < 15.0 {
            VolatilityRegime::Low
        } else {
            VolatilityRegime::Normal
        }
    }
}

/// Source of quotes and sentiment.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest quote for each requested symbol. Unknown symbols are omitted.
    async fn current_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, CollaboratorError>;

    /// Daily quotes for the last `days` days, oldest first
    async fn historical_quotes(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<Quote>, CollaboratorError>;

    async fn sentiment(&self) -> Result<Sentiment, CollaboratorError>;
}

// ============================================================================
// Scoring
// ============================================================================

/// One ranked allocation suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub symbol: String,
    pub sector: String,
    /// Share of the budget in percent
    pub weight: f64,
    /// Expected annual return in percent
    pub expected_return: f64,
    pub risk_score: f64,
}

/// Direction and strength of a timing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimingSignal {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl TimingSignal {
    pub fn is_strong(&self) -> bool {
        matches!(self, TimingSignal::StrongBuy | TimingSignal::StrongSell)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingAssessment {
    pub signal: TimingSignal,
    /// 0-100
    pub confidence: f64,
}

impl Default for TimingAssessment {
    fn default() -> Self {
        Self {
            signal: TimingSignal::Neutral,
            confidence: 0.0,
        }
    }
}

/// Input handed to a [`RecommendationScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub budget: f64,
    pub timeframe: String,
    pub risk_level: String,
    pub quotes: Vec<Quote>,
    pub sentiment: Sentiment,
}

#[async_trait]
pub trait RecommendationScorer: Send + Sync {
    /// Allocations ranked best first
    async fn allocations(
        &self,
        request: &ScoringRequest,
    ) -> Result<Vec<Allocation>, CollaboratorError>;

    async fn timing(&self, request: &ScoringRequest)
        -> Result<TimingAssessment, CollaboratorError>;
}

// ============================================================================
// Compliance
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Points deducted from a 100-point compliance score
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Critical | Severity::High => 25.0,
            Severity::Medium => 10.0,
            Severity::Low => 5.0,
            Severity::Info => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub description: String,
}

impl Violation {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub sector: String,
    pub market_value: f64,
}

/// Holdings submitted for rule evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub positions: Vec<Position>,
    pub cash: f64,
}

impl PortfolioSnapshot {
    pub fn total_value(&self) -> f64 {
        self.cash + self.positions.iter().map(|p| p.market_value).sum::<f64>()
    }
}

#[async_trait]
pub trait RuleEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        portfolio: &PortfolioSnapshot,
    ) -> Result<Vec<Violation>, CollaboratorError>;
}
