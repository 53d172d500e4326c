// In-memory collaborator implementations
//
// Fixed responses for tests and demos. Each can be switched to fail, or to
// stall and never answer, so the degradation paths can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use tradegate_core::{
    Allocation, CollaboratorError, MarketDataProvider, PortfolioSnapshot, Quote,
    RecommendationScorer, RuleEvaluator, ScoringRequest, Sentiment, TimingAssessment, Violation,
};

/// Serves quotes from a fixed table
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    quotes: RwLock<HashMap<String, Quote>>,
    sentiment: RwLock<Sentiment>,
    failing: AtomicBool,
    stalled: AtomicBool,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(self, symbol: &str, price: f64, change_percent: f64) -> Self {
        self.quotes.write().insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                price,
                change_percent,
                volume: 1_000_000,
                at: Utc::now(),
            },
        );
        self
    }

    pub fn with_sentiment(self, fear_greed_index: f64, vix: f64) -> Self {
        *self.sentiment.write() = Sentiment {
            fear_greed_index,
            vix,
        };
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Calls never complete while stalled
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    async fn check(&self) -> Result<(), CollaboratorError> {
        stall_while(&self.stalled).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::unavailable("market data", "provider offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryMarketData {
    async fn current_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, CollaboratorError> {
        self.check().await?;
        let quotes = self.quotes.read();
        Ok(symbols.iter().filter_map(|s| quotes.get(s).cloned()).collect())
    }

    /// Flat series ending at the current quote price, one point per day
    async fn historical_quotes(&self, symbol: &str, days: u32) -> Result<Vec<Quote>, CollaboratorError> {
        self.check().await?;
        let Some(latest) = self.quotes.read().get(symbol).cloned() else {
            return Ok(Vec::new());
        };
        let start = latest.price / (1.0 + latest.change_percent / 100.0);
        Ok((0..days)
            .map(|day| {
                let last = day + 1 == days;
                Quote {
                    price: if last { latest.price } else { start },
                    change_percent: if last { latest.change_percent } else { 0.0 },
                    at: latest.at - Duration::days(i64::from(days - 1 - day)),
                    ..latest.clone()
                }
            })
            .collect())
    }

    async fn sentiment(&self) -> Result<Sentiment, CollaboratorError> {
        self.check().await?;
        Ok(*self.sentiment.read())
    }
}

/// Returns the same allocations and timing call for every request
#[derive(Debug, Default)]
pub struct InMemoryScorer {
    allocations: RwLock<Vec<Allocation>>,
    timing: RwLock<TimingAssessment>,
    failing: AtomicBool,
    stalled: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allocation(
        self,
        symbol: &str,
        sector: &str,
        weight: f64,
        expected_return: f64,
        risk_score: f64,
    ) -> Self {
        self.allocations.write().push(Allocation {
            symbol: symbol.to_string(),
            sector: sector.to_string(),
            weight,
            expected_return,
            risk_score,
        });
        self
    }

    pub fn with_timing(self, timing: TimingAssessment) -> Self {
        *self.timing.write() = timing;
        self
    }

    pub fn set_allocations(&self, allocations: Vec<Allocation>) {
        *self.allocations.write() = allocations;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Number of scoring calls served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn check(&self) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        stall_while(&self.stalled).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::unavailable("scorer", "model offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecommendationScorer for InMemoryScorer {
    async fn allocations(&self, _request: &ScoringRequest) -> Result<Vec<Allocation>, CollaboratorError> {
        self.check().await?;
        Ok(self.allocations.read().clone())
    }

    async fn timing(&self, _request: &ScoringRequest) -> Result<TimingAssessment, CollaboratorError> {
        self.check().await?;
        Ok(self.timing.read().clone())
    }
}

/// Returns a fixed violation list
#[derive(Debug, Default)]
pub struct InMemoryRules {
    violations: RwLock<Vec<Violation>>,
    failing: AtomicBool,
    stalled: AtomicBool,
}

impl InMemoryRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_violation(self, violation: Violation) -> Self {
        self.violations.write().push(violation);
        self
    }

    pub fn set_violations(&self, violations: Vec<Violation>) {
        *self.violations.write() = violations;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }
}

#[async_trait]
impl RuleEvaluator for InMemoryRules {
    async fn evaluate(&self, _portfolio: &PortfolioSnapshot) -> Result<Vec<Violation>, CollaboratorError> {
        stall_while(&self.stalled).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::unavailable("rule evaluator", "rules engine offline"));
        }
        Ok(self.violations.read().clone())
    }
}

async fn stall_while(stalled: &AtomicBool) {
    if stalled.load(Ordering::SeqCst) {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_market_data_omits_unknown_symbols() {
        let provider = InMemoryMarketData::new()
            .with_quote("SPY", 500.0, 1.0)
            .with_sentiment(70.0, 18.0);

        let quotes = provider
            .current_quotes(&["SPY".to_string(), "NOPE".to_string()])
            .await
            .unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(provider.sentiment().await.unwrap().fear_greed_index, 70.0);

        provider.set_failing(true);
        assert!(provider.sentiment().await.is_err());
    }

    #[tokio::test]
    async fn test_history_ends_at_current_price() {
        let provider = InMemoryMarketData::new().with_quote("QQQ", 110.0, 10.0);
        let series = provider.historical_quotes("QQQ", 3).await.unwrap();
        assert_eq!(series.len(), 3);
        assert!((series[0].price - 100.0).abs() < 1e-9);
        assert_eq!(series[2].price, 110.0);
        assert!(series[0].at < series[2].at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_scorer_never_answers() {
        let scorer = InMemoryScorer::new();
        scorer.set_stalled(true);

        let request = ScoringRequest {
            budget: 10_000.0,
            timeframe: "medium".into(),
            risk_level: "medium".into(),
            quotes: Vec::new(),
            sentiment: Sentiment::default(),
        };
        let call = scorer.timing(&request);
        let outcome = tokio::time::timeout(std::time::Duration::from_secs(3600), call).await;
        assert!(outcome.is_err());
        assert_eq!(scorer.calls(), 1);
    }
}
