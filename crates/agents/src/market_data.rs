//! Market data agent
//!
//! Collects index quotes, sentiment and a short price history, then grades
//! the data. Extreme sentiment, incomplete data and volatile sessions are
//! sent for review before the snapshot is published.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tradegate_core::{MarketDataProvider, Quote, Sentiment, WorkflowState};
use tradegate_durable::coordinator::DecisionCoordinator;
use tradegate_durable::engine::{GateConfig, GatePredicate, GatedWorkflow, Step, StepError};

use crate::market::{
    read, read_history, read_quotes, read_requested_symbols, read_sentiment, write,
    CollectMarketData,
};
use crate::validation::keys;

pub const OWNER: &str = "market_data";
pub const CATEGORY: &str = "market_data_review";

pub const DEFAULT_SYMBOLS: &[&str] = &["SPY", "QQQ", "DIA", "IWM"];

/// Days of history fetched per symbol
pub const HISTORY_DAYS: u32 = 5;

pub mod score_keys {
    pub const COMPLETENESS: &str = "data_completeness";
    pub const AVG_ABS_CHANGE: &str = "avg_abs_change";
    pub const FEAR_GREED: &str = "fear_greed_index";
}

pub mod data_keys {
    pub const TRENDS: &str = "trends";
    pub const SNAPSHOT: &str = "market_snapshot";
}

/// Average absolute daily move above which the session counts as volatile
pub const HIGH_VOLATILITY_CHANGE: f64 = 2.0;

/// Percentage of requested symbols that returned a quote
pub fn completeness(requested: usize, received: usize) -> f64 {
    if requested == 0 {
        return 100.0;
    }
    (received.min(requested) as f64 / requested as f64) * 100.0
}

pub fn average_abs_change(quotes: &[Quote]) -> f64 {
    if quotes.is_empty() {
        return 0.0;
    }
    quotes.iter().map(|q| q.change_percent.abs()).sum::<f64>() / quotes.len() as f64
}

/// Percent change from the first to the last price in a series
fn trend(series: &[Quote]) -> Option<f64> {
    let first = series.first()?.price;
    let last = series.last()?.price;
    (first > 0.0).then(|| (last - first) / first * 100.0)
}

/// Published snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub quotes: Vec<Quote>,
    pub sentiment: Sentiment,
    pub completeness: f64,
    pub trends: BTreeMap<String, f64>,
}

/// Grades completeness and volatility, and derives per-symbol trends
pub struct AnalyzeMarketData;

#[async_trait]
impl Step for AnalyzeMarketData {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let quotes = read_quotes(state);
        let requested = read_requested_symbols(state).len();
        let sentiment = read_sentiment(state);

        let completeness = completeness(requested, quotes.len());
        let avg_change = average_abs_change(&quotes);
        let trends: BTreeMap<String, f64> = read_history(state)
            .iter()
            .filter_map(|(symbol, series)| trend(series).map(|t| (symbol.clone(), t)))
            .collect();

        state.set_score(score_keys::COMPLETENESS, completeness);
        state.set_score(score_keys::AVG_ABS_CHANGE, avg_change);
        state.set_score(score_keys::FEAR_GREED, sentiment.fear_greed_index);
        state.narrate(format!(
            "data {completeness:.0}% complete, average move {avg_change:.2}%, {} trends",
            trends.len()
        ));
        write(state, data_keys::TRENDS, &trends)
    }
}

/// Gates extreme sentiment, incomplete data and volatile sessions
#[derive(Debug, Clone)]
pub struct MarketDataGate {
    pub extreme_greed: f64,
    pub extreme_fear: f64,
    pub min_completeness: f64,
}

impl Default for MarketDataGate {
    fn default() -> Self {
        Self {
            extreme_greed: 80.0,
            extreme_fear: 20.0,
            min_completeness: 70.0,
        }
    }
}

impl MarketDataGate {
    pub fn reasons(&self, state: &WorkflowState) -> Vec<String> {
        let mut reasons = Vec::new();
        let index = state.score(score_keys::FEAR_GREED).unwrap_or(50.0);
        if index > self.extreme_greed || index < self.extreme_fear {
            reasons.push(format!("extreme sentiment, fear/greed {index:.0}"));
        }
        let completeness = state.score(score_keys::COMPLETENESS).unwrap_or(100.0);
        if completeness < self.min_completeness {
            reasons.push(format!("data only {completeness:.0}% complete"));
        }
        let change = state.score(score_keys::AVG_ABS_CHANGE).unwrap_or(0.0);
        if change > HIGH_VOLATILITY_CHANGE {
            reasons.push(format!("high volatility, average move {change:.2}%"));
        }
        reasons
    }
}

impl GatePredicate for MarketDataGate {
    fn should_gate(&self, state: &WorkflowState) -> bool {
        !self.reasons(state).is_empty()
    }

    fn rationale(&self, state: &WorkflowState) -> String {
        format!(
            "Market data collection with {} indices: {}",
            read_requested_symbols(state).len(),
            self.reasons(state).join("; ")
        )
    }
}

pub struct PublishSnapshot;

#[async_trait]
impl Step for PublishSnapshot {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        let snapshot = MarketSnapshot {
            quotes: read_quotes(state),
            sentiment: read_sentiment(state),
            completeness: state.score(score_keys::COMPLETENESS).unwrap_or(100.0),
            trends: read(state, data_keys::TRENDS),
        };
        state.narrate("market snapshot published");
        write(state, data_keys::SNAPSHOT, &snapshot)
    }
}

pub fn workflow(coordinator: DecisionCoordinator, provider: Arc<dyn MarketDataProvider>) -> GatedWorkflow {
    GatedWorkflow::new(coordinator, GateConfig::new(OWNER, CATEGORY))
        .predicate(MarketDataGate::default())
        .collect(CollectMarketData::new(provider, DEFAULT_SYMBOLS).with_history(HISTORY_DAYS))
        .score(AnalyzeMarketData)
        .finalize(PublishSnapshot)
}

pub fn request(symbols: &[&str]) -> WorkflowState {
    WorkflowState::new(OWNER).with_input(keys::SYMBOLS, symbols.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn quote(symbol: &str, price: f64, change_percent: f64) -> Quote {
        Quote {
            symbol: symbol.into(),
            price,
            change_percent,
            volume: 1_000,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_completeness() {
        assert_eq!(completeness(4, 4), 100.0);
        assert_eq!(completeness(4, 2), 50.0);
        assert_eq!(completeness(0, 0), 100.0);
    }

    #[test]
    fn test_average_abs_change() {
        let quotes = vec![quote("SPY", 500.0, -3.0), quote("QQQ", 400.0, 2.0)];
        assert_eq!(average_abs_change(&quotes), 2.5);
        assert_eq!(average_abs_change(&[]), 0.0);
    }

    #[test]
    fn test_trend() {
        let series = vec![quote("SPY", 100.0, 0.0), quote("SPY", 110.0, 0.0)];
        assert!((trend(&series).unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(trend(&[]), None);
    }

    #[test]
    fn test_gate_triggers() {
        let gate = MarketDataGate::default();
        let mut calm = WorkflowState::new(OWNER);
        calm.set_score(score_keys::FEAR_GREED, 55.0);
        calm.set_score(score_keys::COMPLETENESS, 100.0);
        calm.set_score(score_keys::AVG_ABS_CHANGE, 0.8);
        assert!(!gate.should_gate(&calm));

        for (key, value) in [
            (score_keys::FEAR_GREED, 85.0),
            (score_keys::FEAR_GREED, 15.0),
            (score_keys::COMPLETENESS, 50.0),
            (score_keys::AVG_ABS_CHANGE, 2.5),
        ] {
            let mut state = calm.clone();
            state.set_score(key, value);
            assert!(gate.should_gate(&state), "{key} = {value} should gate");
        }
    }
}
