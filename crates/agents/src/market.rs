//! Market data collection shared by the agents

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use tradegate_core::{CollaboratorError, MarketDataProvider, Quote, Sentiment, WorkflowState};
use tradegate_durable::engine::{Step, StepError};

use crate::validation::{apply_investment_inputs, symbols};

/// Keys written into [`WorkflowState::data`]
pub mod data_keys {
    pub const SYMBOLS: &str = "requested_symbols";
    pub const QUOTES: &str = "quotes";
    pub const SENTIMENT: &str = "sentiment";
    pub const HISTORY: &str = "history";
}

/// Degradation sources
pub mod sources {
    pub const QUOTES: &str = "quotes";
    pub const SENTIMENT: &str = "sentiment";
    pub const HISTORY: &str = "history";
}

/// Upper bound on any single collaborator call
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Await a collaborator call, giving up after `limit`
pub(crate) async fn bounded<T>(
    collaborator: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T, CollaboratorError>>,
) -> Result<T, CollaboratorError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(CollaboratorError::Timeout { collaborator }))
}

pub(crate) fn write<T: Serialize>(state: &mut WorkflowState, key: &str, value: &T) -> Result<(), StepError> {
    let value = serde_json::to_value(value).map_err(anyhow::Error::from)?;
    state.set_data(key, value);
    Ok(())
}

pub(crate) fn read<T: DeserializeOwned + Default>(state: &WorkflowState, key: &str) -> T {
    state
        .data(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

pub fn read_quotes(state: &WorkflowState) -> Vec<Quote> {
    read(state, data_keys::QUOTES)
}

/// Neutral sentiment when none was collected
pub fn read_sentiment(state: &WorkflowState) -> Sentiment {
    read(state, data_keys::SENTIMENT)
}

pub fn read_requested_symbols(state: &WorkflowState) -> Vec<String> {
    read(state, data_keys::SYMBOLS)
}

pub fn read_history(state: &WorkflowState) -> BTreeMap<String, Vec<Quote>> {
    read(state, data_keys::HISTORY)
}

/// Fetches quotes and sentiment for the requested symbols.
///
/// Provider failures and calls that outlive the timeout degrade to an empty
/// quote list or neutral sentiment.
pub struct CollectMarketData {
    provider: Arc<dyn MarketDataProvider>,
    default_symbols: &'static [&'static str],
    history_days: Option<u32>,
    investment_inputs: bool,
    timeout: Duration,
}

impl CollectMarketData {
    pub fn new(provider: Arc<dyn MarketDataProvider>, default_symbols: &'static [&'static str]) -> Self {
        Self {
            provider,
            default_symbols,
            history_days: None,
            investment_inputs: false,
            timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    /// Per-call limit for provider requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Also fetch `days` of daily history per symbol
    pub fn with_history(mut self, days: u32) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Normalize budget, timeframe and risk level before collecting
    pub fn with_investment_inputs(mut self) -> Self {
        self.investment_inputs = true;
        self
    }
}

#[async_trait]
impl Step for CollectMarketData {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        if self.investment_inputs {
            apply_investment_inputs(state);
        }

        let symbols = symbols(state, self.default_symbols);
        write(state, data_keys::SYMBOLS, &symbols)?;

        let call = self.provider.current_quotes(&symbols);
        let quotes = match bounded("market data", self.timeout, call).await {
            Ok(quotes) => quotes,
            Err(err) => {
                warn!(owner = %state.owner, error = %err, "quotes unavailable");
                state.degrade(sources::QUOTES, err.to_string());
                Vec::new()
            }
        };

        let sentiment = match bounded("market data", self.timeout, self.provider.sentiment()).await {
            Ok(sentiment) => sentiment,
            Err(err) => {
                warn!(owner = %state.owner, error = %err, "sentiment unavailable");
                state.degrade(sources::SENTIMENT, err.to_string());
                Sentiment::default()
            }
        };

        if let Some(days) = self.history_days {
            let mut history = BTreeMap::new();
            for symbol in &symbols {
                let call = self.provider.historical_quotes(symbol, days);
                match bounded("market data", self.timeout, call).await {
                    Ok(series) => {
                        history.insert(symbol.clone(), series);
                    }
                    Err(err) => {
                        warn!(%symbol, error = %err, "history unavailable");
                        state.degrade(sources::HISTORY, format!("{symbol}: {err}"));
                    }
                }
            }
            write(state, data_keys::HISTORY, &history)?;
        }

        debug!(
            owner = %state.owner,
            requested = symbols.len(),
            received = quotes.len(),
            "market data collected"
        );
        state.narrate(format!(
            "collected {} of {} quotes; fear/greed {:.0}, VIX {:.1}",
            quotes.len(),
            symbols.len(),
            sentiment.fear_greed_index,
            sentiment.vix
        ));
        write(state, data_keys::QUOTES, &quotes)?;
        write(state, data_keys::SENTIMENT, &sentiment)
    }
}
