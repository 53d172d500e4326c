//! Caller input validation
//!
//! Nothing here rejects a request. Out-of-range numbers are clamped, unknown
//! enum values fall back to `Medium`, and every correction is returned as a
//! [`ValidationError`] for the caller to record as a degradation.

use std::fmt;

use serde::{Deserialize, Serialize};
use tradegate_core::{ValidationError, WorkflowState};

/// Smallest budget a portfolio is built for
pub const MIN_BUDGET: f64 = 1000.0;

/// Degradation source used for validation corrections
pub const VALIDATION_SOURCE: &str = "validation";

/// Input keys shared by the agents
pub mod keys {
    pub const BUDGET: &str = "budget";
    pub const TIMEFRAME: &str = "timeframe";
    pub const RISK_LEVEL: &str = "risk_level";
    pub const SYMBOLS: &str = "symbols";
    pub const PORTFOLIO: &str = "portfolio";
}

/// Investment horizon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    Short,
    #[default]
    Medium,
    Long,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Short => "Short",
            Timeframe::Medium => "Medium",
            Timeframe::Long => "Long",
        }
    }

    /// Case-insensitive parse
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Timeframe::Short),
            "medium" => Ok(Timeframe::Medium),
            "long" => Ok(Timeframe::Long),
            _ => Err(ValidationError::UnknownValue {
                field: keys::TIMEFRAME,
                value: value.to_string(),
                default: Timeframe::default().to_string(),
            }),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk appetite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(ValidationError::UnknownValue {
                field: keys::RISK_LEVEL,
                value: value.to_string(),
                default: RiskLevel::default().to_string(),
            }),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized investment parameters
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentInputs {
    pub budget: f64,
    pub timeframe: Timeframe,
    pub risk_level: RiskLevel,
}

/// Clamp a budget to [`MIN_BUDGET`]. Missing or non-finite budgets count as zero.
pub fn validate_budget(budget: Option<f64>) -> (f64, Option<ValidationError>) {
    let value = budget.filter(|b| b.is_finite()).unwrap_or(0.0);
    if value < MIN_BUDGET {
        (
            MIN_BUDGET,
            Some(ValidationError::BelowMinimum {
                field: keys::BUDGET,
                value,
                minimum: MIN_BUDGET,
            }),
        )
    } else {
        (value, None)
    }
}

/// Read and normalize budget, timeframe and risk level from the state inputs.
///
/// Missing timeframe or risk level silently defaults; present but unknown
/// values default with an error.
pub fn investment_inputs(state: &WorkflowState) -> (InvestmentInputs, Vec<ValidationError>) {
    let mut errors = Vec::new();

    let (budget, budget_error) = validate_budget(state.input_f64(keys::BUDGET));
    errors.extend(budget_error);

    let timeframe = match state.input_str(keys::TIMEFRAME) {
        Some(raw) => Timeframe::parse(raw).unwrap_or_else(|err| {
            errors.push(err);
            Timeframe::default()
        }),
        None => Timeframe::default(),
    };

    let risk_level = match state.input_str(keys::RISK_LEVEL) {
        Some(raw) => RiskLevel::parse(raw).unwrap_or_else(|err| {
            errors.push(err);
            RiskLevel::default()
        }),
        None => RiskLevel::default(),
    };

    (
        InvestmentInputs {
            budget,
            timeframe,
            risk_level,
        },
        errors,
    )
}

/// Normalize the investment inputs in place, recording each correction
pub fn apply_investment_inputs(state: &mut WorkflowState) -> InvestmentInputs {
    let (inputs, errors) = investment_inputs(state);
    for err in errors {
        tracing::warn!(owner = %state.owner, error = %err, "input corrected");
        state.degrade(VALIDATION_SOURCE, err.to_string());
    }
    state.set_input(keys::BUDGET, inputs.budget);
    state.set_input(keys::TIMEFRAME, inputs.timeframe.as_str());
    state.set_input(keys::RISK_LEVEL, inputs.risk_level.as_str());
    inputs
}

/// Requested symbols, upper-cased and de-duplicated in order.
/// Falls back to `default` when the input is missing or empty.
pub fn symbols(state: &WorkflowState, default: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if let Some(values) = state.input(keys::SYMBOLS).and_then(|v| v.as_array()) {
        for symbol in values.iter().filter_map(|v| v.as_str()) {
            let symbol = symbol.trim().to_ascii_uppercase();
            if !symbol.is_empty() && !out.contains(&symbol) {
                out.push(symbol);
            }
        }
    }
    if out.is_empty() {
        out = default.iter().map(|s| s.to_string()).collect();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_budget_below_minimum_is_clamped() {
        let (budget, err) = validate_budget(Some(250.0));
        assert_eq!(budget, MIN_BUDGET);
        assert_eq!(
            err.unwrap().to_string(),
            "budget 250 is below the minimum of 1000; clamped"
        );

        assert_eq!(validate_budget(Some(5000.0)), (5000.0, None));
        assert_eq!(validate_budget(None).0, MIN_BUDGET);
        assert_eq!(validate_budget(Some(f64::NAN)).0, MIN_BUDGET);
    }

    #[test]
    fn test_enums_parse_case_insensitively() {
        assert_eq!(Timeframe::parse("long").unwrap(), Timeframe::Long);
        assert_eq!(RiskLevel::parse(" HIGH ").unwrap(), RiskLevel::High);
        assert!(Timeframe::parse("Weekly").is_err());
        assert!(RiskLevel::parse("").is_err());
    }

    #[test]
    fn test_apply_defaults_and_records_degradations() {
        let mut state = WorkflowState::new("portfolio_optimizer")
            .with_input("budget", 10)
            .with_input("timeframe", "Forever")
            .with_input("risk_level", "Low");

        let inputs = apply_investment_inputs(&mut state);

        assert_eq!(
            inputs,
            InvestmentInputs {
                budget: MIN_BUDGET,
                timeframe: Timeframe::Medium,
                risk_level: RiskLevel::Low,
            }
        );
        assert_eq!(state.degradations.len(), 2);
        assert!(state
            .degradations
            .iter()
            .all(|d| d.source == VALIDATION_SOURCE));
        assert_eq!(state.input_str("timeframe"), Some("Medium"));
        assert_eq!(state.input_f64("budget"), Some(MIN_BUDGET));
    }

    #[test]
    fn test_missing_enums_default_silently() {
        let state = WorkflowState::new("timing_advisor").with_input("budget", 2000);
        let (inputs, errors) = investment_inputs(&state);
        assert_eq!(inputs.timeframe, Timeframe::Medium);
        assert_eq!(inputs.risk_level, RiskLevel::Medium);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_symbols_normalized_with_fallback() {
        let state = WorkflowState::new("market_data")
            .with_input("symbols", json!(["spy", "QQQ", "spy", " "]));
        assert_eq!(symbols(&state, &["DIA"]), vec!["SPY", "QQQ"]);

        let state = WorkflowState::new("market_data");
        assert_eq!(symbols(&state, &["DIA"]), vec!["DIA"]);
    }
}
