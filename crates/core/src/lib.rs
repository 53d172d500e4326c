// Tradegate Core
//
// Data model shared by the coordinator, the step engine and the agent workflows.
//
// Key design decisions:
// - Decision owns its own state machine (pending -> one terminal status)
// - WorkflowState is a single named-field record threaded through every step
// - Collaborators (market data, scoring, rules) are async traits with no implementation here
// - Errors are thiserror enums; none of them is fatal to a running workflow

pub mod audit;
pub mod collaborators;
pub mod decision;
pub mod error;
pub mod state;

// Re-exports for convenience
pub use audit::AuditRecord;
pub use collaborators::{
    Allocation, MarketDataProvider, PortfolioSnapshot, Position, Quote, RecommendationScorer,
    RuleEvaluator, ScoringRequest, Sentiment, SentimentRegime, Severity, TimingAssessment,
    TimingSignal, Violation, VolatilityRegime,
};
pub use decision::{Decision, DecisionId, DecisionRef, DecisionStatus, HistoryEntry};
pub use error::{CollaboratorError, DecisionError, ValidationError};
pub use state::{Degradation, RunStatus, WorkflowState};
