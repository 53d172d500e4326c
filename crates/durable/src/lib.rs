//! # Durable Decision Engine
//!
//! Single-process workflow orchestration with human-in-the-loop decision gates.
//!
//! ## Features
//!
//! - **Decision coordination**: pending decisions with cancellable timeouts, autonomous bypass policy
//! - **Crash recovery**: decisions persisted to JSON files; pending timers re-armed on restart
//! - **Step graphs**: named steps, conditional edges, loop-backs and a step budget
//! - **Suspension**: runs halt at a pending gate and resume later from the same step
//! - **Auditing**: one append-only record per terminal run
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        StepGraph                             │
//! │  (walks steps, routes on gate outcomes, suspends/resumes)   │
//! └─────────────────────────────────────────────────────────────┘
//!                │                                │
//!                ▼                                ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────┐
//! │     DecisionCoordinator      │  │        AuditSink         │
//! │ (pending/resolved, timers,   │  │  (terminal snapshots)    │
//! │  bypass policy, broadcast)   │  └──────────────────────────┘
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │        DecisionStore         │
//! │ (decisions.json/history.json)│
//! └──────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use tradegate_durable::prelude::*;
//!
//! let coordinator = DecisionCoordinator::from_config(CoordinatorConfig::from_env()).await?;
//!
//! let graph = GatedWorkflow::new(coordinator.clone(), GateConfig::new("my_agent", "review"))
//!     .predicate(predicate_fn(|state| state.score("risk").unwrap_or(0.0) > 2.5))
//!     .collect(CollectStep)
//!     .score(ScoreStep)
//!     .finalize(FinalizeStep)
//!     .build()?;
//!
//! let state = graph.run(WorkflowState::new("my_agent")).await;
//! if let RunStatus::Suspended { .. } = state.status {
//!     // approve through the coordinator, then
//!     let state = graph.resume(state).await;
//! }
//! ```

pub mod audit;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod persistence;

/// Prelude for common imports
pub mod prelude {
    pub use crate::audit::{AuditError, AuditSink, InMemoryAuditSink, JsonlAuditSink};
    pub use crate::config::CoordinatorConfig;
    pub use crate::coordinator::{
        CompletionCallback, CoordinatorStats, DecisionCoordinator, DecisionRequest,
        PolicySnapshot,
    };
    pub use crate::engine::{
        from_fn, predicate_fn, ExecutorConfig, GateConfig, GatePredicate, GatedWorkflow,
        GraphError, Step, StepError, StepGraph, StepGraphBuilder, Target, TimeoutPolicy,
    };
    pub use crate::persistence::{
        DecisionSnapshot, DecisionStore, InMemoryDecisionStore, JsonFileDecisionStore,
        StoreError,
    };
    pub use tradegate_core::{
        AuditRecord, Decision, DecisionId, DecisionStatus, RunStatus, WorkflowState,
    };
}

// Re-export key types at crate root
pub use audit::{AuditError, AuditSink, InMemoryAuditSink, JsonlAuditSink};
pub use config::CoordinatorConfig;
pub use coordinator::{DecisionCoordinator, DecisionRequest, PolicySnapshot};
pub use engine::{
    ExecutorConfig, GateConfig, GatePredicate, GatedWorkflow, GraphError, Step, StepError,
    StepGraph, StepGraphBuilder, Target, TimeoutPolicy,
};
pub use persistence::{
    DecisionSnapshot, DecisionStore, InMemoryDecisionStore, JsonFileDecisionStore, StoreError,
};
