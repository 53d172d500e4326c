//! Step graph execution engine
//!
//! The engine module provides the [`StepGraph`] which walks named steps over a
//! [`WorkflowState`](tradegate_core::WorkflowState), suspending at decision
//! gates and resuming once a decision is available.

mod executor;
mod gate;
mod gated;
mod graph;
mod step;

pub use executor::{ExecutorConfig, StepGraph};
pub use gate::{
    gate_router, labels, predicate_fn, AwaitDecisionStep, EscalateStep, FnPredicate, GateConfig,
    GateMarker, GateOutcome, GatePredicate, RequestDecisionStep, TimeoutPolicy, GATE_DATA_KEY,
};
pub use gated::{steps, GatedWorkflow};
pub use graph::{GraphError, Router, StepGraphBuilder, Target};
pub use step::{from_fn, FnStep, Step, StepError};
