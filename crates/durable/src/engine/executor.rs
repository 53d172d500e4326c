//! Step graph executor with suspension support
//!
//! The `StepGraph` is responsible for:
//! - Walking steps from the entry along direct and conditional edges
//! - Suspending at gates and resuming from the suspended step
//! - Turning step errors and panics into a `Failed` status
//! - Handing terminal states to the audit sink

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, instrument, warn};
use tradegate_core::{AuditRecord, RunStatus, WorkflowState};

use super::graph::{Edge, Target};
use super::step::Step;
use crate::audit::AuditSink;

/// Configuration for the step executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum steps executed in one run or resume call
    pub max_steps: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { max_steps: 10_000 }
    }
}

impl ExecutorConfig {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// A validated graph of named steps.
///
/// Built with [`StepGraphBuilder`](super::StepGraphBuilder). One graph serves
/// any number of invocations; each invocation owns its own state.
///
/// Never returns an error: every outcome is written into
/// [`WorkflowState::status`], which callers must check.
pub struct StepGraph {
    name: String,
    entry: String,
    steps: HashMap<String, Arc<dyn Step>>,
    edges: HashMap<String, Edge>,
    config: ExecutorConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

impl StepGraph {
    pub(crate) fn new(
        name: String,
        entry: String,
        steps: HashMap<String, Arc<dyn Step>>,
        edges: HashMap<String, Edge>,
        config: ExecutorConfig,
        audit: Option<Arc<dyn AuditSink>>,
    ) -> Self {
        Self {
            name,
            entry,
            steps,
            edges,
            config,
            audit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Step names, sorted
    pub fn step_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run from the entry step until the state is terminal or suspended
    #[instrument(skip(self, state), fields(graph = %self.name, invocation_id = %state.invocation_id))]
    pub async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        info!("starting run");
        state.reactivate();
        self.drive(state, self.entry.clone()).await
    }

    /// Re-enter a suspended state at the step it suspended on.
    ///
    /// The step is re-run, then routing continues. A state that is not
    /// suspended is returned unchanged.
    #[instrument(skip(self, state), fields(graph = %self.name, invocation_id = %state.invocation_id))]
    pub async fn resume(&self, mut state: WorkflowState) -> WorkflowState {
        let at = match &state.status {
            RunStatus::Suspended { at } => at.clone(),
            other => {
                debug!(status = %other, "resume called on a state that is not suspended");
                return state;
            }
        };
        info!(step = %at, "resuming run");
        state.reactivate();
        self.drive(state, at).await
    }

    async fn drive(&self, mut state: WorkflowState, start: String) -> WorkflowState {
        let mut current = start;
        let mut executed = 0usize;

        loop {
            if executed >= self.config.max_steps {
                warn!(step = %current, max_steps = self.config.max_steps, "step budget exhausted");
                state.fail(
                    current,
                    format!("step budget of {} exhausted", self.config.max_steps),
                );
                break;
            }

            let Some(step) = self.steps.get(&current).cloned() else {
                state.fail(current.clone(), format!("step '{current}' is not defined"));
                break;
            };

            state.enter(current.clone());
            executed += 1;
            debug!(step = %current, executed, "running step");

            match AssertUnwindSafe(step.run(&mut state)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(step = %current, error = %err, "step failed");
                    state.fail(current, err.to_string());
                    break;
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(step = %current, panic = %message, "step panicked");
                    state.fail(current, format!("step panicked: {message}"));
                    break;
                }
            }

            let next = match self.route(&current, &state) {
                Ok(target) => target,
                Err(message) => {
                    warn!(step = %current, %message, "routing failed");
                    state.fail(current, message);
                    break;
                }
            };

            match next {
                Target::Step(name) => current = name,
                Target::End => {
                    state.finish();
                    break;
                }
                Target::Suspend => {
                    info!(step = %current, "run suspended");
                    state.suspend(current);
                    return state;
                }
            }
        }

        info!(status = %state.status, steps = executed, "run finished");
        self.audit(&state).await;
        state
    }

    fn route(&self, from: &str, state: &WorkflowState) -> Result<Target, String> {
        match self.edges.get(from) {
            Some(Edge::Direct(target)) => Ok(target.clone()),
            Some(Edge::Conditional { router, routes }) => {
                let label = std::panic::catch_unwind(AssertUnwindSafe(|| router(state)))
                    .map_err(|panic| format!("router panicked: {}", panic_message(panic.as_ref())))?;
                routes
                    .get(&label)
                    .cloned()
                    .ok_or_else(|| format!("router returned unmapped label '{label}'"))
            }
            None => Err(format!("step '{from}' has no outgoing edge")),
        }
    }

    async fn audit(&self, state: &WorkflowState) {
        let Some(sink) = &self.audit else {
            return;
        };
        match sink.record(AuditRecord::snapshot(state)).await {
            Ok(sequence) => debug!(sequence, "audit record written"),
            Err(err) => warn!(error = %err, "failed to write audit record"),
        }
    }
}

impl std::fmt::Debug for StepGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepGraph")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("steps", &self.step_names())
            .field("edges", &self.edges)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
