//! Step trait and helpers

use async_trait::async_trait;
use tradegate_core::{CollaboratorError, DecisionError, WorkflowState};

/// Errors returned by steps. The engine turns them into a `Failed` status.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("decision error: {0}")]
    Decision(#[from] DecisionError),

    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepError {
    pub fn message(message: impl Into<String>) -> Self {
        StepError::Message(message.into())
    }
}

/// A named unit of work in a step graph.
///
/// Steps run strictly one after another over the invocation's state.
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError>;
}

/// Step built from a synchronous closure
pub struct FnStep<F> {
    f: F,
}

/// Wrap a closure as a [`Step`]
///
/// ```
/// use tradegate_durable::engine::{from_fn, Step};
///
/// let finalize = from_fn(|state| {
///     state.narrate("done");
///     Ok(())
/// });
/// # let _ = finalize;
/// ```
pub fn from_fn<F>(f: F) -> FnStep<F>
where
    F: Fn(&mut WorkflowState) -> Result<(), StepError> + Send + Sync,
{
    FnStep { f }
}

#[async_trait]
impl<F> Step for FnStep<F>
where
    F: Fn(&mut WorkflowState) -> Result<(), StepError> + Send + Sync,
{
    async fn run(&self, state: &mut WorkflowState) -> Result<(), StepError> {
        (self.f)(state)
    }
}
