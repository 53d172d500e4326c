// Error types shared across the workspace
//
// Decision: None of these are fatal. Validation and collaborator errors are
// recovered inside the workflow and recorded as degradations.

use thiserror::Error;

use crate::decision::{DecisionId, DecisionStatus};

/// Errors from decision state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    /// The decision already left the pending state
    #[error("decision {0} is already resolved")]
    AlreadyResolved(DecisionId),

    /// The requested status is not reachable from the current one
    #[error("decision {id}: illegal transition {from} -> {to}")]
    IllegalTransition {
        id: DecisionId,
        from: DecisionStatus,
        to: DecisionStatus,
    },
}

/// Malformed caller input. Always recovered by clamping or defaulting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} {value} is below the minimum of {minimum}; clamped")]
    BelowMinimum {
        field: &'static str,
        value: f64,
        minimum: f64,
    },

    #[error("unknown {field} '{value}', defaulting to '{default}'")]
    UnknownValue {
        field: &'static str,
        value: String,
        default: String,
    },
}

/// Failure of an external collaborator (market data, scorer, rule evaluator)
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Collaborator could not be reached or returned an error
    #[error("{collaborator} unavailable: {message}")]
    Unavailable {
        collaborator: &'static str,
        message: String,
    },

    /// Collaborator did not answer in time
    #[error("{collaborator} timed out")]
    Timeout { collaborator: &'static str },

    /// Collaborator answered with something unusable
    #[error("{collaborator} returned invalid data: {message}")]
    InvalidResponse {
        collaborator: &'static str,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollaboratorError {
    pub fn unavailable(collaborator: &'static str, message: impl Into<String>) -> Self {
        CollaboratorError::Unavailable {
            collaborator,
            message: message.into(),
        }
    }

    pub fn invalid(collaborator: &'static str, message: impl Into<String>) -> Self {
        CollaboratorError::InvalidResponse {
            collaborator,
            message: message.into(),
        }
    }
}
