//! DecisionStore trait definition

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tradegate_core::{Decision, HistoryEntry};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store refused the write
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Everything the coordinator persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionSnapshot {
    /// Every known decision, pending and resolved
    pub decisions: Vec<Decision>,
    /// Newest first
    pub history: Vec<HistoryEntry>,
}

/// Storage for coordinator state.
///
/// Calls are synchronous: the coordinator writes the full state under its
/// mutex after every mutation, so the write order matches the mutation order.
pub trait DecisionStore: Send + Sync + 'static {
    /// Load everything persisted so far. A store with nothing written returns
    /// an empty snapshot.
    fn load(&self) -> Result<DecisionSnapshot, StoreError>;

    /// Replace the persisted state
    fn save(&self, decisions: &[&Decision], history: &[HistoryEntry]) -> Result<(), StoreError>;
}
