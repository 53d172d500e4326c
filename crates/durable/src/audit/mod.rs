//! Audit sinks for terminal workflow outcomes
//!
//! A sink receives one [`AuditRecord`] per run segment that ends in a terminal
//! status and assigns it the next sequence number.

mod jsonl;
mod memory;

use async_trait::async_trait;
use tradegate_core::AuditRecord;

pub use jsonl::JsonlAuditSink;
pub use memory::InMemoryAuditSink;

/// Error type for audit sinks
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only consumer of terminal workflow snapshots
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append a record, returning the sequence number assigned to it
    async fn record(&self, record: AuditRecord) -> Result<u64, AuditError>;
}
