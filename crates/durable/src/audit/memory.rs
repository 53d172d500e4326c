//! In-memory audit sink for testing

use async_trait::async_trait;
use parking_lot::Mutex;
use tradegate_core::AuditRecord;

use super::{AuditError, AuditSink};

#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<u64, AuditError> {
        let mut records = self.records.lock();
        let sequence = records.len() as u64 + 1;
        records.push(record.with_sequence(sequence));
        Ok(sequence)
    }
}
