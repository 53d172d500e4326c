//! JSON-lines audit sink
//!
//! One JSON object per line. Reopening a file continues the sequence from the
//! number of records already in it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;
use tradegate_core::AuditRecord;

use super::{AuditError, AuditSink};

struct Writer {
    file: tokio::fs::File,
    last_sequence: u64,
}

pub struct JsonlAuditSink {
    path: PathBuf,
    writer: Mutex<Writer>,
}

impl JsonlAuditSink {
    /// Open (or create) an audit log at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let last_sequence = match tokio::fs::read_to_string(&path).await {
            Ok(existing) => existing.lines().filter(|l| !l.trim().is_empty()).count() as u64,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), last_sequence, "opened audit log");

        Ok(Self {
            path,
            writer: Mutex::new(Writer {
                file,
                last_sequence,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<u64, AuditError> {
        let mut writer = self.writer.lock().await;
        let sequence = writer.last_sequence + 1;

        let mut line = serde_json::to_vec(&record.with_sequence(sequence))?;
        line.push(b'\n');
        writer.file.write_all(&line).await?;
        writer.file.flush().await?;

        writer.last_sequence = sequence;
        Ok(sequence)
    }
}
