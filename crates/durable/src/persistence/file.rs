//! JSON-file implementation of DecisionStore
//!
//! Layout under the data directory:
//! - `decisions.json`: array of every known decision
//! - `history.json`: array of history entries, newest first
//!
//! Each file is written to a temporary sibling and renamed into place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use tradegate_core::{Decision, HistoryEntry};

use super::store::*;

const DECISIONS_FILE: &str = "decisions.json";
const HISTORY_FILE: &str = "history.json";

/// Decision store backed by two JSON files
#[derive(Debug, Clone)]
pub struct JsonFileDecisionStore {
    dir: PathBuf,
}

impl JsonFileDecisionStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn decisions_path(&self) -> PathBuf {
        self.dir.join(DECISIONS_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }
}

impl DecisionStore for JsonFileDecisionStore {
    fn load(&self) -> Result<DecisionSnapshot, StoreError> {
        Ok(DecisionSnapshot {
            decisions: read_json(&self.decisions_path())?.unwrap_or_default(),
            history: read_json(&self.history_path())?.unwrap_or_default(),
        })
    }

    fn save(&self, decisions: &[&Decision], history: &[HistoryEntry]) -> Result<(), StoreError> {
        write_json(&self.decisions_path(), &decisions)?;
        write_json(&self.history_path(), &history)?;
        debug!(
            dir = %self.dir.display(),
            decisions = decisions.len(),
            history = history.len(),
            "persisted decision state"
        );
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");

    let mut file = fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
    file.write_all(&bytes).map_err(|e| StoreError::io(&tmp, e))?;
    file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}
