//! Decision request and completion callback

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tradegate_core::Decision;

/// Invoked once when a pending decision is approved, rejected or times out.
///
/// Runs outside the coordinator lock. A panic is caught and logged.
pub type CompletionCallback = Arc<dyn Fn(&Decision) + Send + Sync>;

/// Parameters of a new decision
#[derive(Clone)]
pub struct DecisionRequest {
    pub owner: String,
    pub category: String,
    pub payload: serde_json::Value,
    pub rationale: String,
    pub requester: String,
    /// Falls back to the coordinator's default timeout
    pub timeout: Option<Duration>,
    pub on_complete: Option<CompletionCallback>,
}

impl DecisionRequest {
    pub fn new(owner: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            category: category.into(),
            payload: serde_json::Value::Null,
            rationale: String::new(),
            requester: "default_user".to_string(),
            timeout: None,
            on_complete: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = requester.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Decision) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for DecisionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionRequest")
            .field("owner", &self.owner)
            .field("category", &self.category)
            .field("requester", &self.requester)
            .field("timeout", &self.timeout)
            .field("has_callback", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}
