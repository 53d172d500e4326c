//! Coordinator configuration
//!
//! Loaded from environment variables with defaults for every field.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the [`DecisionCoordinator`](crate::coordinator::DecisionCoordinator)
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Directory holding `decisions.json` and `history.json`
    pub data_dir: PathBuf,

    /// Maximum number of history entries kept (oldest evicted first)
    pub history_cap: usize,

    /// Timeout used when a request does not carry its own
    pub default_timeout: Duration,

    /// Global autonomous mode: every decision is bypassed
    pub autonomous: bool,

    /// Whether owners without an explicit override require a human
    pub default_requires_human: bool,

    /// Capacity of the resolution broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/hitl"),
            history_cap: 1000,
            default_timeout: Duration::from_secs(300),
            autonomous: false,
            default_requires_human: false,
            broadcast_capacity: 256,
        }
    }
}

impl CoordinatorConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `TRADEGATE_DATA_DIR`: persistence directory (default: data/hitl)
    /// - `TRADEGATE_HISTORY_CAP`: history size (default: 1000)
    /// - `TRADEGATE_DECISION_TIMEOUT_SECS`: default decision timeout (default: 300)
    /// - `TRADEGATE_AUTONOMOUS`: bypass every decision (default: false)
    /// - `TRADEGATE_REQUIRE_HUMAN`: require review for owners without override (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let data_dir = std::env::var("TRADEGATE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let history_cap = std::env::var("TRADEGATE_HISTORY_CAP")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.history_cap);

        let default_timeout = std::env::var("TRADEGATE_DECISION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.default_timeout);

        Self {
            data_dir,
            history_cap,
            default_timeout,
            autonomous: env_flag("TRADEGATE_AUTONOMOUS").unwrap_or(defaults.autonomous),
            default_requires_human: env_flag("TRADEGATE_REQUIRE_HUMAN")
                .unwrap_or(defaults.default_requires_human),
            ..defaults
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_autonomous(mut self, autonomous: bool) -> Self {
        self.autonomous = autonomous;
        self
    }

    pub fn with_default_requires_human(mut self, required: bool) -> Self {
        self.default_requires_human = required;
        self
    }

    pub fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}
