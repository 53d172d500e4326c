//! Bypass policy: global autonomous flag plus per-owner overrides

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default)]
pub(crate) struct Policy {
    autonomous: bool,
    default_requires_human: bool,
    overrides: HashMap<String, bool>,
}

impl Policy {
    pub(crate) fn new(autonomous: bool, default_requires_human: bool) -> Self {
        Self {
            autonomous,
            default_requires_human,
            overrides: HashMap::new(),
        }
    }

    /// Autonomous mode wins over every override
    pub(crate) fn requires_human(&self, owner: &str) -> bool {
        if self.autonomous {
            return false;
        }
        self.overrides
            .get(owner)
            .copied()
            .unwrap_or(self.default_requires_human)
    }

    pub(crate) fn set_autonomous(&mut self, enabled: bool) {
        self.autonomous = enabled;
    }

    pub(crate) fn set_override(&mut self, owner: String, requires_human: bool) {
        self.overrides.insert(owner, requires_human);
    }

    pub(crate) fn clear_override(&mut self, owner: &str) -> Option<bool> {
        self.overrides.remove(owner)
    }

    pub(crate) fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            autonomous: self.autonomous,
            default_requires_human: self.default_requires_human,
            overrides: self
                .overrides
                .iter()
                .map(|(owner, required)| (owner.clone(), *required))
                .collect(),
        }
    }
}

/// Point-in-time copy of the bypass policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub autonomous: bool,
    pub default_requires_human: bool,
    /// owner -> requires human review
    pub overrides: BTreeMap<String, bool>,
}
