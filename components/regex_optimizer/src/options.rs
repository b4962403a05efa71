//! Optimizer configuration

use serde::{Deserialize, Serialize};

/// Switches for the individual optimizations
///
/// Every field defaults to `true`; fields missing from a JSON document take
/// their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Turn provably safe greedy loops into committing loops
    pub rewrite_loops_as_atomic_groups: bool,
    /// Hoist the common prefix of alternatives
    pub share_alternation_prefixes: bool,
    /// Fold class characters and ranges into lookup tables
    pub tabulate_character_classes: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            rewrite_loops_as_atomic_groups: true,
            share_alternation_prefixes: true,
            tabulate_character_classes: true,
        }
    }
}

impl OptimizerOptions {
    /// Options with every optimization turned off
    pub fn disabled() -> Self {
        Self {
            rewrite_loops_as_atomic_groups: false,
            share_alternation_prefixes: false,
            tabulate_character_classes: false,
        }
    }

    /// Export options as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import options from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
