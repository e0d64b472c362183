//! Optimizer configuration.

use serde::{Deserialize, Serialize};

use crate::search::{EffortLevel, SearchOptions};

/// What to do when the effort level selects an empty grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BypassPolicy {
    /// Re-encode once with default settings.
    #[default]
    Reencode,
    /// Return PNG input unchanged. Other formats are still re-encoded.
    Passthrough,
}

/// Settings for [`crate::Optimizer`].
///
/// Missing fields deserialize to their defaults, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Size of the parameter grid, 0..=7.
    pub effort_level: EffortLevel,
    /// Worker threads; 0 means one per available processing unit.
    pub workers: usize,
    /// Pin each worker to its own core.
    pub pin_workers: bool,
    pub bypass: BypassPolicy,
    /// Return PNG input unchanged when the best encoding is not smaller.
    pub keep_smaller_input: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            effort_level: EffortLevel::DEFAULT,
            workers: 0,
            pin_workers: true,
            bypass: BypassPolicy::Reencode,
            keep_smaller_input: true,
        }
    }
}

impl OptimizerConfig {
    pub fn with_effort_level(mut self, level: i32) -> Self {
        self.effort_level = EffortLevel::new(level);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            workers: self.workers,
            pin_workers: self.pin_workers,
        }
    }
}
