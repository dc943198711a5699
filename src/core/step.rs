//! Step domain model

use crate::core::{config::StepConfig, state::StepState};
use std::collections::HashMap;

/// A single step in a pipeline run
#[derive(Debug, Clone)]
pub struct Step {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// Shell command this step runs
    pub command: String,

    /// Per-step environment overrides
    pub env: HashMap<String, String>,

    /// Whether a non-zero exit is masked instead of aborting the run
    pub continue_on_failure: bool,

    /// Timeout in seconds
    pub timeout_secs: u64,

    /// Runtime state (not part of the descriptor)
    pub state: StepState,
}

/// Defaults applied to steps that do not override them
#[derive(Debug, Clone)]
pub struct StepDefaults {
    pub timeout_secs: u64,
}

impl Default for StepDefaults {
    fn default() -> Self {
        // Matches the front-end read timeout for the same application
        Self { timeout_secs: 600 }
    }
}

impl Step {
    /// Create a step from a step config
    pub fn from_config(config: &StepConfig, defaults: &StepDefaults) -> Self {
        Step {
            id: config.id.clone(),
            name: config.name.clone(),
            command: config.command.clone(),
            env: config.env.clone(),
            continue_on_failure: config.continue_on_failure,
            timeout_secs: config.timeout_secs.unwrap_or(defaults.timeout_secs),
            state: StepState::Pending,
        }
    }

    /// Effective environment for this step: run-wide variables with
    /// step overrides layered on top
    pub fn effective_env(&self, run_env: &HashMap<String, String>) -> Vec<(String, String)> {
        let mut env: HashMap<String, String> = run_env.clone();
        for (key, value) in &self.env {
            env.insert(key.clone(), value.clone());
        }

        let mut pairs: Vec<(String, String)> = env.into_iter().collect();
        pairs.sort();
        pairs
    }
}
