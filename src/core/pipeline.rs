//! Pipeline domain model

use crate::core::{
    config::{PipelineConfig, ServiceConfig},
    state::{RunState, RunStatus, StepState},
    step::{Step, StepDefaults},
};
use std::collections::HashMap;

/// A pipeline definition plus the state of its current run
///
/// Steps are kept in declaration order; that order is the execution order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Run-wide environment variables, passed explicitly to every step
    pub env: HashMap<String, String>,

    /// Auxiliary background services bracketing the run
    pub services: Vec<ServiceConfig>,

    /// Steps in declared order
    pub steps: Vec<Step>,

    /// Run state
    pub state: RunState,
}

impl Pipeline {
    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        let defaults = StepDefaults {
            timeout_secs: config.default_timeout_secs.unwrap_or(600),
        };

        let steps = config
            .steps
            .iter()
            .map(|step_config| Step::from_config(step_config, &defaults))
            .collect();

        Pipeline {
            name: config.name.clone(),
            env: config.env.clone(),
            services: config.services.clone(),
            steps,
            state: RunState::new(),
        }
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Get a mutable step by ID
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Check if every step reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    /// Check if the run failed
    pub fn has_failed(&self) -> bool {
        self.state.status == RunStatus::Failed
    }

    /// Recompute the step counts on the run state
    pub fn update_counts(&mut self) {
        let mut completed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for step in &self.steps {
            match &step.state {
                StepState::Completed { .. } => completed += 1,
                StepState::Failed { .. } => failed += 1,
                StepState::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }

        self.state.total_steps = self.steps.len();
        self.state.completed_steps = completed;
        self.state.failed_steps = failed;
        self.state.skipped_steps = skipped;
    }
}
