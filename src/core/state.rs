//! Run state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall pipeline run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    Pending,
    /// Run is in progress
    Running,
    /// All steps finished without a fatal failure
    Completed,
    /// A fatal step failure aborted the run
    Failed,
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    /// Step has not run yet
    Pending,
    /// Step is currently executing
    Running {
        started_at: DateTime<Utc>,
    },
    /// Step exited zero
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step exited non-zero or could not run
    Failed {
        exit_code: i32,
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Step never executed because an earlier step failed fatally
    Skipped {
        reason: String,
    },
}

impl StepState {
    /// Check if the step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Completed { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }
}

/// Bookkeeping for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current run status
    pub status: RunStatus,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run completed or failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Exit code of the run: first fatal failing step's code, or 0
    pub exit_code: i32,

    /// Total number of steps
    pub total_steps: usize,

    /// Number of completed steps
    pub completed_steps: usize,

    /// Number of failed steps (fatal and masked)
    pub failed_steps: usize,

    /// Number of skipped steps
    pub skipped_steps: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            exit_code: 0,
            total_steps: 0,
            completed_steps: 0,
            failed_steps: 0,
            skipped_steps: 0,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Mark the run as completed
    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed with the given exit code
    pub fn fail(&mut self, exit_code: i32) {
        self.status = RunStatus::Failed;
        self.exit_code = exit_code;
        self.completed_at = Some(Utc::now());
    }

    /// Calculate progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        (self.completed_steps + self.failed_steps + self.skipped_steps) as f64
            / self.total_steps as f64
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
