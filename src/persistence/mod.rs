//! Persistence layer for pipeline run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteRunStore;

pub use crate::core::RunStatus;
use crate::core::Pipeline;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    /// Pipeline name
    pub pipeline_name: String,

    /// Run status
    pub status: RunStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run completed (if finished)
    pub completed_at: Option<DateTime<Utc>>,

    /// Exit code: first fatal failing step's code, or 0
    pub exit_code: i32,

    /// Number of completed steps
    pub completed_steps: usize,

    /// Number of failed steps (fatal and masked)
    pub failed_steps: usize,

    /// Total number of steps
    pub total_steps: usize,
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a pipeline run
    async fn save_run(&self, run: &RunSummary) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>>;

    /// List all runs for a pipeline
    async fn list_runs(&self, pipeline_name: &str) -> Result<Vec<RunSummary>>;

    /// List all pipeline names
    async fn list_pipelines(&self) -> Result<Vec<String>>;
}

/// In-memory persistence (for testing or ephemeral use)
pub struct InMemoryPersistence {
    runs: tokio::sync::RwLock<std::collections::HashMap<Uuid, RunSummary>>,
    by_pipeline: tokio::sync::RwLock<std::collections::HashMap<String, Vec<Uuid>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            runs: tokio::sync::RwLock::new(std::collections::HashMap::new()),
            by_pipeline: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        let mut runs = self.runs.write().await;
        runs.insert(run.run_id, run.clone());

        let mut by_pipeline = self.by_pipeline.write().await;
        by_pipeline
            .entry(run.pipeline_name.clone())
            .or_insert_with(Vec::new)
            .push(run.run_id);

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let runs = self.runs.read().await;
        Ok(runs.get(&run_id).cloned())
    }

    async fn list_runs(&self, pipeline_name: &str) -> Result<Vec<RunSummary>> {
        let runs = self.runs.read().await;
        let by_pipeline = self.by_pipeline.read().await;

        if let Some(ids) = by_pipeline.get(pipeline_name) {
            let mut result = Vec::new();
            for id in ids {
                if let Some(run) = runs.get(id) {
                    result.push(run.clone());
                }
            }
            Ok(result)
        } else {
            Ok(Vec::new())
        }
    }

    async fn list_pipelines(&self) -> Result<Vec<String>> {
        let by_pipeline = self.by_pipeline.read().await;
        Ok(by_pipeline.keys().cloned().collect())
    }
}

/// Create a summary from a pipeline
pub fn create_summary(pipeline: &Pipeline) -> RunSummary {
    RunSummary {
        run_id: pipeline.state.run_id,
        pipeline_name: pipeline.name.clone(),
        status: pipeline.state.status,
        started_at: pipeline.state.started_at.unwrap_or_else(Utc::now),
        completed_at: pipeline.state.completed_at,
        exit_code: pipeline.state.exit_code,
        completed_steps: pipeline.state.completed_steps,
        failed_steps: pipeline.state.failed_steps,
        total_steps: pipeline.state.total_steps,
    }
}
