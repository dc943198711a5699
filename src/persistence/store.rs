//! SQLite-based persistence store

use crate::core::RunStatus;
use crate::persistence::{PersistenceBackend, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// SQLite run store
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    /// Create a new SQLite store
    pub async fn new(db_path: &str) -> Result<Self> {
        let pool = SqlitePool::connect(&format!("sqlite:{}", db_path))
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("deployctl");
        std::fs::create_dir_all(&db_dir)?;

        let db_path = db_dir.join("runs.db");
        let db_path = db_path
            .to_str()
            .context("Database path is not valid UTF-8")?;
        // mode=rwc creates the database file on first use
        Self::new(&format!("{}?mode=rwc", db_path)).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                pipeline_name TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                exit_code INTEGER NOT NULL DEFAULT 0,
                completed_steps INTEGER NOT NULL DEFAULT 0,
                failed_steps INTEGER NOT NULL DEFAULT 0,
                total_steps INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_pipeline_name ON runs(pipeline_name);
            CREATE INDEX IF NOT EXISTS idx_status ON runs(status);
            CREATE INDEX IF NOT EXISTS idx_started_at ON runs(started_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn summary_from_row(row: &SqliteRow) -> Result<RunSummary> {
        Ok(RunSummary {
            run_id: Uuid::parse_str(&row.get::<String, _>("id"))?,
            pipeline_name: row.get("pipeline_name"),
            status: match row.get::<String, _>("status").as_str() {
                "Pending" => RunStatus::Pending,
                "Running" => RunStatus::Running,
                "Completed" => RunStatus::Completed,
                "Failed" => RunStatus::Failed,
                _ => RunStatus::Pending,
            },
            started_at: Self::from_naive(row.get("started_at")),
            completed_at: row
                .get::<Option<NaiveDateTime>, _>("completed_at")
                .map(Self::from_naive),
            exit_code: row.get::<i64, _>("exit_code") as i32,
            completed_steps: row.get::<i64, _>("completed_steps") as usize,
            failed_steps: row.get::<i64, _>("failed_steps") as usize,
            total_steps: row.get::<i64, _>("total_steps") as usize,
        })
    }

    /// Most recent run of a pipeline
    pub async fn latest_run(&self, pipeline_name: &str) -> Result<Option<RunSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, pipeline_name, status, started_at, completed_at, exit_code, completed_steps, failed_steps, total_steps
            FROM runs
            WHERE pipeline_name = ?1
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(pipeline_name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get latest run")?;

        row.as_ref().map(Self::summary_from_row).transpose()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for SqliteRunStore {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs
            (id, pipeline_name, status, started_at, completed_at, exit_code, completed_steps, failed_steps, total_steps)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(run.run_id.to_string())
        .bind(&run.pipeline_name)
        .bind(format!("{:?}", run.status))
        .bind(Self::to_naive(run.started_at))
        .bind(run.completed_at.map(Self::to_naive))
        .bind(run.exit_code as i64)
        .bind(run.completed_steps as i64)
        .bind(run.failed_steps as i64)
        .bind(run.total_steps as i64)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, pipeline_name, status, started_at, completed_at, exit_code, completed_steps, failed_steps, total_steps
            FROM runs
            WHERE id = ?1
            "#,
        )
        .bind(run_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load run")?;

        row.as_ref().map(Self::summary_from_row).transpose()
    }

    async fn list_runs(&self, pipeline_name: &str) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, pipeline_name, status, started_at, completed_at, exit_code, completed_steps, failed_steps, total_steps
            FROM runs
            WHERE pipeline_name = ?1
            ORDER BY started_at DESC
            "#,
        )
        .bind(pipeline_name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list runs")?;

        rows.iter().map(Self::summary_from_row).collect()
    }

    async fn list_pipelines(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT pipeline_name
            FROM runs
            ORDER BY pipeline_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pipelines")?;

        Ok(rows.iter().map(|row| row.get("pipeline_name")).collect())
    }
}
