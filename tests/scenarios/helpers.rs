//! Test utility functions for deployctl scenarios

use deployctl::core::{Pipeline, RunStatus, StepState};
use deployctl::execution::{
    CommandError, CommandOutcome, CommandRunner, CommandSpec, PipelineRunner, RunEvent, RunReport,
};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock runner that returns scripted exit codes in call order
pub struct MockRunner {
    exit_codes: Arc<Vec<i32>>,
    index: Arc<AtomicUsize>,
    pub calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl MockRunner {
    pub fn new(exit_codes: Vec<i32>) -> Self {
        Self {
            exit_codes: Arc::new(exit_codes),
            index: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome, CommandError> {
        self.calls.lock().unwrap().push(spec.clone());
        let idx = self.index.fetch_add(1, Ordering::SeqCst);
        let exit_code = self.exit_codes.get(idx).copied().unwrap_or(0);
        Ok(CommandOutcome {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Run a pipeline against scripted exit codes and collect everything
pub async fn run_pipeline_with_mock(pipeline: &mut Pipeline, exit_codes: Vec<i32>) -> RunTestResult {
    let mock = MockRunner::new(exit_codes);
    let calls = mock.calls.clone();

    let runner = PipelineRunner::new(mock);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    runner.add_event_handler(move |event| sink.lock().unwrap().push(event));

    let report = runner.execute(pipeline).await;

    let events = events.lock().unwrap().clone();
    let calls = calls.lock().unwrap().clone();
    RunTestResult {
        pipeline: pipeline.clone(),
        report,
        events,
        calls,
    }
}

/// Everything observable from one test run
pub struct RunTestResult {
    pub pipeline: Pipeline,
    pub report: RunReport,
    pub events: Vec<RunEvent>,
    pub calls: Vec<CommandSpec>,
}

impl RunTestResult {
    pub fn is_success(&self) -> bool {
        matches!(self.pipeline.state.status, RunStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.pipeline.state.status, RunStatus::Failed)
    }

    /// Commands in the order the shell saw them
    pub fn executed_commands(&self) -> Vec<String> {
        self.calls.iter().map(|c| c.command.clone()).collect()
    }

    /// Environment passed to the nth shell invocation
    pub fn call_env(&self, index: usize) -> Vec<(String, String)> {
        self.calls
            .get(index)
            .map(|c| c.env.clone())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> String {
        format!(
            "{:?} - {}/{} completed, {} failed, {} skipped, exit {}",
            self.pipeline.state.status,
            self.pipeline.state.completed_steps,
            self.pipeline.state.total_steps,
            self.pipeline.state.failed_steps,
            self.pipeline.state.skipped_steps,
            self.report.exit_code
        )
    }
}

/// Assert a step finished successfully
pub fn assert_step_completed(result: &RunTestResult, step_id: &str) {
    let step = result
        .pipeline
        .step(step_id)
        .unwrap_or_else(|| panic!("Step '{}' not found in result", step_id));

    assert!(
        matches!(step.state, StepState::Completed { .. }),
        "Step '{}' should be completed, but was in state: {:?}",
        step_id,
        step.state
    );
}

/// Assert a step failed with a specific exit code
pub fn assert_step_failed(result: &RunTestResult, step_id: &str, expected_exit: i32) {
    let step = result
        .pipeline
        .step(step_id)
        .unwrap_or_else(|| panic!("Step '{}' not found in result", step_id));

    match &step.state {
        StepState::Failed { exit_code, .. } => {
            assert_eq!(
                *exit_code, expected_exit,
                "Step '{}' failed with exit {}, expected {}",
                step_id, exit_code, expected_exit
            );
        }
        other => panic!(
            "Step '{}' should have failed, but was in state: {:?}",
            step_id, other
        ),
    }
}

/// Assert a step was skipped and never ran
pub fn assert_step_skipped(result: &RunTestResult, step_id: &str) {
    let step = result
        .pipeline
        .step(step_id)
        .unwrap_or_else(|| panic!("Step '{}' not found in result", step_id));

    assert!(
        matches!(step.state, StepState::Skipped { .. }),
        "Step '{}' should be skipped, but was in state: {:?}",
        step_id,
        step.state
    );
}

/// Assert the run completed with exit code 0
pub fn assert_run_completed(result: &RunTestResult) {
    assert!(
        result.is_success(),
        "Run should be completed, but was: {}",
        result.summary()
    );
    assert_eq!(result.report.exit_code, 0, "{}", result.summary());
}

/// Assert the run failed with a specific exit code
pub fn assert_run_failed(result: &RunTestResult, expected_exit: i32) {
    assert!(
        result.is_failed(),
        "Run should have failed, but was: {}",
        result.summary()
    );
    assert_eq!(result.report.exit_code, expected_exit, "{}", result.summary());
}

/// Parse a pipeline section out of a descriptor YAML string
pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    let config = deployctl::core::config::DeployConfig::from_yaml(yaml)
        .unwrap_or_else(|e| panic!("Failed to parse descriptor YAML: {}", e));
    config
        .pipeline
        .expect("descriptor has no pipeline section")
        .to_pipeline()
}

/// A descriptor close to the real application's CI pipeline
pub fn boss_ci_pipeline() -> Pipeline {
    pipeline_from_yaml(
        r#"
pipeline:
  name: "boss-ci"
  env:
    USING_DJANGO_TESTRUNNER: "1"
    DJANGO_SETTINGS_MODULE: "boss.settings"
    UNIT_ONLY: "1"
    PYTHONPATH: "/srv/boss:/srv/boss/apps"
  steps:
    - id: "migrate"
      name: "Apply migrations"
      command: "python manage.py migrate --noinput"
    - id: "unit-tests"
      name: "Unit tests"
      command: "python manage.py test"
    - id: "collect-static"
      name: "Collect static files"
      command: "python manage.py collectstatic --noinput"
      continue_on_failure: true
    - id: "package"
      name: "Build release archive"
      command: "tar czf boss.tar.gz ."
"#,
    )
}
