//! Test: a fatal step failure aborts the run and skips the rest

use crate::helpers::*;

/// First non-zero exit stops the run; later steps never reach the shell
#[tokio::test]
async fn test_first_failure_aborts_run() {
    let mut pipeline = boss_ci_pipeline();

    // migrate ok, unit-tests fail with 2
    let result = run_pipeline_with_mock(&mut pipeline, vec![0, 2]).await;

    assert_run_failed(&result, 2);
    assert_step_completed(&result, "migrate");
    assert_step_failed(&result, "unit-tests", 2);
    assert_step_skipped(&result, "collect-static");
    assert_step_skipped(&result, "package");

    assert_eq!(
        result.executed_commands(),
        vec![
            "python manage.py migrate --noinput",
            "python manage.py test"
        ]
    );
}

#[tokio::test]
async fn test_all_steps_succeed_exit_zero() {
    let mut pipeline = boss_ci_pipeline();

    let result = run_pipeline_with_mock(&mut pipeline, vec![0, 0, 0, 0]).await;

    assert_run_completed(&result);
    assert_eq!(result.pipeline.state.completed_steps, 4);
    assert_eq!(result.pipeline.state.skipped_steps, 0);
    assert_eq!(result.calls.len(), 4);
}

/// Run exit code is the first FATAL failure, not a masked one
#[tokio::test]
async fn test_exit_code_is_first_fatal_failure() {
    let mut pipeline = pipeline_from_yaml(
        r#"
pipeline:
  name: "exit-codes"
  steps:
    - id: "warmup"
      name: "Warmup"
      command: "warmup"
      continue_on_failure: true
    - id: "build"
      name: "Build"
      command: "build"
    - id: "deploy"
      name: "Deploy"
      command: "deploy"
"#,
    );

    // warmup fails with 5 (masked), build fails with 3 (fatal)
    let result = run_pipeline_with_mock(&mut pipeline, vec![5, 3]).await;

    assert_run_failed(&result, 3);
    assert_step_failed(&result, "warmup", 5);
    assert_step_failed(&result, "build", 3);
    assert_step_skipped(&result, "deploy");
}

#[tokio::test]
async fn test_failure_in_last_step_skips_nothing() {
    let mut pipeline = boss_ci_pipeline();

    let result = run_pipeline_with_mock(&mut pipeline, vec![0, 0, 0, 9]).await;

    assert_run_failed(&result, 9);
    assert_step_failed(&result, "package", 9);
    assert_eq!(result.pipeline.state.skipped_steps, 0);
    assert_eq!(result.pipeline.state.completed_steps, 3);
}
