//! Test: masked failures are recorded but never fail the run

use crate::helpers::*;
use deployctl::execution::RunEvent;

#[tokio::test]
async fn test_masked_failure_keeps_going() {
    let mut pipeline = boss_ci_pipeline();

    // collect-static (third step) fails but is masked
    let result = run_pipeline_with_mock(&mut pipeline, vec![0, 0, 7, 0]).await;

    assert_run_completed(&result);
    assert_step_failed(&result, "collect-static", 7);
    assert_step_completed(&result, "package");
    assert_eq!(result.calls.len(), 4);
}

#[tokio::test]
async fn test_masked_failure_recorded_in_counts() {
    let mut pipeline = boss_ci_pipeline();

    let result = run_pipeline_with_mock(&mut pipeline, vec![0, 0, 7, 0]).await;

    assert_eq!(result.pipeline.state.failed_steps, 1);
    assert_eq!(result.pipeline.state.completed_steps, 3);
    assert_eq!(result.report.exit_code, 0);
}

#[tokio::test]
async fn test_masked_failure_event_is_not_fatal() {
    let mut pipeline = boss_ci_pipeline();

    let result = run_pipeline_with_mock(&mut pipeline, vec![0, 0, 7, 0]).await;

    let failed_events: Vec<_> = result
        .events
        .iter()
        .filter_map(|e| match e {
            RunEvent::StepFailed { step_id, fatal, .. } => Some((step_id.clone(), *fatal)),
            _ => None,
        })
        .collect();
    assert_eq!(failed_events, vec![("collect-static".to_string(), false)]);
}

/// Run env reaches every shell invocation explicitly
#[tokio::test]
async fn test_run_env_passed_to_each_command() {
    let mut pipeline = boss_ci_pipeline();

    let result = run_pipeline_with_mock(&mut pipeline, vec![0, 0, 0, 0]).await;

    for index in 0..4 {
        let env = result.call_env(index);
        assert!(
            env.contains(&("USING_DJANGO_TESTRUNNER".to_string(), "1".to_string())),
            "call {} missing USING_DJANGO_TESTRUNNER: {:?}",
            index,
            env
        );
        assert!(env.contains(&(
            "DJANGO_SETTINGS_MODULE".to_string(),
            "boss.settings".to_string()
        )));
        assert!(env.contains(&("UNIT_ONLY".to_string(), "1".to_string())));
        assert!(env.contains(&(
            "PYTHONPATH".to_string(),
            "/srv/boss:/srv/boss/apps".to_string()
        )));
    }
}

/// Step-level env overrides the run-level value for that step only
#[tokio::test]
async fn test_step_env_overrides_run_env() {
    let mut pipeline = pipeline_from_yaml(
        r#"
pipeline:
  name: "env-layers"
  env:
    UNIT_ONLY: "1"
  steps:
    - id: "unit"
      name: "Unit"
      command: "run-unit"
    - id: "full"
      name: "Full"
      command: "run-full"
      env:
        UNIT_ONLY: "0"
"#,
    );

    let result = run_pipeline_with_mock(&mut pipeline, vec![0, 0]).await;

    assert!(result
        .call_env(0)
        .contains(&("UNIT_ONLY".to_string(), "1".to_string())));
    assert!(result
        .call_env(1)
        .contains(&("UNIT_ONLY".to_string(), "0".to_string())));
}
