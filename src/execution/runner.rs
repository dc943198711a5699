//! Pipeline runner - strictly sequential execution with scoped services

use crate::{
    core::{Pipeline, RunStatus, StepState},
    execution::{
        command::{CommandError, CommandRunner, CommandSpec},
        service::{ServiceHandle, ServiceSupervisor},
    },
};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Exit code reported when a step times out (GNU timeout convention)
const EXIT_TIMEOUT: i32 = 124;

/// Exit code reported when a step's shell could not be spawned
const EXIT_SPAWN: i32 = 127;

/// Events emitted during a pipeline run
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        pipeline_name: String,
    },
    ServiceStarted {
        service_id: String,
        pid: Option<u32>,
    },
    StepStarted {
        step_id: String,
        index: usize,
        total: usize,
    },
    StepOutput {
        step_id: String,
        output: String,
    },
    StepCompleted {
        step_id: String,
    },
    StepFailed {
        step_id: String,
        exit_code: i32,
        error: String,
        fatal: bool,
    },
    StepSkipped {
        step_id: String,
        reason: String,
    },
    ServiceStopped {
        service_id: String,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
        exit_code: i32,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Final report of one pipeline run
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,

    /// First fatal failing step's exit code, or 0
    pub exit_code: i32,
}

/// Executes a pipeline: services up, steps in declared order, services down
pub struct PipelineRunner<R> {
    runner: R,
    event_handlers: Mutex<Vec<EventHandler>>,
}

impl<R: CommandRunner> PipelineRunner<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            event_handlers: Mutex::new(Vec::new()),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(RunEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.event_handlers.lock() {
            handlers.push(Arc::new(handler));
        }
    }

    /// Emit an event to all handlers
    fn emit(&self, event: RunEvent) {
        if let Ok(handlers) = self.event_handlers.lock() {
            for handler in handlers.iter() {
                handler(event.clone());
            }
        }
    }

    /// Execute the entire pipeline
    ///
    /// Services are stopped on every exit path, success or failure.
    pub async fn execute(&self, pipeline: &mut Pipeline) -> RunReport {
        let run_id = pipeline.state.run_id;
        info!("Starting pipeline run: {} ({})", pipeline.name, run_id);

        pipeline.state.start(pipeline.steps.len());
        self.emit(RunEvent::RunStarted {
            run_id,
            pipeline_name: pipeline.name.clone(),
        });

        // Bring up auxiliary services before any dependent step
        let mut services: Vec<ServiceHandle> = Vec::new();
        let mut fatal_exit: Option<i32> = None;

        for service in pipeline.services.clone() {
            match ServiceSupervisor::start(&service).await {
                Ok(handle) => {
                    self.emit(RunEvent::ServiceStarted {
                        service_id: handle.id().to_string(),
                        pid: handle.pid(),
                    });
                    services.push(handle);
                }
                Err(e) => {
                    error!("{}", e);
                    fatal_exit = Some(1);
                    break;
                }
            }
        }

        let startup_failed = fatal_exit.is_some();
        if !startup_failed {
            fatal_exit = self.run_steps(pipeline).await;
        } else {
            for step in &mut pipeline.steps {
                step.state = StepState::Skipped {
                    reason: "auxiliary service failed to start".to_string(),
                };
                self.emit(RunEvent::StepSkipped {
                    step_id: step.id.clone(),
                    reason: "auxiliary service failed to start".to_string(),
                });
            }
        }

        // Teardown runs on both success and failure paths, exactly once
        // per service, by the handle captured at launch
        for handle in services.into_iter().rev() {
            let service_id = handle.id().to_string();
            if let Err(e) = handle.stop().await {
                warn!("{}", e);
            }
            self.emit(RunEvent::ServiceStopped { service_id });
        }

        pipeline.update_counts();

        let exit_code = match fatal_exit {
            Some(code) => {
                pipeline.state.fail(code);
                code
            }
            None => {
                pipeline.state.complete();
                0
            }
        };

        info!(
            "Pipeline run finished: {} - {:?} (exit {})",
            pipeline.name, pipeline.state.status, exit_code
        );
        self.emit(RunEvent::RunCompleted {
            run_id,
            status: pipeline.state.status,
            exit_code,
        });

        RunReport {
            run_id,
            status: pipeline.state.status,
            exit_code,
        }
    }

    /// Run steps strictly in declared order
    ///
    /// Returns the first fatal failing step's exit code, if any. Steps
    /// after a fatal failure are marked skipped and never execute.
    async fn run_steps(&self, pipeline: &mut Pipeline) -> Option<i32> {
        let total = pipeline.steps.len();
        let run_env = pipeline.env.clone();
        let mut fatal_exit: Option<i32> = None;

        for index in 0..total {
            let step = &pipeline.steps[index];
            let step_id = step.id.clone();

            if fatal_exit.is_some() {
                let reason = "earlier step failed".to_string();
                pipeline.steps[index].state = StepState::Skipped {
                    reason: reason.clone(),
                };
                self.emit(RunEvent::StepSkipped { step_id, reason });
                continue;
            }

            let started_at = chrono::Utc::now();
            pipeline.steps[index].state = StepState::Running { started_at };
            self.emit(RunEvent::StepStarted {
                step_id: step_id.clone(),
                index,
                total,
            });

            let step = &pipeline.steps[index];
            let spec = CommandSpec {
                command: step.command.clone(),
                env: step.effective_env(&run_env),
                timeout_secs: step.timeout_secs,
            };
            info!("Executing step '{}': {}", step_id, step.command);

            let (exit_code, error, output) = match self.runner.run(&spec).await {
                Ok(outcome) if outcome.success() => {
                    pipeline.steps[index].state = StepState::Completed {
                        started_at,
                        completed_at: chrono::Utc::now(),
                    };
                    if !outcome.stdout.is_empty() {
                        self.emit(RunEvent::StepOutput {
                            step_id: step_id.clone(),
                            output: outcome.stdout,
                        });
                    }
                    self.emit(RunEvent::StepCompleted { step_id });
                    continue;
                }
                Ok(outcome) => {
                    let error = if outcome.stderr.trim().is_empty() {
                        format!("Exited with code {}", outcome.exit_code)
                    } else {
                        outcome.stderr.trim().to_string()
                    };
                    (outcome.exit_code, error, outcome.stdout)
                }
                Err(CommandError::Timeout(secs)) => (
                    EXIT_TIMEOUT,
                    format!("Timeout after {} seconds", secs),
                    String::new(),
                ),
                Err(e @ CommandError::Spawn(_)) => (EXIT_SPAWN, e.to_string(), String::new()),
                Err(e) => (1, e.to_string(), String::new()),
            };

            let fatal = !pipeline.steps[index].continue_on_failure;
            if fatal {
                error!("Step '{}' failed (exit {}): {}", step_id, exit_code, error);
                fatal_exit = Some(exit_code);
            } else {
                warn!(
                    "Step '{}' failed (exit {}), continuing: {}",
                    step_id, exit_code, error
                );
            }

            pipeline.steps[index].state = StepState::Failed {
                exit_code,
                error: error.clone(),
                started_at,
                failed_at: chrono::Utc::now(),
            };

            if !output.is_empty() {
                self.emit(RunEvent::StepOutput {
                    step_id: step_id.clone(),
                    output,
                });
            }
            self.emit(RunEvent::StepFailed {
                step_id,
                exit_code,
                error,
                fatal,
            });
        }

        fatal_exit
    }
}
