//! Execution layer: shell commands, auxiliary services, and the runner

pub mod command;
pub mod runner;
pub mod service;

pub use command::{CommandError, CommandOutcome, CommandRunner, CommandSpec, ShellRunner};
pub use runner::{PipelineRunner, RunEvent, RunReport};
pub use service::{ServiceError, ServiceHandle, ServiceSupervisor};
