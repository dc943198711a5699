//! deployctl - deployment descriptors for a proxy route table and a CI pipeline

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;
pub mod proxy;

// Re-export commonly used types
pub use crate::core::{Pipeline, RunState, RunStatus, Step, StepState};
pub use execution::{CommandRunner, PipelineRunner, RunEvent, RunReport, ShellRunner};
pub use proxy::{RouteError, RouteMatch, RouteTable};
