//! Shell command execution - the subprocess seam for pipeline steps

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Errors from invoking an external command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn command: {0}")]
    Spawn(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Failed to decode command output: {0}")]
    Decode(String),
}

/// What a step asks the runner to execute
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Shell command line, run via `sh -c`
    pub command: String,

    /// Environment passed explicitly to the child; nothing is set on the
    /// parent process
    pub env: Vec<(String, String)>,

    /// Timeout in seconds
    pub timeout_secs: u64,
}

/// Outcome of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Exit code (-1 when terminated by a signal)
    pub exit_code: i32,

    /// Captured stdout
    pub stdout: String,

    /// Captured stderr
    pub stderr: String,
}

impl CommandOutcome {
    /// Whether the command exited zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for command execution - allows the runner to be driven by mocks
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute a command to completion and capture its outcome
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome, CommandError>;
}

/// Production runner: executes step commands through `sh -c`
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome, CommandError> {
        debug!("Spawning shell command: {}", spec.command);

        let timeout_duration = Duration::from_secs(spec.timeout_secs);

        let result = timeout(
            timeout_duration,
            Command::new("sh")
                .arg("-c")
                .arg(&spec.command)
                .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| CommandError::Timeout(spec.timeout_secs))?;

        let output = result.map_err(|e| CommandError::Spawn(e.to_string()))?;

        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 {
            warn!("Command exited with code {}: {}", exit_code, spec.command);
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| CommandError::Decode(e.to_string()))?;
        let stderr = String::from_utf8(output.stderr)
            .map_err(|e| CommandError::Decode(e.to_string()))?;

        debug!(
            "Command finished (code {}, {} bytes stdout)",
            exit_code,
            stdout.len()
        );

        Ok(CommandOutcome {
            exit_code,
            stdout,
            stderr,
        })
    }
}
