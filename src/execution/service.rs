//! Auxiliary service lifecycle - scoped start/stop of background processes

use crate::core::config::ServiceConfig;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Errors from starting or stopping an auxiliary service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to start service '{id}': {source}")]
    Start {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stop service '{id}': {source}")]
    Stop {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Spawns auxiliary services and hands out explicit handles
pub struct ServiceSupervisor;

impl ServiceSupervisor {
    /// Start a service and wait out its fixed startup delay
    ///
    /// There is no readiness probe; the delay is the only wait. The
    /// returned handle owns the child process. `kill_on_drop` backstops
    /// paths that never reach an explicit `stop`.
    pub async fn start(config: &ServiceConfig) -> Result<ServiceHandle, ServiceError> {
        let child = Command::new("sh")
            .arg("-c")
            .arg(&config.command)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ServiceError::Start {
                id: config.id.clone(),
                source,
            })?;

        let pid = child.id();
        info!("Started service '{}' (pid {:?})", config.id, pid);

        if config.startup_wait_ms > 0 {
            debug!(
                "Waiting {}ms for service '{}' startup",
                config.startup_wait_ms, config.id
            );
            tokio::time::sleep(Duration::from_millis(config.startup_wait_ms)).await;
        }

        Ok(ServiceHandle {
            id: config.id.clone(),
            pid,
            child,
        })
    }
}

/// Explicit handle to a running auxiliary service
///
/// Termination goes through this handle, never through an ambient
/// "last background job" reference.
pub struct ServiceHandle {
    id: String,
    pid: Option<u32>,
    child: Child,
}

impl ServiceHandle {
    /// Service identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// OS process id, if the child is still attached
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Terminate the service and reap it
    ///
    /// A service that already exited on its own is not an error.
    pub async fn stop(mut self) -> Result<(), ServiceError> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                warn!("Service '{}' exited early with {}", self.id, status);
                return Ok(());
            }
            Ok(None) => {}
            Err(source) => {
                return Err(ServiceError::Stop {
                    id: self.id.clone(),
                    source,
                })
            }
        }

        self.child.kill().await.map_err(|source| ServiceError::Stop {
            id: self.id.clone(),
            source,
        })?;
        self.child.wait().await.map_err(|source| ServiceError::Stop {
            id: self.id.clone(),
            source,
        })?;

        info!("Stopped service '{}'", self.id);
        Ok(())
    }
}
