//! Lifecycle management of the container stack
//!
//! This module provides:
//! - A process runner that executes the orchestration tool with a hard timeout
//! - An orchestrator that serializes deploy/stop and reconciles the result
//!   against freshly probed service status

mod orchestrator;
mod runner;

pub use orchestrator::{LifecycleOrchestrator, LifecycleReport, OrchestratorConfig, StackState};
pub use runner::{CommandSpec, ProcessRunner, RunnerConfig, MAX_CAPTURE_BYTES};

use crate::models::LifecycleResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub use async_trait::async_trait;

/// Default timeout for building and starting the stack
pub const DEPLOY_TIMEOUT: Duration = Duration::from_secs(300);

/// Default timeout for stopping the stack
pub const STOP_TIMEOUT: Duration = Duration::from_secs(60);

/// Kind of lifecycle command issued to the orchestration tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleCommand {
    Deploy,
    Stop,
}

impl LifecycleCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleCommand::Deploy => "deploy",
            LifecycleCommand::Stop => "stop",
        }
    }

    /// Noun used in user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleCommand::Deploy => "Deployment",
            LifecycleCommand::Stop => "Stop",
        }
    }

    pub fn default_timeout(&self) -> Duration {
        match self {
            LifecycleCommand::Deploy => DEPLOY_TIMEOUT,
            LifecycleCommand::Stop => STOP_TIMEOUT,
        }
    }
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for executing lifecycle commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` inside `working_dir`, giving up after `timeout`.
    /// Every failure is reported through the returned result.
    async fn run(
        &self,
        command: LifecycleCommand,
        working_dir: &Path,
        timeout: Duration,
    ) -> LifecycleResult;
}
