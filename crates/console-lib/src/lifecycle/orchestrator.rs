//! Deploy/stop sequencing with post-operation status reconciliation

use super::{CommandRunner, LifecycleCommand};
use crate::error::LifecycleError;
use crate::models::{LifecycleResult, ServiceName, ServiceStatus, StatusSnapshot};
use crate::observability::{ConsoleMetrics, StructuredLogger};
use crate::status::StatusCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// State of the managed stack as seen by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackState {
    Stopped,
    Deploying,
    Running,
    Stopping,
    Failed,
}

impl StackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackState::Stopped => "stopped",
            StackState::Deploying => "deploying",
            StackState::Running => "running",
            StackState::Stopping => "stopping",
            StackState::Failed => "failed",
        }
    }
}

impl fmt::Display for StackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the lifecycle orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Name of the managed stack, used in logs
    pub stack_name: String,
    /// Directory holding the deployment descriptor
    pub deployment_dir: PathBuf,
    pub deploy_timeout: Duration,
    pub stop_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stack_name: "fir-assist".to_string(),
            deployment_dir: PathBuf::from("job"),
            deploy_timeout: LifecycleCommand::Deploy.default_timeout(),
            stop_timeout: LifecycleCommand::Stop.default_timeout(),
        }
    }
}

/// Outcome of one orchestrated lifecycle operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleReport {
    pub operation: LifecycleCommand,
    pub result: LifecycleResult,
    /// State after the operation
    pub state: StackState,
    /// Status refreshed after a successful command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<StatusSnapshot>,
    /// Mismatches between the command outcome and observed status
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Serializes deploy/stop and reconciles outcomes against probed status
///
/// Every operation runs on its own task. A caller that stops waiting only
/// detaches from it: the command still finishes, and its final state,
/// metrics and log events are still recorded.
pub struct LifecycleOrchestrator {
    shared: Arc<Shared>,
    /// Held for the whole duration of an operation
    in_flight: Arc<Mutex<()>>,
}

/// State owned jointly by the orchestrator and its operation tasks
struct Shared {
    runner: Arc<dyn CommandRunner>,
    cache: Arc<StatusCache>,
    config: OrchestratorConfig,
    state: RwLock<StackState>,
    metrics: ConsoleMetrics,
    logger: StructuredLogger,
}

impl LifecycleOrchestrator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        cache: Arc<StatusCache>,
        config: OrchestratorConfig,
    ) -> Self {
        let logger = StructuredLogger::new(config.stack_name.clone());
        Self {
            shared: Arc::new(Shared {
                runner,
                cache,
                config,
                state: RwLock::new(StackState::Stopped),
                metrics: ConsoleMetrics::new(),
                logger,
            }),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Current state. `Stopped` is assumed until the first operation.
    pub async fn state(&self) -> StackState {
        *self.shared.state.read().await
    }

    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.shared.cache
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    /// Build and start the stack, then verify the backend answers
    pub async fn deploy(&self) -> Result<LifecycleReport, LifecycleError> {
        self.execute(LifecycleCommand::Deploy).await
    }

    /// Stop the stack, then verify nothing still answers
    pub async fn stop(&self) -> Result<LifecycleReport, LifecycleError> {
        self.execute(LifecycleCommand::Stop).await
    }

    async fn execute(&self, command: LifecycleCommand) -> Result<LifecycleReport, LifecycleError> {
        let guard = match self.in_flight.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                let error = LifecycleError::Busy {
                    in_flight: self.state().await,
                };
                self.shared.logger.log_rejected(command.as_str(), &error.to_string());
                self.shared.metrics.count_lifecycle(command.as_str(), "rejected");
                return Err(error);
            }
        };

        let started = Instant::now();
        let transient = match command {
            LifecycleCommand::Deploy => StackState::Deploying,
            LifecycleCommand::Stop => StackState::Stopping,
        };
        self.shared.set_state(transient).await;

        let shared = self.shared.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            shared.run(command, started).await
        });

        match task.await {
            Ok(report) => Ok(report),
            Err(e) => {
                let report = LifecycleReport {
                    operation: command,
                    result: LifecycleResult::failure(
                        format!("{} error: operation aborted: {}", command.label(), e),
                        None,
                    ),
                    state: StackState::Failed,
                    snapshot: None,
                    warnings: Vec::new(),
                };
                self.shared.finish(&report, started).await;
                Ok(report)
            }
        }
    }
}

impl Shared {
    async fn run(&self, command: LifecycleCommand, started: Instant) -> LifecycleReport {
        let timeout = match command {
            LifecycleCommand::Deploy => self.config.deploy_timeout,
            LifecycleCommand::Stop => self.config.stop_timeout,
        };

        let result = self
            .runner
            .run(command, &self.config.deployment_dir, timeout)
            .await;

        let report = if result.succeeded {
            let snapshot = self.cache.refresh().await;
            let (state, warnings) = match command {
                LifecycleCommand::Deploy => reconcile_deploy(&snapshot),
                LifecycleCommand::Stop => reconcile_stop(&snapshot),
            };
            LifecycleReport {
                operation: command,
                result,
                state,
                snapshot: Some(snapshot),
                warnings,
            }
        } else {
            LifecycleReport {
                operation: command,
                result,
                state: StackState::Failed,
                snapshot: None,
                warnings: Vec::new(),
            }
        };

        self.finish(&report, started).await;
        report
    }

    /// Commit the final state and record the outcome
    async fn finish(&self, report: &LifecycleReport, started: Instant) {
        self.set_state(report.state).await;

        let elapsed = started.elapsed().as_secs_f64();
        let outcome = if report.result.succeeded {
            "succeeded"
        } else {
            "failed"
        };
        self.metrics.record_lifecycle(report.operation.as_str(), outcome, elapsed);
        self.logger.log_lifecycle(report, elapsed);
    }

    async fn set_state(&self, state: StackState) {
        *self.state.write().await = state;
    }
}

/// Running only if the backend answers; the datastore is reported through it
fn reconcile_deploy(snapshot: &StatusSnapshot) -> (StackState, Vec<String>) {
    match snapshot.get(ServiceName::Backend) {
        ServiceStatus::Running => (StackState::Running, Vec::new()),
        status => (
            StackState::Failed,
            vec![format!(
                "deploy command succeeded but the backend reports {}",
                status
            )],
        ),
    }
}

/// A successful stop with endpoints still answering is a warning, not a failure
fn reconcile_stop(snapshot: &StatusSnapshot) -> (StackState, Vec<String>) {
    let warnings: Vec<String> = snapshot
        .iter()
        .filter(|(_, status)| status.is_reachable())
        .map(|(service, status)| {
            format!(
                "stop command succeeded but {} still answers ({})",
                service.display_name(),
                status
            )
        })
        .collect();

    let state = if snapshot.get(ServiceName::Backend) == ServiceStatus::Running {
        StackState::Running
    } else if warnings.is_empty() {
        StackState::Stopped
    } else {
        StackState::Failed
    };

    (state, warnings)
}
