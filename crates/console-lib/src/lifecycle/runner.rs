//! Process runner for the container orchestration tool

use super::{CommandRunner, LifecycleCommand};
use crate::models::LifecycleResult;
use crate::text;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Maximum bytes kept from each of stdout and stderr
pub const MAX_CAPTURE_BYTES: usize = 16 * 1024;

/// How long to wait for output pipes to close once the child has exited
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Program and arguments for one lifecycle command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Rendered command line, for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Configuration for the process runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Builds and starts every container
    pub deploy: CommandSpec,
    /// Stops every container, keeping volumes
    pub stop: CommandSpec,
    /// Capture bound per output stream
    pub max_capture_bytes: usize,
}

impl RunnerConfig {
    /// Default command lines for a given compose program
    pub fn for_program(program: &str) -> Self {
        Self {
            deploy: CommandSpec::new(program, ["up", "-d", "--build"]),
            stop: CommandSpec::new(program, ["down"]),
            max_capture_bytes: MAX_CAPTURE_BYTES,
        }
    }

    fn spec(&self, command: LifecycleCommand) -> &CommandSpec {
        match command {
            LifecycleCommand::Deploy => &self.deploy,
            LifecycleCommand::Stop => &self.stop,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::for_program("docker-compose")
    }
}

/// Runs lifecycle commands as child processes
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        command: LifecycleCommand,
        working_dir: &Path,
        timeout: Duration,
    ) -> LifecycleResult {
        let spec = self.config.spec(command);
        let label = command.label();

        if !working_dir.is_dir() {
            return LifecycleResult::failure(
                format!(
                    "{} error: deployment directory {} does not exist",
                    label,
                    working_dir.display()
                ),
                None,
            );
        }

        info!(
            operation = %command,
            command = %spec.display(),
            working_dir = %working_dir.display(),
            timeout_secs = timeout.as_secs(),
            "Running lifecycle command"
        );

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so a timeout reaches helpers the tool spawns
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return LifecycleResult::failure(
                    format!("{} error: failed to launch `{}`: {}", label, spec.program, e),
                    Some(format!("{:?}", e.kind())),
                );
            }
        };

        let limit = self.config.max_capture_bytes;
        let stdout_task = tokio::spawn(capture(child.stdout.take(), limit));
        let stderr_task = tokio::spawn(capture(child.stderr.take(), limit));

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = collect(stdout_task, limit).await;
                let stderr = collect(stderr_task, limit).await;
                let mut detail = status.to_string();
                if !stdout.trim().is_empty() {
                    detail.push_str("; stdout: ");
                    detail.push_str(stdout.trim_end());
                }

                if status.success() {
                    LifecycleResult::success(success_message(command), Some(detail))
                } else {
                    LifecycleResult::failure(
                        format!("{} failed: {}", label, stderr.trim_end()),
                        Some(detail),
                    )
                }
            }
            Ok(Err(e)) => {
                stdout_task.abort();
                stderr_task.abort();
                LifecycleResult::failure(
                    format!("{} error: failed to wait for `{}`: {}", label, spec.program, e),
                    None,
                )
            }
            Err(_) => {
                warn!(
                    operation = %command,
                    timeout_secs = timeout.as_secs(),
                    "Lifecycle command timed out, killing it"
                );
                if let Some(pid) = child.id() {
                    kill_process_group(pid);
                }
                if let Err(e) = child.kill().await {
                    warn!(operation = %command, error = %e, "Failed to kill timed-out command");
                }
                stdout_task.abort();
                stderr_task.abort();
                LifecycleResult::failure(
                    format!(
                        "{} operation timed out after {}s",
                        label,
                        timeout.as_secs_f64().ceil() as u64
                    ),
                    Some("killed after timeout".to_string()),
                )
            }
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!(pid, error = %e, "Failed to kill process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

fn success_message(command: LifecycleCommand) -> &'static str {
    match command {
        LifecycleCommand::Deploy => "Services deployed successfully",
        LifecycleCommand::Stop => "Services stopped successfully",
    }
}

/// Drain a pipe to EOF, keeping at most `limit` bytes
async fn capture<R>(reader: Option<R>, limit: usize) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Vec::new();
    };

    let mut captured = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut dropped = 0usize;
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(captured.len());
                let keep = n.min(room);
                captured.extend_from_slice(&chunk[..keep]);
                dropped += n - keep;
            }
            Err(e) => {
                debug!(error = %e, "Stopped reading command output");
                break;
            }
        }
    }
    if dropped > 0 {
        debug!(dropped_bytes = dropped, "Command output exceeded capture limit");
    }
    captured
}

/// Await a capture task, bounded by the drain grace period.
/// A grandchild still holding the pipe open must not stall the result.
async fn collect(task: JoinHandle<Vec<u8>>, limit: usize) -> String {
    let abort = task.abort_handle();
    let bytes = match tokio::time::timeout(PIPE_DRAIN_GRACE, task).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(_)) => Vec::new(),
        Err(_) => {
            abort.abort();
            Vec::new()
        }
    };
    let lossy = String::from_utf8_lossy(&bytes);
    text::truncate(&lossy, limit)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn runner(deploy: CommandSpec) -> ProcessRunner {
        ProcessRunner::new(RunnerConfig {
            deploy,
            stop: CommandSpec::new("true", Vec::<String>::new()),
            max_capture_bytes: MAX_CAPTURE_BYTES,
        })
    }

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh", ["-c", script])
    }

    #[test]
    fn test_default_commands() {
        let config = RunnerConfig::default();
        assert_eq!(config.deploy.display(), "docker-compose up -d --build");
        assert_eq!(config.stop.display(), "docker-compose down");
        assert_eq!(LifecycleCommand::Deploy.default_timeout(), Duration::from_secs(300));
        assert_eq!(LifecycleCommand::Stop.default_timeout(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_successful_command() {
        let dir = TempDir::new().unwrap();
        let result = runner(sh("echo started"))
            .run(LifecycleCommand::Deploy, dir.path(), Duration::from_secs(10))
            .await;

        assert!(result.succeeded);
        assert_eq!(result.message, "Services deployed successfully");
        assert!(result.exit_detail.unwrap().contains("started"));
    }

    #[tokio::test]
    async fn test_runs_inside_working_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();

        let result = runner(sh("test -f docker-compose.yml"))
            .run(LifecycleCommand::Deploy, dir.path(), Duration::from_secs(10))
            .await;
        assert!(result.succeeded, "{:?}", result);
    }

    #[tokio::test]
    async fn test_non_zero_exit_surfaces_stderr() {
        let dir = TempDir::new().unwrap();
        let result = runner(sh("echo 'image build failed' >&2; exit 3"))
            .run(LifecycleCommand::Deploy, dir.path(), Duration::from_secs(10))
            .await;

        assert!(!result.succeeded);
        assert_eq!(result.message, "Deployment failed: image build failed");
        assert!(result.exit_detail.unwrap().contains('3'));
    }

    #[tokio::test]
    async fn test_missing_directory_is_a_failure_result() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("job");

        let result = runner(sh("true"))
            .run(LifecycleCommand::Deploy, &missing, Duration::from_secs(10))
            .await;

        assert!(!result.succeeded);
        assert!(result.message.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_failure_result() {
        let dir = TempDir::new().unwrap();
        let result = runner(CommandSpec::new("fir-no-such-compose-binary", ["up"]))
            .run(LifecycleCommand::Deploy, dir.path(), Duration::from_secs(10))
            .await;

        assert!(!result.succeeded);
        assert!(result.message.starts_with("Deployment error: failed to launch"));
    }

    #[tokio::test]
    async fn test_timeout_returns_within_bound() {
        let dir = TempDir::new().unwrap();
        let started = Instant::now();

        let result = runner(CommandSpec::new("sleep", ["30"]))
            .run(LifecycleCommand::Deploy, dir.path(), Duration::from_millis(200))
            .await;

        assert!(!result.succeeded);
        assert!(result.message.contains("operation timed out"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    /// A zombie awaiting its reaper counts as dead
    fn is_alive(pid: i32) -> bool {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        if kill(Pid::from_raw(pid), None).is_err() {
            return false;
        }
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => !stat
                .rsplit(')')
                .next()
                .is_some_and(|rest| rest.trim_start().starts_with('Z')),
            Err(_) => true,
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_spawned_helpers() {
        let dir = TempDir::new().unwrap();
        let result = runner(sh("sleep 30 & echo $! > helper.pid; wait"))
            .run(LifecycleCommand::Deploy, dir.path(), Duration::from_millis(300))
            .await;
        assert!(result.message.contains("operation timed out"));

        let pid: i32 = std::fs::read_to_string(dir.path().join("helper.pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(3);
        while is_alive(pid) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!is_alive(pid), "helper {} survived the timeout", pid);
    }

    #[tokio::test]
    async fn test_stderr_capture_is_bounded() {
        let dir = TempDir::new().unwrap();
        let noisy = "i=0; while [ $i -lt 2000 ]; do echo 'xxxxxxxx' >&2; i=$((i+1)); done; exit 1";
        let runner = ProcessRunner::new(RunnerConfig {
            deploy: sh(noisy),
            stop: CommandSpec::new("true", Vec::<String>::new()),
            max_capture_bytes: 1024,
        });

        let result = runner
            .run(LifecycleCommand::Deploy, dir.path(), Duration::from_secs(20))
            .await;

        assert!(!result.succeeded);
        assert!(result.message.len() <= 1024 + "Deployment failed: ".len());
    }

    #[tokio::test]
    async fn test_stop_messages() {
        let dir = TempDir::new().unwrap();
        let runner = ProcessRunner::new(RunnerConfig {
            deploy: sh("true"),
            stop: sh("echo 'no such service' >&2; exit 1"),
            max_capture_bytes: MAX_CAPTURE_BYTES,
        });

        let result = runner
            .run(LifecycleCommand::Stop, dir.path(), Duration::from_secs(10))
            .await;
        assert_eq!(result.message, "Stop failed: no such service");
    }
}
