use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::RunnerConfig;
use crate::error::EnvironmentError;
use crate::git::command::{CommandRequest, Program};

/// Exit code reported when the process could not start, timed out or was signaled
pub const SYNTHETIC_FAILURE_CODE: i32 = 1;

/// How long to wait for output pipes to close once the child is gone
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Result of running a single [`CommandRequest`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
    /// Output went past the byte ceiling and was cut
    pub truncated: bool,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    fn failed_to_start(program: Program, err: &std::io::Error) -> Self {
        Self {
            stderr: format!("failed to start {}: {}", program, err),
            exit_code: SYNTHETIC_FAILURE_CODE,
            ..Self::default()
        }
    }
}

/// Executes command requests.
///
/// Implementations never go through a shell and report every outcome as a
/// [`ProcessResult`], including failure to start.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, request: &CommandRequest) -> ProcessResult;

    /// Resolve the executable for `program`, failing if it is absent
    fn locate(&self, program: Program) -> Result<PathBuf, EnvironmentError>;
}

/// Runs requests as real child processes on the tokio runtime
#[derive(Debug, Clone)]
pub struct SystemRunner {
    max_output_bytes: usize,
    executables: HashMap<Program, PathBuf>,
}

impl SystemRunner {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            max_output_bytes: config.max_output_bytes,
            executables: HashMap::new(),
        }
    }

    /// Use a specific binary for `program` instead of looking it up on `PATH`
    pub fn with_executable(mut self, program: Program, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(program, path.into());
        self
    }

    fn executable_for(&self, program: Program) -> PathBuf {
        self.executables
            .get(&program)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(program.executable()))
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(&RunnerConfig::default())
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, request: &CommandRequest) -> ProcessResult {
        let program = request.program();
        let command_line = request.display_line();

        tracing::debug!(
            command = %command_line,
            cwd = %request.working_dir.display(),
            "spawning"
        );

        let mut cmd = Command::new(self.executable_for(program));
        cmd.args(request.argv())
            .current_dir(&request.working_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(command = %command_line, error = %e, "failed to start");
                return ProcessResult::failed_to_start(program, &e);
            }
        };

        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(read_to_end_limited(out, self.max_output_bytes)));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(read_to_end_limited(err, self.max_output_bytes)));

        let mut timed_out = false;
        let mut wait_error = None;
        let exit_code = match time::timeout(request.timeout, child.wait()).await {
            Ok(Ok(status)) => status.code().unwrap_or(SYNTHETIC_FAILURE_CODE),
            Ok(Err(e)) => {
                wait_error = Some(e.to_string());
                SYNTHETIC_FAILURE_CODE
            }
            Err(_) => {
                timed_out = true;
                tracing::warn!(
                    command = %command_line,
                    timeout_ms = request.timeout.as_millis() as u64,
                    "timed out, killing"
                );
                let _ = child.kill().await;
                SYNTHETIC_FAILURE_CODE
            }
        };

        let (stdout, stderr) = tokio::join!(collect(stdout_task), collect(stderr_task));
        let abandoned: Vec<&str> = [("stdout", stdout.is_none()), ("stderr", stderr.is_none())]
            .into_iter()
            .filter_map(|(name, open)| open.then_some(name))
            .collect();
        let (stdout, stdout_truncated) = stdout.unwrap_or_default();
        let (stderr, stderr_truncated) = stderr.unwrap_or_default();

        let mut stderr = String::from_utf8_lossy(&stderr).into_owned();
        if let Some(e) = wait_error {
            append_line(&mut stderr, &format!("failed to wait for {}: {}", program, e));
        }
        if timed_out {
            append_line(
                &mut stderr,
                &format!(
                    "{} timed out after {} ms and was terminated",
                    program,
                    request.timeout.as_millis()
                ),
            );
        }

        if !abandoned.is_empty() {
            tracing::warn!(
                command = %command_line,
                streams = ?abandoned,
                "output still open after exit, reader abandoned"
            );
        }
        for stream in &abandoned {
            append_line(
                &mut stderr,
                &format!(
                    "{} {} was still open {} ms after exit; its output was discarded",
                    program,
                    stream,
                    DRAIN_GRACE.as_millis()
                ),
            );
        }

        tracing::info!(command = %command_line, exit_code, timed_out, "finished");

        ProcessResult {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr,
            exit_code,
            timed_out,
            truncated: stdout_truncated || stderr_truncated,
        }
    }

    fn locate(&self, program: Program) -> Result<PathBuf, EnvironmentError> {
        match self.executables.get(&program) {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(_) => Err(EnvironmentError::ExecutableNotFound(program.to_string())),
            None => which::which(program.executable())
                .map_err(|_| EnvironmentError::ExecutableNotFound(program.to_string())),
        }
    }
}

/// Wait for a reader task to finish.
///
/// A stream can outlive the child when a descendant inherited the pipe. After
/// [`DRAIN_GRACE`] the reader is aborted and `None` is returned.
async fn collect(task: Option<JoinHandle<(Vec<u8>, bool)>>) -> Option<(Vec<u8>, bool)> {
    let Some(mut task) = task else {
        return Some((Vec::new(), false));
    };
    match time::timeout(DRAIN_GRACE, &mut task).await {
        Ok(Ok(output)) => Some(output),
        Ok(Err(_)) => Some((Vec::new(), false)),
        Err(_) => {
            task.abort();
            None
        }
    }
}

fn append_line(buf: &mut String, line: &str) {
    if !buf.is_empty() && !buf.ends_with('\n') {
        buf.push('\n');
    }
    buf.push_str(line);
}

/// Read a stream to the end, keeping at most `max_bytes`.
///
/// Bytes past the limit are drained and dropped so the child never blocks on
/// a full pipe.
async fn read_to_end_limited<R: AsyncRead + Unpin + Send + 'static>(
    mut reader: R,
    max_bytes: usize,
) -> (Vec<u8>, bool) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let remaining = max_bytes.saturating_sub(buf.len());
        let take = remaining.min(n);
        buf.extend_from_slice(&chunk[..take]);
        if take < n {
            truncated = true;
        }
    }

    (buf, truncated)
}
