//! Process spawning with a bounded wall-clock deadline.
//!
//! Each invocation runs on a private current-thread tokio runtime, so the
//! [`CommandRunner`] seam stays blocking. The child leads its own process
//! group; on expiry the whole group is killed. Output collection after
//! the child is gone is bounded by [`DRAIN_GRACE`].

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::backend::CommandRunner;
use crate::exec::{CommandResult, NO_EXIT_CODE, RunOptions};

/// How long to wait for pipes to close once the child is gone.
pub const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// [`CommandRunner`] that spawns a real binary.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
}

impl ProcessRunner {
    /// Creates a runner for `program` (resolved on `PATH` at each call).
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Binary this runner invokes.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    async fn invoke(&self, mut command: Command, args: &[String], timeout: Option<Duration>) -> CommandResult {
        tracing::debug!(program = %self.program, ?args, "spawning");
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandResult::spawn_failure(format!("failed to start {}: {e}", self.program));
            }
        };
        let pid = child.id();
        let stdout = tokio::spawn(drain(child.stdout.take()));
        let stderr = tokio::spawn(drain(child.stderr.take()));

        let waited = match timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait()).await,
            None => Ok(child.wait().await),
        };

        match waited {
            Ok(Ok(status)) => {
                let code = status.code().unwrap_or(NO_EXIT_CODE);
                tracing::debug!(program = %self.program, code, "process exited");
                let stdout = collect(stdout).await;
                let stderr = collect(stderr).await;
                CommandResult::from_output(code, &stdout, &stderr)
            }
            Ok(Err(e)) => CommandResult::spawn_failure(format!("failed waiting for {}: {e}", self.program)),
            Err(_) => {
                let limit = timeout.unwrap_or_default();
                tracing::warn!(program = %self.program, ?args, secs = limit.as_secs(), "process timed out");
                kill_group(pid);
                if let Err(e) = child.kill().await {
                    tracing::debug!(error = %e, "child already gone");
                }
                let stdout = collect(stdout).await;
                let stderr = collect(stderr).await;
                CommandResult::timeout(limit, &stdout, &stderr)
            }
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, args: &[String], options: &RunOptions) -> CommandResult {
        let Ok(binary) = which::which(&self.program) else {
            tracing::debug!(program = %self.program, "runtime binary not on PATH");
            return CommandResult::spawn_failure(format!("{} not found on PATH", self.program));
        };

        let mut command = Command::new(binary);
        let _ = command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        {
            let _ = command.process_group(0);
        }
        for (key, value) in &options.env {
            let _ = command.env(key, value);
        }
        if let Some(cwd) = &options.cwd {
            let _ = command.current_dir(cwd);
        }

        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => return CommandResult::spawn_failure(format!("failed to start process driver: {e}")),
        };
        runtime.block_on(self.invoke(command, args, options.timeout))
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            tracing::debug!(error = %e, "pipe read failed");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Joins a reader, giving up after [`DRAIN_GRACE`] when a stray process
/// still holds the pipe open.
async fn collect(reader: JoinHandle<String>) -> String {
    let abort = reader.abort_handle();
    if let Ok(joined) = tokio::time::timeout(DRAIN_GRACE, reader).await {
        joined.unwrap_or_default()
    } else {
        abort.abort();
        String::new()
    }
}

/// Sends SIGKILL to the process group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        tracing::debug!(pid, error = %e, "process group already gone");
    }
}

#[cfg(not(unix))]
const fn kill_group(_pid: Option<u32>) {}
