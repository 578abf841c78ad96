//! Uniform outcome of an external invocation.

use std::path::PathBuf;
use std::time::Duration;

/// Exit code reported when the process never produced one.
pub const NO_EXIT_CODE: i32 = -1;

/// Outcome of one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// `exit_code == 0`.
    pub success: bool,
    /// Trimmed standard output.
    pub stdout: String,
    /// Trimmed standard error.
    pub stderr: String,
    /// Process exit code, or [`NO_EXIT_CODE`].
    pub exit_code: i32,
    /// Whether the invocation was killed at its deadline.
    pub timed_out: bool,
}

impl CommandResult {
    /// Builds a result from a finished process.
    #[must_use]
    pub fn from_output(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            success: exit_code == 0,
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
            exit_code,
            timed_out: false,
        }
    }

    /// Builds a successful result with the given stdout.
    #[must_use]
    pub fn ok(stdout: &str) -> Self {
        Self::from_output(0, stdout, "")
    }

    /// Builds a result for a process that could not be started.
    #[must_use]
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: message.into(),
            exit_code: NO_EXIT_CODE,
            timed_out: false,
        }
    }

    /// Builds a result for a process killed at its deadline.
    #[must_use]
    pub fn timeout(limit: Duration, stdout: &str, stderr: &str) -> Self {
        let note = format!("timed out after {limit:?}");
        let stderr = stderr.trim();
        Self {
            success: false,
            stdout: stdout.trim().to_string(),
            stderr: if stderr.is_empty() {
                note
            } else {
                format!("{stderr}\n{note}")
            },
            exit_code: NO_EXIT_CODE,
            timed_out: true,
        }
    }

    /// Last `n` non-empty lines of stderr, falling back to stdout.
    #[must_use]
    pub fn tail(&self, n: usize) -> String {
        let source = if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        lines[lines.len().saturating_sub(n)..].join("\n")
    }
}

/// Per-invocation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Wall-clock limit. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Extra environment for the spawned process.
    pub env: Vec<(String, String)>,
    /// Working directory for the spawned process.
    pub cwd: Option<PathBuf>,
}

impl RunOptions {
    /// Options with only a timeout set.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            env: Vec::new(),
            cwd: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_trimmed_and_success_follows_exit_code() {
        let result = CommandResult::from_output(0, "  hello\n", "\n");
        assert!(result.success);
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.stderr, "");

        let failed = CommandResult::from_output(2, "", "boom");
        assert!(!failed.success);
        assert_eq!(failed.exit_code, 2);
    }

    #[test]
    fn spawn_failure_uses_sentinel_exit_code() {
        let result = CommandResult::spawn_failure("docker not found");
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
        assert!(!result.timed_out);
    }

    #[test]
    fn timeout_appends_note() {
        let result = CommandResult::timeout(Duration::from_secs(5), "", "partial");
        assert!(result.timed_out);
        assert_eq!(result.stderr, "partial\ntimed out after 5s");
    }

    #[test]
    fn tail_prefers_stderr() {
        let result = CommandResult::from_output(1, "out", "a\n\nb\nc");
        assert_eq!(result.tail(2), "b\nc");
        let quiet = CommandResult::from_output(1, "x\ny", "");
        assert_eq!(quiet.tail(5), "x\ny");
    }
}
