//! The narrow seam between pipelines and external processes.

use std::sync::Arc;

use crate::exec::{CommandResult, RunOptions};

/// Runs one invocation of the container runtime CLI.
///
/// `args` excludes the binary itself. Implementations must never panic
/// and must fold every failure into the returned [`CommandResult`].
pub trait CommandRunner: Send + Sync {
    /// Executes the runtime with `args`.
    fn run(&self, args: &[String], options: &RunOptions) -> CommandResult;
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, args: &[String], options: &RunOptions) -> CommandResult {
        (**self).run(args, options)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
    fn run(&self, args: &[String], options: &RunOptions) -> CommandResult {
        (**self).run(args, options)
    }
}

/// Information about the runtime binary on this host.
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    /// Binary name as configured.
    pub binary: String,
    /// Resolved path, if the binary is on `PATH`.
    pub path: Option<std::path::PathBuf>,
}

/// Looks up the runtime binary on `PATH`.
#[must_use]
pub fn runtime_info(binary: &str) -> RuntimeInfo {
    RuntimeInfo {
        binary: binary.to_string(),
        path: which::which(binary).ok(),
    }
}
