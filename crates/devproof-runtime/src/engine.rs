//! High-level container runtime operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use devproof_common::config::ValidatorConfig;
use devproof_common::error::Result;

use crate::backend::CommandRunner;
use crate::dockerfile::{self, ScriptInfo};
use crate::exec::{CommandResult, RunOptions};
use crate::process::ProcessRunner;

/// Parameters of an image build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Build script to use.
    pub dockerfile: PathBuf,
    /// Tag applied to the result.
    pub tag: String,
    /// Build context directory.
    pub context: PathBuf,
    /// Build arguments, forwarded as discrete `KEY=VALUE` pairs.
    pub build_args: Vec<(String, String)>,
}

/// Parameters of a one-shot container run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerRunOptions {
    /// Container name, so a run that outlives its client can be removed.
    pub name: Option<String>,
    /// Working directory inside the container.
    pub workdir: Option<String>,
    /// Environment variables set inside the container.
    pub env: Vec<(String, String)>,
    /// Volume mounts as `host:container`.
    pub volumes: Vec<String>,
    /// User to run as.
    pub user: Option<String>,
}

/// Stateless adapter over the container runtime CLI.
///
/// Holds no per-project state: callers own the image tag and pass it to
/// every operation that needs it.
pub struct ContainerRuntime {
    runner: Box<dyn CommandRunner>,
    command_timeout: Duration,
    probe_timeout: Duration,
}

impl ContainerRuntime {
    /// Creates an adapter over `runner` with default timeouts.
    #[must_use]
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        let defaults = ValidatorConfig::default();
        Self {
            runner: Box::new(runner),
            command_timeout: defaults.command_timeout(),
            probe_timeout: defaults.probe_timeout(),
        }
    }

    /// Creates an adapter that spawns the configured runtime binary.
    #[must_use]
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(ProcessRunner::new(config.runtime.clone()))
            .with_timeouts(config.command_timeout(), config.probe_timeout())
    }

    /// Replaces the invocation deadlines.
    #[must_use]
    pub const fn with_timeouts(mut self, command: Duration, probe: Duration) -> Self {
        self.command_timeout = command;
        self.probe_timeout = probe;
        self
    }

    /// Deadline applied to build and run invocations.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Queries the runtime version.
    pub fn probe(&self) -> CommandResult {
        self.invoke(vec!["--version".to_string()], self.probe_timeout)
    }

    /// Builds an image. Builds of the same tag are serialized.
    pub fn build(&self, request: &BuildRequest) -> CommandResult {
        let lock = tag_lock(&request.tag);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            tracing::info!(tag = %request.tag, dockerfile = %request.dockerfile.display(), "building image");
            self.invoke(build_args(request), self.command_timeout)
        };
        release_tag_lock(&request.tag, lock);
        result
    }

    /// Runs `command` in a throwaway container from `image`.
    pub fn run(&self, image: &str, command: &[String], options: &ContainerRunOptions) -> CommandResult {
        tracing::info!(image, ?command, "running container");
        self.invoke(run_args(image, command, options), self.command_timeout)
    }

    /// Whether an image with `tag` exists locally.
    pub fn image_exists(&self, tag: &str) -> bool {
        self.invoke(
            vec!["image".into(), "inspect".into(), tag.to_string()],
            self.probe_timeout,
        )
        .success
    }

    /// Force-removes the container called `name`, stopping it if needed.
    pub fn remove_container(&self, name: &str) -> CommandResult {
        tracing::info!(name, "removing container");
        self.invoke(vec!["rm".into(), "-f".into(), name.to_string()], self.probe_timeout)
    }

    /// Force-removes the image with `tag`.
    pub fn remove_image(&self, tag: &str) -> CommandResult {
        tracing::info!(tag, "removing image");
        self.invoke(vec!["rmi".into(), "-f".into(), tag.to_string()], self.probe_timeout)
    }

    /// Extracts base image, workdir, user, and exposed ports from a script.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be read.
    pub fn inspect_script(&self, path: &Path) -> Result<ScriptInfo> {
        dockerfile::inspect_script(path)
    }

    fn invoke(&self, args: Vec<String>, timeout: Duration) -> CommandResult {
        self.runner.run(&args, &RunOptions::with_timeout(timeout))
    }
}

/// Arguments of a `build` invocation.
#[must_use]
pub fn build_args(request: &BuildRequest) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        "-t".to_string(),
        request.tag.clone(),
        "-f".to_string(),
        request.dockerfile.to_string_lossy().into_owned(),
    ];
    for (key, value) in &request.build_args {
        args.push("--build-arg".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(request.context.to_string_lossy().into_owned());
    args
}

/// Arguments of a `run` invocation.
#[must_use]
pub fn run_args(image: &str, command: &[String], options: &ContainerRunOptions) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--rm".to_string()];
    if let Some(name) = &options.name {
        args.push("--name".to_string());
        args.push(name.clone());
    }
    if let Some(workdir) = &options.workdir {
        args.push("-w".to_string());
        args.push(workdir.clone());
    }
    for (key, value) in &options.env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    for volume in &options.volumes {
        args.push("-v".to_string());
        args.push(volume.clone());
    }
    if let Some(user) = &options.user {
        args.push("-u".to_string());
        args.push(user.clone());
    }
    args.push(image.to_string());
    args.extend(command.iter().cloned());
    args
}

type TagLocks = Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// One lock per tag with a build in flight or waiting. Entries are dropped
/// by the last builder to release them.
static TAG_LOCKS: OnceLock<TagLocks> = OnceLock::new();

fn tag_locks() -> &'static TagLocks {
    TAG_LOCKS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn tag_lock(tag: &str) -> Arc<Mutex<()>> {
    let mut map = tag_locks().lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(map.entry(tag.to_string()).or_default())
}

/// Drops `lock`, removing the map entry when no other builder holds it.
fn release_tag_lock(tag: &str, lock: Arc<Mutex<()>>) {
    let mut map = tag_locks().lock().unwrap_or_else(PoisonError::into_inner);
    // Clones are only taken under the map lock, so the count is stable here.
    if Arc::strong_count(&lock) == 2 {
        let _ = map.remove(tag);
    }
    drop(lock);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedRunner;

    fn request() -> BuildRequest {
        BuildRequest {
            dockerfile: PathBuf::from("/p/.devcontainer/Dockerfile"),
            tag: "devproof-p-12345678".into(),
            context: PathBuf::from("/p/.devcontainer"),
            build_args: vec![("VARIANT".into(), "20".into()), ("USER".into(), "dev".into())],
        }
    }

    #[test]
    fn build_args_forward_each_pair_and_end_with_context() {
        let args = build_args(&request());
        assert_eq!(
            args,
            vec![
                "build",
                "-t",
                "devproof-p-12345678",
                "-f",
                "/p/.devcontainer/Dockerfile",
                "--build-arg",
                "VARIANT=20",
                "--build-arg",
                "USER=dev",
                "/p/.devcontainer",
            ]
        );
    }

    #[test]
    fn run_args_place_image_before_command() {
        let options = ContainerRunOptions {
            name: Some("devproof-p-test".into()),
            workdir: Some("/workspace".into()),
            env: vec![("CI".into(), "true".into())],
            volumes: vec!["/p:/workspace".into()],
            user: Some("1000".into()),
        };
        let args = run_args("img", &["sh".into(), "-c".into(), "make".into()], &options);
        assert_eq!(
            args,
            vec![
                "run", "--rm", "--name", "devproof-p-test", "-w", "/workspace", "-e", "CI=true", "-v", "/p:/workspace", "-u", "1000",
                "img", "sh", "-c", "make",
            ]
        );
    }

    #[test]
    fn probe_uses_version_query() {
        let runner = Arc::new(ScriptedRunner::new().respond("--version", CommandResult::ok("Docker version 27.0.1")));
        let runtime = ContainerRuntime::new(Arc::clone(&runner));
        let result = runtime.probe();
        assert!(result.success);
        assert_eq!(runner.calls(), vec![vec!["--version".to_string()]]);
    }

    #[test]
    fn image_exists_follows_inspect_exit_code() {
        let runner = ScriptedRunner::new().respond("image", CommandResult::from_output(1, "", "No such image"));
        let runtime = ContainerRuntime::new(runner);
        assert!(!runtime.image_exists("missing"));
    }

    #[test]
    fn remove_image_forces_removal() {
        let runner = Arc::new(ScriptedRunner::new());
        let runtime = ContainerRuntime::new(Arc::clone(&runner));
        let _ = runtime.remove_image("devproof-x");
        assert_eq!(runner.calls()[0], vec!["rmi", "-f", "devproof-x"]);
    }

    #[test]
    fn remove_container_forces_removal() {
        let runner = Arc::new(ScriptedRunner::new());
        let runtime = ContainerRuntime::new(Arc::clone(&runner));
        let _ = runtime.remove_container("devproof-x-test");
        assert_eq!(runner.calls()[0], vec!["rm", "-f", "devproof-x-test"]);
    }

    #[test]
    fn finished_builds_release_their_lock_entry() {
        let runtime = ContainerRuntime::new(ScriptedRunner::new());
        let request = BuildRequest {
            tag: "devproof-release-test".into(),
            ..request()
        };
        let _ = runtime.build(&request);
        let map = tag_locks().lock().unwrap();
        assert!(!map.contains_key("devproof-release-test"));
    }

    #[test]
    fn same_tag_shares_one_lock() {
        let a = tag_lock("devproof-lock-test");
        let b = tag_lock("devproof-lock-test");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &tag_lock("devproof-other")));
    }
}
