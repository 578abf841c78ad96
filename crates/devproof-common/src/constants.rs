//! System-wide constants and default paths.

/// Default container runtime binary.
pub const DEFAULT_RUNTIME: &str = "docker";

/// Directory the project is mounted at inside the built image.
pub const CONTAINER_WORKDIR: &str = "/workspace";

/// Default wall-clock limit for build/compile/test invocations, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 900;

/// Wall-clock limit for the runtime version probe, in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 15;

/// Container config document, relative to the project root.
pub const DEVCONTAINER_FILE: &str = ".devcontainer/devcontainer.json";

/// Editor configuration directory, relative to the project root.
pub const EDITOR_DIR: &str = ".vscode";

/// Debug-launch document name inside [`EDITOR_DIR`].
pub const LAUNCH_FILE: &str = "launch.json";

/// Task document name inside [`EDITOR_DIR`].
pub const TASKS_FILE: &str = "tasks.json";

/// Settings document name inside [`EDITOR_DIR`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Extension recommendations document name inside [`EDITOR_DIR`].
pub const EXTENSIONS_FILE: &str = "extensions.json";

/// Expected `version` literal of the launch document.
pub const LAUNCH_VERSION: &str = "0.2.0";

/// Expected `version` literal of the task document.
pub const TASKS_VERSION: &str = "2.0.0";

/// Prefix of every derived image tag.
pub const IMAGE_TAG_PREFIX: &str = "devproof";

/// Ports below this value need elevated runtime privilege.
pub const PRIVILEGED_PORT_LIMIT: i64 = 1024;

/// Maximum number of stderr lines surfaced as compile errors.
pub const MAX_SURFACED_STDERR_LINES: usize = 20;

/// Environment variable overriding the runtime binary.
pub const ENV_RUNTIME: &str = "DEVPROOF_RUNTIME";

/// Environment variable overriding the command timeout.
pub const ENV_TIMEOUT_SECS: &str = "DEVPROOF_TIMEOUT_SECS";

/// Application name used in CLI output.
pub const APP_NAME: &str = "devproof";

/// Stage names shared by pipelines, reports, and recommendations.
pub mod stages {
    /// Static container config validation.
    pub const CONFIG: &str = "config";
    /// Runtime availability probe.
    pub const RUNTIME: &str = "runtime";
    /// Build-script inspection.
    pub const DOCKERFILE: &str = "dockerfile";
    /// Image build.
    pub const BUILD: &str = "build";
    /// Compile inside the built image.
    pub const COMPILE: &str = "compile";
    /// Tests inside the built image.
    pub const TEST: &str = "test";
    /// Debug-launch document.
    pub const LAUNCH: &str = "launch";
    /// Task document.
    pub const TASKS: &str = "tasks";
    /// Settings document.
    pub const SETTINGS: &str = "settings";
    /// Checks spanning several editor documents.
    pub const CROSS_VALIDATION: &str = "cross-validation";
    /// Extension recommendations advisory.
    pub const EXTENSIONS: &str = "extensions";
}

/// Name of the container pipeline in reports.
pub const CONTAINER_PIPELINE: &str = "container";

/// Name of the editor configuration pipeline in reports.
pub const EDITOR_PIPELINE: &str = "editor-config";
