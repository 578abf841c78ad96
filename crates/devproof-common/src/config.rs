//! Global configuration model for a validation run.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{DevproofError, Result};

/// Root configuration shared by both pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Container runtime binary (looked up on `PATH`).
    pub runtime: String,
    /// Mount point of the project inside the built image.
    pub container_workdir: String,
    /// Timeout for build, compile, and test invocations, in seconds.
    pub command_timeout_secs: u64,
    /// Timeout for the runtime version probe, in seconds.
    pub probe_timeout_secs: u64,
    /// Container config document, relative to the project root.
    pub devcontainer_file: PathBuf,
    /// Editor configuration directory, relative to the project root.
    pub editor_dir: PathBuf,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            runtime: constants::DEFAULT_RUNTIME.to_string(),
            container_workdir: constants::CONTAINER_WORKDIR.to_string(),
            command_timeout_secs: constants::DEFAULT_COMMAND_TIMEOUT_SECS,
            probe_timeout_secs: constants::DEFAULT_PROBE_TIMEOUT_SECS,
            devcontainer_file: PathBuf::from(constants::DEVCONTAINER_FILE),
            editor_dir: PathBuf::from(constants::EDITOR_DIR),
        }
    }
}

impl ValidatorConfig {
    /// Builds a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an override variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration, applying overrides from `lookup`.
    ///
    /// Recognizes `DEVPROOF_RUNTIME` and `DEVPROOF_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout override is not a positive integer
    /// or the runtime override is blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(runtime) = lookup(constants::ENV_RUNTIME) {
            config = config.with_runtime(runtime)?;
        }
        if let Some(raw) = lookup(constants::ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| DevproofError::Config {
                message: format!("{} must be a positive integer, got {raw:?}", constants::ENV_TIMEOUT_SECS),
            })?;
            config = config.with_command_timeout(secs)?;
        }
        Ok(config)
    }

    /// Replaces the runtime binary.
    ///
    /// # Errors
    ///
    /// Returns an error if `runtime` is blank.
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Result<Self> {
        let runtime = runtime.into();
        if runtime.trim().is_empty() {
            return Err(DevproofError::Config {
                message: "runtime binary must not be empty".into(),
            });
        }
        self.runtime = runtime;
        Ok(self)
    }

    /// Replaces the command timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `secs` is zero.
    pub fn with_command_timeout(mut self, secs: u64) -> Result<Self> {
        if secs == 0 {
            return Err(DevproofError::Config {
                message: "command timeout must be greater than zero".into(),
            });
        }
        self.command_timeout_secs = secs;
        Ok(self)
    }

    /// Command timeout as a [`Duration`].
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Probe timeout as a [`Duration`].
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_docker_and_workspace_mount() {
        let config = ValidatorConfig::default();
        assert_eq!(config.runtime, "docker");
        assert_eq!(config.container_workdir, "/workspace");
        assert_eq!(config.command_timeout(), Duration::from_secs(900));
    }

    #[test]
    fn lookup_overrides_runtime_and_timeout() {
        let config = ValidatorConfig::from_lookup(|key| match key {
            "DEVPROOF_RUNTIME" => Some("podman".into()),
            "DEVPROOF_TIMEOUT_SECS" => Some("120".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.runtime, "podman");
        assert_eq!(config.command_timeout_secs, 120);
    }

    #[test]
    fn lookup_rejects_non_numeric_timeout() {
        let result = ValidatorConfig::from_lookup(|key| {
            (key == "DEVPROOF_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(ValidatorConfig::default().with_command_timeout(0).is_err());
    }

    #[test]
    fn blank_runtime_is_rejected() {
        assert!(ValidatorConfig::default().with_runtime("  ").is_err());
    }
}
