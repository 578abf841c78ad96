//! The container environment pipeline.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use devproof_common::aggregate::{build_report, make_error, make_warning};
use devproof_common::codes;
use devproof_common::config::ValidatorConfig;
use devproof_common::constants::{APP_NAME, CONTAINER_PIPELINE, MAX_SURFACED_STDERR_LINES, stages};
use devproof_common::documents::{DocumentSource, FsDocuments, strip_json_comments};
use devproof_common::error::{DevproofError, Result};
use devproof_common::types::{Location, Severity, ValidationReport, ValidationResult, display_path};
use devproof_runtime::backend::runtime_info;
use devproof_runtime::dockerfile::parse_script;
use devproof_runtime::tag::derive_image_tag;
use devproof_runtime::{BuildRequest, CommandResult, ContainerRunOptions, ContainerRuntime};
use serde_json::Value;

use crate::config::{self, ImageSource};
use crate::project::{self, ProjectCommand};
use crate::stages::{CONTAINER_STAGES, drive};
use crate::{compile, script, test_output};

const GENERATED_SCRIPT: &str = "Dockerfile";

/// State threaded through the stages of one run.
struct Run {
    root: PathBuf,
    config_path: PathBuf,
    tag: String,
    source: Option<ImageSource>,
}

impl Run {
    fn location(&self, path: &Path) -> Location {
        Location::file(display_path(&self.root, path))
    }
}

/// Validates a project's container environment end to end.
pub struct ContainerPipeline {
    runtime: ContainerRuntime,
    docs: Box<dyn DocumentSource>,
    config: ValidatorConfig,
}

impl ContainerPipeline {
    /// Creates a pipeline using the configured runtime binary and the local
    /// file system.
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        let runtime = ContainerRuntime::from_config(&config);
        Self::with_parts(runtime, FsDocuments, config)
    }

    /// Creates a pipeline from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        runtime: ContainerRuntime,
        docs: impl DocumentSource + 'static,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            runtime,
            docs: Box::new(docs),
            config,
        }
    }

    /// Image tag a run against `project_root` builds.
    #[must_use]
    pub fn image_tag(project_root: &Path) -> String {
        derive_image_tag(project_root)
    }

    /// Runs the gated stage sequence against the project at `project_root`.
    ///
    /// Never fails: every problem is reported in the returned report.
    pub fn validate(&self, project_root: &Path) -> ValidationReport {
        let started = Utc::now();
        let clock = Instant::now();
        let root = resolve_root(project_root);
        let mut run = Run {
            config_path: root.join(&self.config.devcontainer_file),
            tag: derive_image_tag(&root),
            root,
            source: None,
        };
        tracing::info!(project = %run.root.display(), tag = %run.tag, "validating container environment");

        let results = drive(&CONTAINER_STAGES, |descriptor| self.execute(descriptor.name, &mut run));
        let report = build_report(CONTAINER_PIPELINE, started, clock.elapsed(), results);
        tracing::info!(
            passed = report.summary.passed,
            failed = report.summary.failed,
            warnings = report.summary.warnings,
            "container environment validated"
        );
        report
    }

    /// Removes the image built under `tag` and its generated build script.
    ///
    /// Safe to call any number of times, whether or not a build happened.
    /// Problems are logged and never returned.
    pub fn cleanup(&self, tag: &str) {
        if self.runtime.image_exists(tag) {
            let removed = self.runtime.remove_image(tag);
            if removed.success {
                tracing::info!(tag, "image removed");
            } else {
                tracing::warn!(tag, stderr = %removed.stderr, "image removal failed");
            }
        } else {
            tracing::debug!(tag, "no image to remove");
        }

        let scratch = scratch_dir(tag);
        if scratch.exists() {
            if let Err(e) = std::fs::remove_dir_all(&scratch) {
                tracing::warn!(path = %scratch.display(), error = %e, "failed to remove generated build script");
            }
        }
    }

    fn execute(&self, stage: &str, run: &mut Run) -> Result<ValidationResult> {
        match stage {
            stages::CONFIG => self.config_stage(run),
            stages::RUNTIME => Ok(self.runtime_stage()),
            stages::DOCKERFILE => self.dockerfile_stage(run),
            stages::BUILD => self.build_stage(run),
            stages::COMPILE => self.compile_stage(run),
            stages::TEST => self.test_stage(run),
            other => Err(DevproofError::NotFound {
                kind: "stage",
                id: other.to_string(),
            }),
        }
    }

    fn config_stage(&self, run: &mut Run) -> Result<ValidationResult> {
        let location = run.location(&run.config_path);
        if !self.docs.exists(&run.config_path) {
            let mut result = ValidationResult::new(stages::CONFIG, "devcontainer.json not found");
            result.push_error(
                make_error(
                    codes::CONFIG_NOT_FOUND,
                    format!("{} does not exist", location.file.display()),
                    Severity::Critical,
                )
                .at(location),
            );
            return Ok(result);
        }

        let text = self.docs.read_text(&run.config_path)?;
        let doc: Value = serde_json::from_str(&strip_json_comments(&text)).map_err(|source| DevproofError::Json {
            path: run.config_path.clone(),
            source,
        })?;
        let config_dir = run.config_path.parent().unwrap_or(&run.root).to_path_buf();
        run.source = config::image_source(&doc, &config_dir);
        Ok(config::check(&doc, &location))
    }

    fn runtime_stage(&self) -> ValidationResult {
        let probe = self.runtime.probe();
        let runtime = self.config.runtime.as_str();
        let binary_path = runtime_info(runtime)
            .path
            .map_or(Value::Null, |p| Value::from(p.display().to_string()));
        if probe.success {
            let version = probe.stdout.lines().next().unwrap_or_default().to_string();
            return ValidationResult::new(stages::RUNTIME, format!("{runtime} is available"))
                .with_metadata("runtime", runtime)
                .with_metadata("binaryPath", binary_path)
                .with_metadata("version", version);
        }
        let mut result = ValidationResult::new(stages::RUNTIME, format!("{runtime} is not available"))
            .with_metadata("binaryPath", binary_path);
        result.push_error(
            make_error(
                codes::RUNTIME_UNAVAILABLE,
                format!("{runtime} --version failed: {}", probe.tail(3)),
                Severity::Critical,
            )
            .with_context("exitCode", probe.exit_code),
        );
        result
    }

    fn dockerfile_stage(&self, run: &Run) -> Result<ValidationResult> {
        match &run.source {
            Some(ImageSource::Script { dockerfile, .. }) => {
                let location = run.location(dockerfile);
                if !self.docs.exists(dockerfile) {
                    return Ok(script::not_found(location));
                }
                let info = parse_script(&self.docs.read_text(dockerfile)?);
                Ok(script::check(&info, &location))
            }
            Some(ImageSource::Image(image)) => Ok(script::no_script(Some(image))),
            None => Ok(script::no_script(None)),
        }
    }

    fn build_stage(&self, run: &Run) -> Result<ValidationResult> {
        let (request, generated) = match &run.source {
            Some(ImageSource::Script {
                dockerfile,
                context,
                args,
            }) => (
                BuildRequest {
                    dockerfile: dockerfile.clone(),
                    tag: run.tag.clone(),
                    context: context.clone(),
                    build_args: args.clone(),
                },
                false,
            ),
            Some(ImageSource::Image(image)) => {
                let dockerfile = self.write_generated_script(&run.tag, image)?;
                let context = scratch_dir(&run.tag);
                (
                    BuildRequest {
                        dockerfile,
                        tag: run.tag.clone(),
                        context,
                        build_args: Vec::new(),
                    },
                    true,
                )
            }
            None => {
                return Err(DevproofError::Config {
                    message: "no image source resolved from devcontainer.json".into(),
                });
            }
        };

        let outcome = self.runtime.build(&request);
        let mut result = ValidationResult::new(stages::BUILD, format!("built image {}", run.tag))
            .with_metadata("imageTag", run.tag.as_str())
            .with_metadata("generatedDockerfile", generated);
        if outcome.timed_out {
            result.push_error(timeout_error("image build", &outcome));
        } else if !outcome.success {
            let code = if generated {
                codes::GENERATED_DOCKERFILE_FAILED
            } else {
                codes::BUILD_FAILED
            };
            result.push_error(
                make_error(
                    code,
                    format!("image build exited with code {}", outcome.exit_code),
                    Severity::Error,
                )
                .with_context("output", outcome.tail(MAX_SURFACED_STDERR_LINES)),
            );
        }
        if !result.success {
            result.set_message(format!("failed to build image {}", run.tag));
        }
        Ok(result)
    }

    /// Writes `FROM <image>` + `WORKDIR <workdir>` to the tag's scratch
    /// directory, replacing any earlier copy.
    fn write_generated_script(&self, tag: &str, image: &str) -> Result<PathBuf> {
        let dir = scratch_dir(tag);
        std::fs::create_dir_all(&dir).map_err(|source| DevproofError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(GENERATED_SCRIPT);
        let content = format!("FROM {image}\nWORKDIR {}\n", self.config.container_workdir);
        std::fs::write(&path, content).map_err(|source| DevproofError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "generated build script");
        Ok(path)
    }

    fn compile_stage(&self, run: &Run) -> Result<ValidationResult> {
        let Some(command) = project::compile_command(self.docs.as_ref(), &run.root)? else {
            return Ok(ValidationResult::new(stages::COMPILE, "no compile step detected"));
        };
        let outcome = self.run_in_image(run, stages::COMPILE, &command, Vec::new());
        let mut result = ValidationResult::new(stages::COMPILE, format!("`{command}` succeeded"))
            .with_metadata("command", command.to_string())
            .with_metadata("exitCode", outcome.exit_code);

        if outcome.timed_out {
            result.push_error(timeout_error("compile", &outcome));
        } else {
            let findings = compile::scan(&outcome);
            result.extend_errors(findings.errors);
            for warning in findings.warnings {
                result.push_warning(warning);
            }
        }
        if !result.success {
            result.set_message(format!("`{command}` failed"));
        }
        Ok(result)
    }

    fn test_stage(&self, run: &Run) -> Result<ValidationResult> {
        let Some(command) = project::test_command(self.docs.as_ref(), &run.root)? else {
            return Ok(ValidationResult::new(stages::TEST, "no test command detected"));
        };
        let env = vec![
            ("CI".to_string(), "true".to_string()),
            ("NODE_ENV".to_string(), "test".to_string()),
        ];
        let outcome = self.run_in_image(run, stages::TEST, &command, env);
        let mut result = ValidationResult::new(stages::TEST, format!("`{command}` passed"))
            .with_metadata("command", command.to_string())
            .with_metadata("exitCode", outcome.exit_code);

        if outcome.timed_out {
            result.push_error(timeout_error("test run", &outcome));
            result.set_message(format!("`{command}` timed out"));
            return Ok(result);
        }

        let mut counts = test_output::interpret(&outcome.stdout);
        if counts.is_empty() {
            counts = test_output::interpret(&outcome.stderr);
        }
        result.set_metadata("testCounts", serde_json::to_value(counts).unwrap_or_default());

        if counts.is_empty() {
            result.push_warning(make_warning(
                codes::TEST_COUNTS_UNKNOWN,
                "could not read test counts from the output; using the exit code",
                None,
            ));
            if !outcome.success {
                result.push_error(
                    make_error(
                        codes::TEST_COMMAND_FAILED,
                        format!("`{command}` exited with code {}", outcome.exit_code),
                        Severity::Error,
                    )
                    .with_context("output", outcome.tail(MAX_SURFACED_STDERR_LINES)),
                );
            }
        } else {
            result.set_message(format!(
                "{} passed, {} failed, {} skipped of {}",
                counts.passed, counts.failed, counts.skipped, counts.total
            ));
            if counts.failed > 0 {
                result.push_error(
                    make_error(
                        codes::TESTS_FAILED,
                        format!("{} of {} tests failed", counts.failed, counts.total),
                        Severity::Error,
                    )
                    .with_context("output", outcome.tail(MAX_SURFACED_STDERR_LINES)),
                );
            }
        }
        Ok(result)
    }

    /// Runs `command` in a container named after the tag and `stage`.
    ///
    /// `--rm` only fires when the client sees the container exit, so a
    /// timed-out run is removed by name.
    fn run_in_image(
        &self,
        run: &Run,
        stage: &str,
        command: &ProjectCommand,
        env: Vec<(String, String)>,
    ) -> CommandResult {
        let workdir = self.config.container_workdir.clone();
        let name = container_name(&run.tag, stage);
        let options = ContainerRunOptions {
            name: Some(name.clone()),
            volumes: vec![format!("{}:{workdir}", run.root.display())],
            workdir: Some(workdir),
            env,
            user: None,
        };
        let outcome = self.runtime.run(&run.tag, &command.argv, &options);
        if outcome.timed_out {
            let removed = self.runtime.remove_container(&name);
            if removed.success {
                tracing::info!(name, "removed timed-out container");
            } else {
                tracing::warn!(name, stderr = %removed.stderr, "failed to remove timed-out container");
            }
        }
        outcome
    }
}

fn resolve_root(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Name given to the container running `stage` for the image `tag`.
#[must_use]
pub fn container_name(tag: &str, stage: &str) -> String {
    format!("{tag}-{stage}")
}

/// Per-tag directory holding the generated build script.
#[must_use]
pub fn scratch_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(APP_NAME).join(tag)
}

fn timeout_error(what: &str, outcome: &CommandResult) -> devproof_common::types::ValidationError {
    make_error(
        codes::COMMAND_TIMEOUT,
        format!("{what} did not finish in time"),
        Severity::Error,
    )
    .with_context("output", outcome.tail(MAX_SURFACED_STDERR_LINES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use devproof_runtime::fakes::ScriptedRunner;

    fn pipeline(runner: &Arc<ScriptedRunner>) -> ContainerPipeline {
        ContainerPipeline::with_parts(
            ContainerRuntime::new(Arc::clone(runner)),
            FsDocuments,
            ValidatorConfig::default(),
        )
    }

    fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
        dir
    }

    #[test]
    fn image_only_project_generates_script() {
        let dir = project(&[(".devcontainer/devcontainer.json", r#"{ "image": "alpine:3.20" }"#)]);
        let runner = Arc::new(ScriptedRunner::new());
        let pipeline = pipeline(&runner);
        let report = pipeline.validate(dir.path());
        assert!(report.success(), "{report:#?}");

        let tag = ContainerPipeline::image_tag(dir.path());
        let script = std::fs::read_to_string(scratch_dir(&tag).join(GENERATED_SCRIPT)).unwrap();
        assert_eq!(script, "FROM alpine:3.20\nWORKDIR /workspace\n");
        assert_eq!(report.result("build").unwrap().metadata["generatedDockerfile"], true);
        pipeline.cleanup(&tag);
        assert!(!scratch_dir(&tag).exists());
    }

    #[test]
    fn missing_config_is_critical() {
        let dir = project(&[]);
        let runner = Arc::new(ScriptedRunner::new());
        let report = pipeline(&runner).validate(dir.path());
        assert_eq!(report.stage_names(), vec!["config"]);
        assert!(report.results[0].has_error_code(codes::CONFIG_NOT_FOUND));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn malformed_config_becomes_stage_exception() {
        let dir = project(&[(".devcontainer/devcontainer.json", "{ \"image\": ")]);
        let runner = Arc::new(ScriptedRunner::new());
        let report = pipeline(&runner).validate(dir.path());
        assert_eq!(report.results.len(), 1);
        assert!(report.results[0].has_error_code(codes::STAGE_EXCEPTION));
        assert!(report.results[0].has_critical());
    }

    #[test]
    fn config_comments_are_tolerated() {
        let dir = project(&[(
            ".devcontainer/devcontainer.json",
            "{\n  // base image\n  \"image\": \"alpine\"\n}",
        )]);
        let runner = Arc::new(ScriptedRunner::new());
        let report = pipeline(&runner).validate(dir.path());
        assert!(report.result("config").unwrap().success);
    }
}
