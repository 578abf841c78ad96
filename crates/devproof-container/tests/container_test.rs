//! Integration tests for the container pipeline.
//!
//! Projects are generated on disk; the runtime is replaced by a scripted
//! runner so no container engine is needed.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use devproof_common::codes;
use devproof_common::config::ValidatorConfig;
use devproof_common::documents::FsDocuments;
use devproof_container::ContainerPipeline;
use devproof_runtime::fakes::ScriptedRunner;
use devproof_runtime::{CommandResult, ContainerRuntime};
use tempfile::TempDir;

const SCRIPT_CONFIG: &str = r#"{
    // built from a local script
    "name": "web",
    "build": { "dockerfile": "Dockerfile", "args": { "NODE_VERSION": "20" } },
    "forwardPorts": [3000]
}"#;

const SCRIPT: &str = "FROM node:20\nWORKDIR /workspace\nUSER node\nEXPOSE 3000\n";

const MANIFEST: &str = r#"{ "scripts": { "build": "tsc", "test": "jest" } }"#;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    dir
}

fn node_project() -> TempDir {
    project(&[
        (".devcontainer/devcontainer.json", SCRIPT_CONFIG),
        (".devcontainer/Dockerfile", SCRIPT),
        ("package.json", MANIFEST),
    ])
}

fn pipeline(runner: &Arc<ScriptedRunner>) -> ContainerPipeline {
    ContainerPipeline::with_parts(
        ContainerRuntime::new(Arc::clone(runner)),
        FsDocuments,
        ValidatorConfig::default(),
    )
}

#[test]
fn healthy_project_passes_every_stage() {
    let dir = node_project();
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("--version", CommandResult::ok("Docker version 27.0.3, build 7d4bcd8"))
            .respond("run", CommandResult::ok("compiled"))
            .respond("run", CommandResult::ok("PASS src/app.test.ts\nTests:       3 passed, 3 total")),
    );
    let report = pipeline(&runner).validate(dir.path());

    assert!(report.success(), "{report:#?}");
    assert_eq!(
        report.stage_names(),
        vec!["config", "runtime", "dockerfile", "build", "compile", "test"]
    );
    assert_eq!(report.summary.passed, 6);
    assert_eq!(
        report.result("runtime").unwrap().metadata["version"],
        "Docker version 27.0.3, build 7d4bcd8"
    );
    let counts = &report.result("test").unwrap().metadata["testCounts"];
    assert_eq!(counts["passed"], 3);
    assert_eq!(counts["failed"], 0);

    let builds = runner.calls_to("build");
    assert_eq!(builds.len(), 1);
    assert!(builds[0].contains(&"NODE_VERSION=20".to_string()));
    assert!(builds[0].contains(&ContainerPipeline::image_tag(dir.path())));

    let runs = runner.calls_to("run");
    assert_eq!(runs.len(), 2);
    assert!(runs[0].ends_with(&["npm".to_string(), "run".to_string(), "build".to_string()]));
    assert!(runs[1].contains(&"CI=true".to_string()));
    assert!(runs[1].contains(&"NODE_ENV=test".to_string()));
    assert!(runs[1].iter().any(|arg| arg.ends_with(":/workspace")));
}

#[test]
fn missing_image_source_stops_after_config() {
    let dir = project(&[(".devcontainer/devcontainer.json", r#"{ "name": "bare" }"#)]);
    let runner = Arc::new(ScriptedRunner::new());
    let report = pipeline(&runner).validate(dir.path());

    assert_eq!(report.stage_names(), vec!["config"]);
    let config = &report.results[0];
    assert!(config.has_error_code(codes::MISSING_IMAGE_SOURCE));
    assert!(config.has_critical());
    assert!(runner.calls().is_empty());
    assert!(!report.success());
}

#[test]
fn unavailable_runtime_skips_build_and_later_stages() {
    let dir = node_project();
    let runner = Arc::new(ScriptedRunner::unavailable());
    let report = pipeline(&runner).validate(dir.path());

    assert_eq!(report.stage_names(), vec!["config", "runtime", "dockerfile"]);
    let runtime = report.result("runtime").unwrap();
    assert!(runtime.has_error_code(codes::RUNTIME_UNAVAILABLE));
    assert!(runtime.has_critical());
    assert!(report.result("dockerfile").unwrap().success);
}

#[test]
fn missing_script_is_reported_but_build_still_attempted() {
    let dir = project(&[(".devcontainer/devcontainer.json", SCRIPT_CONFIG)]);
    let runner = Arc::new(ScriptedRunner::new().respond("build", CommandResult::from_output(1, "", "unable to prepare context")));
    let report = pipeline(&runner).validate(dir.path());

    assert!(report.result("dockerfile").unwrap().has_error_code(codes::DOCKERFILE_NOT_FOUND));
    let build = report.result("build").unwrap();
    assert!(build.has_error_code(codes::BUILD_FAILED));
    assert!(report.result("compile").is_none());
    assert!(report.result("test").is_none());
}

#[test]
fn compile_failure_skips_tests() {
    let dir = node_project();
    let runner = Arc::new(
        ScriptedRunner::new().respond(
            "run",
            CommandResult::from_output(2, "", "src/app.ts(3,7): error TS2322: Type 'string' is not assignable"),
        ),
    );
    let report = pipeline(&runner).validate(dir.path());

    let compile = report.result("compile").unwrap();
    assert!(compile.has_error_code(codes::COMPILE_ERROR));
    assert!(report.result("test").is_none());
    assert_eq!(runner.calls_to("run").len(), 1);
}

#[test]
fn failing_tests_are_counted() {
    let dir = node_project();
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("run", CommandResult::ok("compiled"))
            .respond(
                "run",
                CommandResult::from_output(1, "Tests:       1 failed, 2 passed, 3 total", ""),
            ),
    );
    let report = pipeline(&runner).validate(dir.path());

    let test = report.result("test").unwrap();
    assert!(test.has_error_code(codes::TESTS_FAILED));
    assert_eq!(test.metadata["testCounts"]["failed"], 1);
    assert_eq!(test.metadata["testCounts"]["total"], 3);
    assert_eq!(report.summary.failed, 1);
}

#[test]
fn counts_on_stderr_are_used() {
    let dir = project(&[
        (".devcontainer/devcontainer.json", r#"{ "image": "python:3.12" }"#),
        ("pyproject.toml", "[project]\nname = \"app\"\n"),
    ]);
    let runner = Arc::new(
        ScriptedRunner::new().respond("run", CommandResult::from_output(0, "", "===== 4 passed, 1 skipped in 0.10s =====")),
    );
    let report = pipeline(&runner).validate(dir.path());

    let test = report.result("test").unwrap();
    assert!(test.success);
    assert_eq!(test.metadata["testCounts"]["passed"], 4);
    assert_eq!(test.metadata["testCounts"]["skipped"], 1);
    assert_eq!(report.result("build").unwrap().metadata["generatedDockerfile"], true);
}

#[test]
fn unreadable_counts_fall_back_to_exit_code() {
    let dir = project(&[
        (".devcontainer/devcontainer.json", r#"{ "image": "gcc:14" }"#),
        ("Makefile", "all:\n\tcc main.c\ntest: all\n\t./check\n"),
    ]);
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("run", CommandResult::ok(""))
            .respond("run", CommandResult::from_output(2, "checks broke", "")),
    );
    let report = pipeline(&runner).validate(dir.path());

    let test = report.result("test").unwrap();
    assert!(test.has_error_code(codes::TEST_COMMAND_FAILED));
    assert!(test.has_warning_code(codes::TEST_COUNTS_UNKNOWN));
}

#[test]
fn timed_out_tests_are_reported() {
    let dir = node_project();
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("run", CommandResult::ok("compiled"))
            .respond("run", CommandResult::timeout(Duration::from_secs(900), "", "")),
    );
    let report = pipeline(&runner).validate(dir.path());

    let test = report.result("test").unwrap();
    assert!(test.has_error_code(codes::COMMAND_TIMEOUT));
    assert!(!test.has_error_code(codes::TEST_COMMAND_FAILED));
}

#[test]
fn timed_out_container_is_removed_by_name() {
    let dir = node_project();
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("run", CommandResult::ok("compiled"))
            .respond("run", CommandResult::timeout(Duration::from_secs(900), "", "")),
    );
    let _ = pipeline(&runner).validate(dir.path());

    let name = format!("{}-test", ContainerPipeline::image_tag(dir.path()));
    let runs = runner.calls_to("run");
    assert!(runs[1].windows(2).any(|pair| pair[0] == "--name" && pair[1] == name));
    assert_eq!(runner.calls_to("rm"), vec![vec!["rm".to_string(), "-f".to_string(), name]]);
}

#[test]
fn nonzero_exit_with_all_tests_passing_is_a_pass() {
    let dir = node_project();
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("run", CommandResult::ok("compiled"))
            .respond(
                "run",
                CommandResult::from_output(1, "Tests: 0 failed, 5 passed, 5 total", ""),
            ),
    );
    let report = pipeline(&runner).validate(dir.path());

    let test = report.result("test").unwrap();
    assert!(test.success);
    assert!(!test.has_error_code(codes::TEST_COMMAND_FAILED));
    assert!(!test.has_error_code(codes::TESTS_FAILED));
    assert_eq!(test.metadata["testCounts"]["passed"], 5);
}

#[test]
fn cleanup_is_idempotent() {
    let dir = node_project();
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("image", CommandResult::ok("[{}]"))
            .respond("image", CommandResult::from_output(1, "", "No such image")),
    );
    let pipeline = pipeline(&runner);
    let tag = ContainerPipeline::image_tag(dir.path());

    pipeline.cleanup(&tag);
    pipeline.cleanup(&tag);

    let removals = runner.calls_to("rmi");
    assert_eq!(removals.len(), 1);
    assert_eq!(removals[0], vec!["rmi".to_string(), "-f".to_string(), tag]);
}

#[test]
fn repeated_runs_are_stable() {
    let dir = node_project();
    let runner = Arc::new(ScriptedRunner::new());
    let pipeline = pipeline(&runner);
    let first = pipeline.validate(dir.path());
    let second = pipeline.validate(dir.path());
    assert_eq!(first.stage_names(), second.stage_names());
    assert_eq!(first.summary, second.summary);
}
