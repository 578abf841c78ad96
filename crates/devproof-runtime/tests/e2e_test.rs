//! Integration tests for the runtime adapter.
//!
//! Exercises the adapter through the public API against a scripted runner
//! and, where a POSIX shell is enough, against real processes.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use devproof_runtime::fakes::ScriptedRunner;
use devproof_runtime::process::ProcessRunner;
use devproof_runtime::tag::derive_image_tag;
use devproof_runtime::{BuildRequest, CommandResult, CommandRunner, ContainerRunOptions, ContainerRuntime, RunOptions};

// ── Build / run ──────────────────────────────────────────────────────

#[test]
fn build_then_run_against_derived_tag() {
    let project = tempfile::tempdir().unwrap();
    let tag = derive_image_tag(project.path());
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("build", CommandResult::ok("Successfully built"))
            .respond("run", CommandResult::ok("compiled")),
    );
    let runtime = ContainerRuntime::new(Arc::clone(&runner));

    let request = BuildRequest {
        dockerfile: project.path().join("Dockerfile"),
        tag: tag.clone(),
        context: project.path().to_path_buf(),
        build_args: Vec::new(),
    };
    assert!(runtime.build(&request).success);

    let options = ContainerRunOptions {
        workdir: Some("/workspace".into()),
        ..ContainerRunOptions::default()
    };
    let ran = runtime.run(&tag, &["make".to_string()], &options);
    assert_eq!(ran.stdout, "compiled");

    let run_call = &runner.calls_to("run")[0];
    assert!(run_call.contains(&tag));
    assert_eq!(run_call.last().map(String::as_str), Some("make"));
}

#[test]
fn failed_build_is_reported_not_raised() {
    let runner = ScriptedRunner::new().respond("build", CommandResult::from_output(1, "", "step 3 failed"));
    let runtime = ContainerRuntime::new(runner);
    let result = runtime.build(&BuildRequest {
        dockerfile: PathBuf::from("Dockerfile"),
        tag: "devproof-failing-00000000".into(),
        context: PathBuf::from("."),
        build_args: Vec::new(),
    });
    assert!(!result.success);
    assert_eq!(result.exit_code, 1);
    assert_eq!(result.stderr, "step 3 failed");
}

#[test]
fn concurrent_builds_of_one_tag_both_complete() {
    let runner = Arc::new(ScriptedRunner::new());
    let runtime = ContainerRuntime::new(Arc::clone(&runner));
    let request = BuildRequest {
        dockerfile: PathBuf::from("Dockerfile"),
        tag: "devproof-concurrent-00000000".into(),
        context: PathBuf::from("."),
        build_args: Vec::new(),
    };
    std::thread::scope(|s| {
        let _ = s.spawn(|| runtime.build(&request));
        let _ = s.spawn(|| runtime.build(&request));
    });
    assert_eq!(runner.calls_to("build").len(), 2);
}

// ── Probing ──────────────────────────────────────────────────────────

#[test]
fn unavailable_runtime_probe_fails_cleanly() {
    let runtime = ContainerRuntime::new(ScriptedRunner::unavailable());
    let result = runtime.probe();
    assert!(!result.success);
    assert!(!result.timed_out);
}

#[test]
fn removing_twice_never_panics() {
    let runner = ScriptedRunner::new()
        .respond("rmi", CommandResult::ok("Deleted"))
        .respond("rmi", CommandResult::from_output(1, "", "No such image"));
    let runtime = ContainerRuntime::new(runner);
    assert!(runtime.remove_image("devproof-x-1").success);
    assert!(!runtime.remove_image("devproof-x-1").success);
}

// ── Real processes ───────────────────────────────────────────────────

#[test]
fn process_runner_honors_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ProcessRunner::new("sh");
    let options = RunOptions {
        cwd: Some(dir.path().to_path_buf()),
        timeout: Some(Duration::from_secs(10)),
        ..RunOptions::default()
    };
    let result = runner.run(&["-c".to_string(), "pwd".to_string()], &options);
    assert!(result.success);
    let reported = std::fs::canonicalize(&result.stdout).unwrap();
    assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
}

#[test]
fn script_inspection_through_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Dockerfile");
    std::fs::write(&path, "FROM golang:1.22\nWORKDIR /go/src/app\nEXPOSE 8080\n").unwrap();
    let runtime = ContainerRuntime::new(ScriptedRunner::new());
    let info = runtime.inspect_script(&path).unwrap();
    assert_eq!(info.base_image.as_deref(), Some("golang:1.22"));
    assert_eq!(info.workdir.as_deref(), Some("/go/src/app"));
    assert_eq!(info.exposed_ports, vec![8080]);
}
