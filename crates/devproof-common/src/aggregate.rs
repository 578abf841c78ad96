//! Pure constructors and folds for validation records.
//!
//! Nothing here holds state: pipelines call these functions to build
//! uniform records and to fold their stage results into a report.

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Map;

use crate::codes;
use crate::constants::stages;
use crate::types::{
    ReportSummary, Severity, ValidationError, ValidationReport, ValidationResult,
    ValidationWarning,
};

/// Builds an error record.
#[must_use]
pub fn make_error(code: &str, message: impl Into<String>, severity: Severity) -> ValidationError {
    ValidationError {
        code: code.to_string(),
        message: message.into(),
        severity,
        location: None,
        context: Map::new(),
    }
}

/// Builds a warning record.
#[must_use]
pub fn make_warning(
    code: &str,
    message: impl Into<String>,
    suggestion: Option<&str>,
) -> ValidationWarning {
    ValidationWarning {
        code: code.to_string(),
        message: message.into(),
        suggestion: suggestion.map(str::to_string),
        location: None,
    }
}

/// Builds a failed result from a list of errors.
#[must_use]
pub fn failure_result(
    stage: &str,
    message: impl Into<String>,
    errors: Vec<ValidationError>,
) -> ValidationResult {
    let mut result = ValidationResult::new(stage, message);
    result.extend_errors(errors);
    result
}

/// Converts an unexpected failure caught at a stage boundary into a result
/// carrying exactly one critical error.
#[must_use]
pub fn exception_result(stage: &str, error: &dyn Display) -> ValidationResult {
    failure_result(
        stage,
        format!("{stage} stage aborted"),
        vec![make_error(codes::STAGE_EXCEPTION, error.to_string(), Severity::Critical)],
    )
}

/// Folds results into summary counts.
#[must_use]
pub fn summarize(results: &[ValidationResult]) -> ReportSummary {
    results.iter().fold(ReportSummary::default(), |mut acc, r| {
        acc.total_checks += 1;
        if r.success {
            acc.passed += 1;
        } else {
            acc.failed += 1;
        }
        acc.warnings += r.warnings.len();
        acc
    })
}

/// Derives advisory follow-ups from the folded results.
#[must_use]
pub fn recommendations(results: &[ValidationResult]) -> Vec<String> {
    let mut out = Vec::new();
    let warnings = summarize(results).warnings;
    if warnings > 0 {
        out.push(format!("Review {warnings} warning(s) to improve the environment"));
    }
    for result in results.iter().filter(|r| !r.success) {
        if let Some(advice) = stage_advice(result) {
            out.push(advice.to_string());
        }
    }
    out
}

fn stage_advice(result: &ValidationResult) -> Option<&'static str> {
    if result.has_error_code(codes::STAGE_EXCEPTION) {
        return Some("Fix the malformed configuration document reported above and re-run");
    }
    if result.has_error_code(codes::COMMAND_TIMEOUT) {
        return Some("Raise the command timeout or reduce the work done by the build/test commands");
    }
    let advice = match result.stage.as_str() {
        stages::CONFIG => "Fix devcontainer.json: declare an image or Dockerfile and use valid forwarded ports",
        stages::RUNTIME => "Install the container runtime and make sure its daemon is running",
        stages::DOCKERFILE => "Fix the Dockerfile referenced by devcontainer.json",
        stages::BUILD => "Check the Dockerfile and build arguments; run the build manually to see the full log",
        stages::COMPILE => "Fix the compile errors shown above or adjust the project build script",
        stages::TEST => "Inspect the failing tests or the test command configured for the project",
        stages::LAUNCH => "Fix the debug configurations in launch.json",
        stages::TASKS => "Fix the task definitions in tasks.json",
        stages::SETTINGS => "Fix the value types in settings.json",
        stages::CROSS_VALIDATION => "Add the tasks referenced by preLaunchTask to tasks.json",
        stages::EXTENSIONS => "Make `recommendations` in extensions.json an array of extension ids",
        _ => return None,
    };
    Some(advice)
}

/// Folds stage results into a report.
#[must_use]
pub fn build_report(
    pipeline_name: &str,
    started: DateTime<Utc>,
    duration: Duration,
    results: Vec<ValidationResult>,
) -> ValidationReport {
    let summary = summarize(&results);
    let recommendations = recommendations(&results);
    ValidationReport {
        pipeline_name: pipeline_name.to_string(),
        timestamp: started,
        duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        results,
        summary,
        recommendations,
    }
}
