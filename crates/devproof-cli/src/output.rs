//! Formatted output helpers for CLI commands.
//!
//! Reports render as one line per stage with a pass/fail glyph, followed by
//! the stage's findings, a summary line, and the recommendations.

use std::io::{self, Write};

use devproof_common::types::{Location, Severity, ValidationReport, ValidationResult};

const PASS: &str = "✓";
const FAIL: &str = "✗";

/// Writes `reports` to `out`, as JSON or as the human listing.
///
/// A single report is written as an object, several as an array.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn emit(out: &mut impl Write, reports: &[ValidationReport], json: bool) -> anyhow::Result<()> {
    if json {
        match reports {
            [report] => serde_json::to_writer_pretty(&mut *out, report)?,
            _ => serde_json::to_writer_pretty(&mut *out, reports)?,
        }
        writeln!(out)?;
        return Ok(());
    }
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        render(out, report)?;
    }
    Ok(())
}

/// Writes the confirmation of a cleanup.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn cleaned(out: &mut impl Write, tag: &str) -> io::Result<()> {
    writeln!(out, "Cleaned up {tag}")
}

/// Writes one report in the human-readable layout.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn render(out: &mut impl Write, report: &ValidationReport) -> io::Result<()> {
    writeln!(out, "{} ({} ms)", report.pipeline_name, report.duration_ms)?;
    for result in &report.results {
        render_result(out, result)?;
    }

    let summary = &report.summary;
    writeln!(
        out,
        "\n{} checks: {} passed, {} failed, {} warning(s)",
        summary.total_checks, summary.passed, summary.failed, summary.warnings
    )?;
    if !report.recommendations.is_empty() {
        writeln!(out, "Recommendations:")?;
        for recommendation in &report.recommendations {
            writeln!(out, "  - {recommendation}")?;
        }
    }
    Ok(())
}

fn render_result(out: &mut impl Write, result: &ValidationResult) -> io::Result<()> {
    let glyph = if result.success { PASS } else { FAIL };
    writeln!(out, "{glyph} {}: {}", result.stage, result.message)?;
    for error in &result.errors {
        let label = match error.severity {
            Severity::Critical => "critical",
            Severity::Error => "error",
        };
        writeln!(
            out,
            "    {label} [{}] {}{}",
            error.code,
            error.message,
            suffix(error.location.as_ref())
        )?;
    }
    for warning in &result.warnings {
        writeln!(
            out,
            "    warning [{}] {}{}",
            warning.code,
            warning.message,
            suffix(warning.location.as_ref())
        )?;
        if let Some(suggestion) = &warning.suggestion {
            writeln!(out, "      hint: {suggestion}")?;
        }
    }
    Ok(())
}

fn suffix(location: Option<&Location>) -> String {
    location.map_or_else(String::new, |l| format!(" ({l})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;
    use devproof_common::aggregate::{build_report, make_error, make_warning};

    fn report() -> ValidationReport {
        let config = ValidationResult::new("config", "devcontainer.json is valid");
        let mut build = ValidationResult::new("build", "failed to build image devproof-app-1a2b3c4d");
        build.push_error(
            make_error("BUILD_FAILED", "image build exited with code 1", Severity::Error)
                .at(Location::line(".devcontainer/Dockerfile", 3)),
        );
        build.push_warning(make_warning("ROOT_USER", "the image runs as root", Some("Add a non-root USER")));
        build_report("container", Utc::now(), Duration::from_millis(42), vec![config, build])
    }

    fn rendered(report: &ValidationReport) -> String {
        let mut out = Vec::new();
        render(&mut out, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn render_marks_each_stage() {
        let text = rendered(&report());
        assert!(text.starts_with("container (42 ms)\n"));
        assert!(text.contains("✓ config: devcontainer.json is valid"));
        assert!(text.contains("✗ build: failed to build image"));
    }

    #[test]
    fn render_lists_findings_with_locations() {
        let text = rendered(&report());
        assert!(text.contains("error [BUILD_FAILED] image build exited with code 1 (.devcontainer/Dockerfile:3)"));
        assert!(text.contains("warning [ROOT_USER] the image runs as root"));
        assert!(text.contains("hint: Add a non-root USER"));
    }

    #[test]
    fn render_includes_summary_and_recommendations() {
        let text = rendered(&report());
        assert!(text.contains("2 checks: 1 passed, 1 failed, 1 warning(s)"));
        assert!(text.contains("Recommendations:"));
        assert!(text.contains("Review 1 warning(s)"));
    }

    #[test]
    fn json_single_report_is_an_object() {
        let mut out = Vec::new();
        emit(&mut out, &[report()], true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["pipelineName"], "container");
        assert_eq!(value["summary"]["failed"], 1);
    }

    #[test]
    fn json_several_reports_are_an_array() {
        let mut out = Vec::new();
        emit(&mut out, &[report(), report()], true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
