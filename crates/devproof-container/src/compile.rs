//! Classification of compiler output.

use devproof_common::aggregate::{make_error, make_warning};
use devproof_common::codes;
use devproof_common::constants::MAX_SURFACED_STDERR_LINES;
use devproof_common::types::{Severity, ValidationError, ValidationWarning};
use devproof_runtime::CommandResult;

/// Diagnostics recovered from a compile run.
#[derive(Debug, Default)]
pub struct CompileFindings {
    /// Error diagnostics and surfaced stderr lines.
    pub errors: Vec<ValidationError>,
    /// Warning diagnostics.
    pub warnings: Vec<ValidationWarning>,
}

/// Kind of a single output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Contains `error:` or `error `.
    Error,
    /// Contains `warning:` or `warn:`.
    Warning,
    /// Anything else.
    Other,
}

/// Classifies one line, case-insensitively. Errors win over warnings.
#[must_use]
pub fn classify(line: &str) -> LineKind {
    let lower = line.to_lowercase();
    if lower.contains("error:") || lower.contains("error ") {
        LineKind::Error
    } else if lower.contains("warning:") || lower.contains("warn:") {
        LineKind::Warning
    } else {
        LineKind::Other
    }
}

/// Scans both output streams of a finished compile run.
///
/// On a non-zero exit, stderr lines not already reported as errors are
/// surfaced too (at most [`MAX_SURFACED_STDERR_LINES`]); when there is
/// nothing to surface a single summary error is added instead.
#[must_use]
pub fn scan(result: &CommandResult) -> CompileFindings {
    let mut findings = CompileFindings::default();
    for line in result.stdout.lines().chain(result.stderr.lines()) {
        let line = line.trim();
        match classify(line) {
            LineKind::Error => findings
                .errors
                .push(make_error(codes::COMPILE_ERROR, line, Severity::Error)),
            LineKind::Warning => findings
                .warnings
                .push(make_warning(codes::COMPILE_WARNING, line, None)),
            LineKind::Other => {}
        }
    }

    if !result.success {
        let surfaced: Vec<&str> = result
            .stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && classify(l) != LineKind::Error)
            .take(MAX_SURFACED_STDERR_LINES)
            .collect();
        if surfaced.is_empty() && findings.errors.is_empty() {
            findings.errors.push(make_error(
                codes::COMPILE_FAILED,
                format!("compile command exited with code {}", result.exit_code),
                Severity::Error,
            ));
        }
        findings.errors.extend(
            surfaced
                .into_iter()
                .map(|line| make_error(codes::COMPILE_FAILED, line, Severity::Error)),
        );
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_lines() {
        assert_eq!(classify("src/main.rs:3:5: error: expected `;`"), LineKind::Error);
        assert_eq!(classify("ERROR in ./src/index.ts"), LineKind::Error);
        assert_eq!(classify("npm WARN: deprecated"), LineKind::Warning);
        assert_eq!(classify("warning: unused variable"), LineKind::Warning);
        assert_eq!(classify("Compiled with 0 errors"), LineKind::Other);
    }

    #[test]
    fn clean_run_has_no_findings() {
        let findings = scan(&CommandResult::ok("Compiling app v0.1.0\nFinished dev"));
        assert!(findings.errors.is_empty());
        assert!(findings.warnings.is_empty());
    }

    #[test]
    fn warnings_alone_do_not_fail() {
        let findings = scan(&CommandResult::from_output(0, "", "warning: unused import"));
        assert!(findings.errors.is_empty());
        assert_eq!(findings.warnings.len(), 1);
    }

    #[test]
    fn failure_surfaces_stderr_without_duplicates() {
        let result = CommandResult::from_output(2, "", "error: cannot find module\nmake: *** [all] Stop.");
        let findings = scan(&result);
        assert_eq!(findings.errors.len(), 2);
        assert_eq!(findings.errors[0].code, codes::COMPILE_ERROR);
        assert_eq!(findings.errors[1].code, codes::COMPILE_FAILED);
        assert_eq!(findings.errors[1].message, "make: *** [all] Stop.");
    }

    #[test]
    fn silent_failure_gets_summary() {
        let findings = scan(&CommandResult::from_output(1, "", ""));
        assert_eq!(findings.errors.len(), 1);
        assert!(findings.errors[0].message.contains("code 1"));
    }

    #[test]
    fn surfaced_lines_are_capped() {
        let stderr: String = (0..50).map(|i| format!("line {i}\n")).collect();
        let findings = scan(&CommandResult::from_output(1, "", &stderr));
        assert_eq!(findings.errors.len(), MAX_SURFACED_STDERR_LINES);
    }
}
