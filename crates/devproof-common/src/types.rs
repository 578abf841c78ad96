//! Result model shared by both validation pipelines.
//!
//! Every stage produces exactly one [`ValidationResult`]. Results are folded
//! into a [`ValidationReport`] by [`crate::aggregate`].

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A concrete defect.
    Error,
    /// A defect that invalidates every downstream stage.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Position of a finding inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Document the finding refers to.
    pub file: PathBuf,
    /// One-based line number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// One-based column number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Location {
    /// Location covering a whole file.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: path.into(),
            line: None,
            column: None,
        }
    }

    /// Location pointing at a line of a file.
    #[must_use]
    pub fn line(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: path.into(),
            line: Some(line),
            column: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        Ok(())
    }
}

/// A defect found by a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Stable symbolic identifier (see [`crate::codes`]).
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Error tier.
    pub severity: Severity,
    /// Where the defect was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Free-form structured details.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl ValidationError {
    /// Attaches a location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Adds one context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.context.insert(key.into(), value.into());
        self
    }

    /// Whether this error invalidates downstream stages.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// An advisory finding. Never affects success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    /// Stable symbolic identifier (see [`crate::codes`]).
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Suggested fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Where the finding was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ValidationWarning {
    /// Attaches a location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// Outcome of a single stage.
///
/// `success` is kept equal to `errors.is_empty()` by every constructor and
/// mutator on this type; code that edits `errors` directly must call
/// [`ValidationResult::refresh`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Stable stage name.
    pub stage: String,
    /// `true` iff `errors` is empty.
    pub success: bool,
    /// One-line summary of the stage outcome.
    pub message: String,
    /// Defects found.
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    /// Advisory findings.
    #[serde(default)]
    pub warnings: Vec<ValidationWarning>,
    /// Stage-specific structured data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// When the stage finished.
    pub timestamp: DateTime<Utc>,
}

impl ValidationResult {
    /// Creates a passing result with no findings.
    #[must_use]
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            success: true,
            message: message.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            metadata: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Records an error, marking the result failed.
    pub fn push_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.refresh();
    }

    /// Records several errors.
    pub fn extend_errors(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
        self.refresh();
    }

    /// Records a warning. Success is unaffected.
    pub fn push_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Stores one metadata entry, replacing any previous value.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let _ = self.metadata.insert(key.into(), value.into());
    }

    /// Builder form of [`ValidationResult::set_metadata`].
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_metadata(key, value);
        self
    }

    /// Replaces the summary message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Re-derives `success` from `errors`.
    pub fn refresh(&mut self) {
        self.success = self.errors.is_empty();
    }

    /// Whether any recorded error is critical.
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.errors.iter().any(ValidationError::is_critical)
    }

    /// Whether `success` agrees with `errors`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.success == self.errors.is_empty()
    }

    /// Whether any error carries `code`.
    #[must_use]
    pub fn has_error_code(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Whether any warning carries `code`.
    #[must_use]
    pub fn has_warning_code(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// Summary counts of a report. Always an exact fold over its results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Number of stage results.
    pub total_checks: usize,
    /// Results with `success == true`.
    pub passed: usize,
    /// Results with `success == false`.
    pub failed: usize,
    /// Sum of per-result warning counts.
    pub warnings: usize,
}

/// Full outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Name of the pipeline that produced the report.
    pub pipeline_name: String,
    /// When the run started.
    pub timestamp: DateTime<Utc>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// One result per executed stage, in execution order.
    pub results: Vec<ValidationResult>,
    /// Folded counts.
    pub summary: ReportSummary,
    /// Advisory follow-ups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    /// Whether every stage passed.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.summary.failed == 0
    }

    /// Finds the result of a stage by name.
    #[must_use]
    pub fn result(&self, stage: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.stage == stage)
    }

    /// Stage names in report order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.stage.as_str()).collect()
    }
}

/// Test counts recovered from captured output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCounts {
    /// Tests executed.
    pub total: u64,
    /// Tests that passed.
    pub passed: u64,
    /// Tests that failed.
    pub failed: u64,
    /// Tests skipped, pending, or ignored.
    pub skipped: u64,
}

impl TestCounts {
    /// Whether nothing was recovered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0 && self.passed == 0 && self.failed == 0 && self.skipped == 0
    }
}

/// Returns the path as a display string relative to `root` when possible.
#[must_use]
pub fn display_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
}
