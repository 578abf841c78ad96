//! The editor configuration pipeline.
//!
//! Every stage reads its own documents and none gates another, so all of
//! them run concurrently on scoped threads. Results are collected in a
//! fixed order regardless of which stage finishes first.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use devproof_common::aggregate::{build_report, exception_result};
use devproof_common::config::ValidatorConfig;
use devproof_common::constants::{EDITOR_PIPELINE, stages};
use devproof_common::documents::{DocumentSource, FsDocuments};
use devproof_common::error::Result;
use devproof_common::types::{ValidationReport, ValidationResult};

use crate::document::EditorPaths;
use crate::{cross, extensions, launch, settings, tasks};

type StageFn = fn(&dyn DocumentSource, &EditorPaths) -> Result<ValidationResult>;

/// Stages in report order.
const STAGES: &[(&str, StageFn)] = &[
    (stages::LAUNCH, launch::validate),
    (stages::TASKS, tasks::validate),
    (stages::SETTINGS, settings::validate),
    (stages::CROSS_VALIDATION, cross::validate),
    (stages::EXTENSIONS, extensions::validate),
];

/// Validates the editor documents of a project.
pub struct EditorConfigPipeline {
    docs: Box<dyn DocumentSource>,
    editor_dir: PathBuf,
}

impl EditorConfigPipeline {
    /// Creates a pipeline reading from the local file system.
    #[must_use]
    pub fn new(config: &ValidatorConfig) -> Self {
        Self::with_documents(FsDocuments, config)
    }

    /// Creates a pipeline reading through `docs`.
    #[must_use]
    pub fn with_documents(docs: impl DocumentSource + 'static, config: &ValidatorConfig) -> Self {
        Self {
            docs: Box::new(docs),
            editor_dir: config.editor_dir.clone(),
        }
    }

    /// Runs every stage against the project at `project_root`.
    ///
    /// Never fails: unreadable or malformed documents become a critical
    /// error on the stage that read them.
    pub fn validate(&self, project_root: &Path) -> ValidationReport {
        let started = Utc::now();
        let clock = Instant::now();
        let paths = EditorPaths::new(project_root, &self.editor_dir);
        tracing::info!(project = %project_root.display(), "validating editor configuration");

        let docs: &dyn DocumentSource = self.docs.as_ref();
        let paths = &paths;
        let results: Vec<ValidationResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = STAGES
                .iter()
                .map(|&(name, stage)| (name, scope.spawn(move || run_stage(name, stage, docs, paths))))
                .collect();
            handles
                .into_iter()
                .map(|(name, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| exception_result(name, &"stage panicked"))
                })
                .collect()
        });

        let report = build_report(EDITOR_PIPELINE, started, clock.elapsed(), results);
        tracing::info!(
            passed = report.summary.passed,
            failed = report.summary.failed,
            warnings = report.summary.warnings,
            "editor configuration validated"
        );
        report
    }
}

fn run_stage(name: &str, stage: StageFn, docs: &dyn DocumentSource, paths: &EditorPaths) -> ValidationResult {
    tracing::debug!(stage = name, "stage started");
    let result = stage(docs, paths).unwrap_or_else(|e| {
        tracing::warn!(stage = name, error = %e, "stage aborted");
        exception_result(name, &e)
    });
    tracing::info!(
        stage = name,
        success = result.success,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "stage finished"
    );
    result
}
