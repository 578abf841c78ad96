//! Checks whose inputs span more than one editor document.

use devproof_common::aggregate::{make_error, make_warning};
use devproof_common::codes;
use devproof_common::constants::stages;
use devproof_common::documents::DocumentSource;
use devproof_common::error::Result;
use devproof_common::types::{Severity, ValidationResult};
use serde_json::Value;

use crate::document::{EditorPaths, read_jsonc};
use crate::{launch, settings, tasks};

/// Formatter toggles that fight over the same files when both are on.
const CONFLICTING_FORMATTERS: &[(&str, &str)] = &[("eslint.format.enable", "prettier.enable")];

/// Reads whichever documents exist and checks the references between them.
///
/// The task labels are taken from the task document as-is, whether or not
/// the task stage itself passed.
///
/// # Errors
///
/// Returns an error if an existing document cannot be read or parsed.
pub fn validate(docs: &dyn DocumentSource, paths: &EditorPaths) -> Result<ValidationResult> {
    let launch_doc = read_optional(docs, &paths.launch)?;
    let tasks_doc = read_optional(docs, &paths.tasks)?;
    let settings_doc = read_optional(docs, &paths.settings)?;

    let mut result = check(launch_doc.as_ref(), tasks_doc.as_ref(), settings_doc.as_ref());
    for error in &mut result.errors {
        error.location = Some(paths.location(&paths.launch));
    }
    for warning in &mut result.warnings {
        warning.location = Some(paths.location(&paths.settings));
    }
    Ok(result)
}

fn read_optional(docs: &dyn DocumentSource, path: &std::path::Path) -> Result<Option<Value>> {
    if docs.exists(path) {
        read_jsonc(docs, path).map(Some)
    } else {
        Ok(None)
    }
}

/// Checks the parsed documents against each other.
#[must_use]
pub fn check(
    launch_doc: Option<&Value>,
    tasks_doc: Option<&Value>,
    settings_doc: Option<&Value>,
) -> ValidationResult {
    let mut result = ValidationResult::new(stages::CROSS_VALIDATION, "document references are consistent");

    let labels = tasks_doc.map(tasks::labels).unwrap_or_default();
    let references = launch_doc.map(launch::prelaunch_tasks).unwrap_or_default();
    for (configuration, task) in &references {
        if !labels.contains(task) {
            result.push_error(
                make_error(
                    codes::MISSING_PRELAUNCH_TASK,
                    format!(
                        "launch configuration \"{configuration}\" runs preLaunchTask \"{task}\", but no task is labeled \"{task}\""
                    ),
                    Severity::Error,
                )
                .with_context("configuration", configuration.as_str())
                .with_context("task", task.as_str()),
            );
        }
    }

    if let Some(doc) = settings_doc {
        for (first, second) in CONFLICTING_FORMATTERS {
            if settings::both_enabled(doc, first, second) {
                result.push_warning(make_warning(
                    codes::CONFLICTING_FORMATTERS,
                    format!("both \"{first}\" and \"{second}\" are enabled"),
                    Some("Enable a single formatter and set editor.defaultFormatter"),
                ));
            }
        }
    }

    result.set_metadata("preLaunchReferences", references.len());
    if !result.success {
        result.set_message(format!("{} unresolved preLaunchTask reference(s)", result.errors.len()));
    }
    result
}
