//! Task document checks.

use std::collections::HashSet;

use devproof_common::aggregate::make_error;
use devproof_common::codes;
use devproof_common::constants::{TASKS_VERSION, stages};
use devproof_common::documents::DocumentSource;
use devproof_common::error::Result;
use devproof_common::types::{Location, Severity, ValidationError, ValidationResult};
use serde_json::{Map, Value};

use crate::document::{EditorPaths, check_version, has_text, missing_document, read_jsonc, text_field};
use crate::graph::TaskGraph;

const GROUP_KINDS: &[&str] = &["build", "test", "none"];
const REVEAL: &[&str] = &["always", "silent", "never"];
const PANEL: &[&str] = &["shared", "dedicated", "new"];
const REVEAL_PROBLEMS: &[&str] = &["always", "onProblem", "never"];

/// Reads and checks the task document.
///
/// # Errors
///
/// Returns an error if the document exists but cannot be read or parsed.
pub fn validate(docs: &dyn DocumentSource, paths: &EditorPaths) -> Result<ValidationResult> {
    let location = paths.location(&paths.tasks);
    if !docs.exists(&paths.tasks) {
        return Ok(missing_document(stages::TASKS, location));
    }
    let doc = read_jsonc(docs, &paths.tasks)?;
    Ok(check(&doc, &location))
}

/// Checks a parsed task document.
#[must_use]
pub fn check(doc: &Value, location: &Location) -> ValidationResult {
    let mut result = ValidationResult::new(stages::TASKS, "task definitions are valid");
    let Some(root) = doc.as_object() else {
        result.push_error(error(codes::INVALID_TASKS, "task document must be a JSON object", location));
        result.set_message("task document is malformed");
        return result;
    };

    check_version(root, TASKS_VERSION, location, &mut result);

    let Some(tasks) = root.get("tasks").and_then(Value::as_array) else {
        result.push_error(error(codes::INVALID_TASKS, "\"tasks\" must be an array", location));
        result.set_message("task document has no task list");
        return result;
    };

    let entries: Vec<&Map<String, Value>> = tasks.iter().filter_map(Value::as_object).collect();
    if entries.len() != tasks.len() {
        result.push_error(error(
            codes::INVALID_TASKS,
            format!("{} task entr(ies) are not objects", tasks.len() - entries.len()),
            location,
        ));
    }

    let mut labels = Vec::new();
    let mut seen = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        result.extend_errors(check_entry(index, entry, location));
        if let Some(label) = text_field(entry, "label") {
            labels.push(Value::from(label));
            if !seen.insert(label) {
                result.push_error(
                    error(codes::DUPLICATE_LABEL, format!("duplicate task label \"{label}\""), location)
                        .with_context("label", label),
                );
            }
        }
    }

    result.extend_errors(check_dependencies(&entries, &seen, location));

    result.set_metadata("taskCount", tasks.len());
    result.set_metadata("labels", labels);
    if !result.success {
        result.set_message(format!("{} problem(s) in task definitions", result.errors.len()));
    }
    result
}

fn check_entry(index: usize, entry: &Map<String, Value>, location: &Location) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let label = text_field(entry, "label").map_or_else(|| format!("task #{}", index + 1), |l| format!("\"{l}\""));

    if !has_text(entry, "label") {
        errors.push(error(codes::MISSING_LABEL, format!("task #{} has no \"label\"", index + 1), location));
    }

    match text_field(entry, "type") {
        None => errors.push(error(codes::MISSING_TYPE, format!("{label} has no \"type\""), location)),
        Some("shell" | "process") if !has_command(entry) => {
            errors.push(error(codes::MISSING_COMMAND, format!("{label} needs \"command\""), location));
        }
        Some("npm") if !has_text(entry, "script") && !has_text(entry, "path") => {
            errors.push(error(
                codes::MISSING_SCRIPT,
                format!("{label} needs \"script\" or \"path\""),
                location,
            ));
        }
        Some(_) => {}
    }

    if let Some(group) = entry.get("group") {
        if let Err(message) = check_group(group) {
            errors.push(error(codes::INVALID_GROUP, format!("{label}: {message}"), location));
        }
    }

    if let Some(presentation) = entry.get("presentation") {
        errors.extend(
            check_presentation(presentation)
                .into_iter()
                .map(|message| error(codes::INVALID_PRESENTATION, format!("{label}: {message}"), location)),
        );
    }
    errors
}

/// `command` may be a string or the `{ value, quoting }` object form.
fn has_command(entry: &Map<String, Value>) -> bool {
    match entry.get("command") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Object(o)) => has_text(o, "value"),
        _ => false,
    }
}

fn check_group(group: &Value) -> std::result::Result<(), String> {
    let kind = match group {
        Value::String(kind) => kind.as_str(),
        Value::Object(o) => o
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| "group object needs a \"kind\"".to_string())?,
        _ => return Err("group must be a string or an object".to_string()),
    };
    if GROUP_KINDS.contains(&kind) {
        Ok(())
    } else {
        Err(format!("group \"{kind}\" is not one of {}", GROUP_KINDS.join(", ")))
    }
}

fn check_presentation(presentation: &Value) -> Vec<String> {
    let Some(fields) = presentation.as_object() else {
        return vec!["presentation must be an object".to_string()];
    };
    [("reveal", REVEAL), ("panel", PANEL), ("revealProblems", REVEAL_PROBLEMS)]
        .into_iter()
        .filter_map(|(key, allowed)| {
            let value = fields.get(key)?;
            match value.as_str() {
                Some(v) if allowed.contains(&v) => None,
                _ => Some(format!("presentation.{key} {value} is not one of {}", allowed.join(", "))),
            }
        })
        .collect()
}

/// `dependsOn` as a list of labels: a string, or an array of strings.
#[must_use]
pub fn depends_on(entry: &Map<String, Value>) -> Vec<&str> {
    match entry.get("dependsOn") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn check_dependencies(
    entries: &[&Map<String, Value>],
    labels: &HashSet<&str>,
    location: &Location,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut graph = TaskGraph::new();
    for entry in entries {
        let Some(label) = text_field(entry, "label") else {
            continue;
        };
        let _ = graph.add_task(label);
        for dependency in depends_on(entry) {
            if labels.contains(dependency) {
                graph.add_dependency(label, dependency);
            } else {
                errors.push(
                    error(
                        codes::MISSING_DEPENDENCY,
                        format!("task \"{label}\" depends on unknown task \"{dependency}\""),
                        location,
                    )
                    .with_context("task", label)
                    .with_context("dependency", dependency),
                );
            }
        }
    }
    for cycle in graph.cycles() {
        errors.push(
            error(
                codes::DEPENDENCY_CYCLE,
                format!("circular dependsOn chain between {}", cycle.join(", ")),
                location,
            )
            .with_context("tasks", cycle),
        );
    }
    errors
}

/// Labels declared in a task document, ignoring malformed entries.
#[must_use]
pub fn labels(doc: &Value) -> HashSet<String> {
    doc.get("tasks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|entry| text_field(entry, "label"))
        .map(str::to_string)
        .collect()
}

fn error(code: &str, message: impl Into<String>, location: &Location) -> ValidationError {
    make_error(code, message, Severity::Error).at(location.clone())
}
