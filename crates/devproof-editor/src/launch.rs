//! Debug launch document checks.

use std::collections::HashSet;
use std::sync::LazyLock;

use devproof_common::aggregate::make_error;
use devproof_common::codes;
use devproof_common::constants::{LAUNCH_VERSION, stages};
use devproof_common::documents::DocumentSource;
use devproof_common::error::Result;
use devproof_common::types::{Location, Severity, ValidationError, ValidationResult};
use regex::Regex;
use serde_json::{Map, Value};

use crate::document::{EditorPaths, check_version, has_text, missing_document, read_jsonc, text_field};

/// Debugger types that start a native or runtime process.
const PROCESS_TYPES: &[&str] = &["node", "pwa-node", "cppdbg", "lldb", "go"];

/// Debugger types that open a page in a browser.
const BROWSER_TYPES: &[&str] = &["chrome", "pwa-chrome", "msedge", "pwa-msedge", "firefox"];

/// Debugger types that run a script or module through an interpreter.
const INTERPRETER_TYPES: &[&str] = &["python", "debugpy"];

const REQUESTS: &[&str] = &["launch", "attach"];

/// Identifier-like uppercase names: `NODE_ENV`, `_TOKEN`.
static ENV_NAME: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").ok());

/// Whether `name` is an acceptable environment variable name.
#[must_use]
pub fn is_valid_env_name(name: &str) -> bool {
    ENV_NAME.as_ref().is_some_and(|re| re.is_match(name))
}

/// Reads and checks the launch document.
///
/// # Errors
///
/// Returns an error if the document exists but cannot be read or parsed.
pub fn validate(docs: &dyn DocumentSource, paths: &EditorPaths) -> Result<ValidationResult> {
    let location = paths.location(&paths.launch);
    if !docs.exists(&paths.launch) {
        return Ok(missing_document(stages::LAUNCH, location));
    }
    let doc = read_jsonc(docs, &paths.launch)?;
    Ok(check(&doc, &location))
}

/// Checks a parsed launch document.
#[must_use]
pub fn check(doc: &Value, location: &Location) -> ValidationResult {
    let mut result = ValidationResult::new(stages::LAUNCH, "launch configurations are valid");
    let Some(root) = doc.as_object() else {
        result.push_error(error(
            codes::INVALID_CONFIGURATIONS,
            "launch document must be a JSON object",
            location,
        ));
        result.set_message("launch document is malformed");
        return result;
    };

    check_version(root, LAUNCH_VERSION, location, &mut result);

    let Some(configurations) = root.get("configurations").and_then(Value::as_array) else {
        result.push_error(error(
            codes::INVALID_CONFIGURATIONS,
            "\"configurations\" must be an array",
            location,
        ));
        result.set_message("launch document has no configuration list");
        return result;
    };

    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for (index, entry) in configurations.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            result.push_error(error(
                codes::INVALID_CONFIGURATIONS,
                format!("configuration #{} must be an object", index + 1),
                location,
            ));
            continue;
        };
        let errors = check_entry(index, entry, location);
        result.extend_errors(errors);
        if let Some(name) = text_field(entry, "name") {
            names.push(Value::from(name));
            if !seen.insert(name) {
                result.push_error(
                    error(
                        codes::DUPLICATE_NAME,
                        format!("duplicate launch configuration name \"{name}\""),
                        location,
                    )
                    .with_context("name", name),
                );
            }
        }
    }

    result.set_metadata("configurationCount", configurations.len());
    result.set_metadata("names", names);
    if !result.success {
        result.set_message(format!("{} problem(s) in launch configurations", result.errors.len()));
    }
    result
}

fn check_entry(index: usize, entry: &Map<String, Value>, location: &Location) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let label = text_field(entry, "name").map_or_else(|| format!("configuration #{}", index + 1), |n| format!("\"{n}\""));

    if !has_text(entry, "name") {
        errors.push(error(
            codes::MISSING_NAME,
            format!("configuration #{} has no \"name\"", index + 1),
            location,
        ));
    }

    let kind = text_field(entry, "type");
    if kind.is_none() {
        errors.push(error(codes::MISSING_TYPE, format!("{label} has no \"type\""), location));
    }

    let request = text_field(entry, "request");
    if !request.is_some_and(|r| REQUESTS.contains(&r)) {
        errors.push(error(
            codes::INVALID_REQUEST,
            format!(
                "{label} has request \"{}\", expected \"launch\" or \"attach\"",
                request.unwrap_or_default()
            ),
            location,
        ));
    }

    if let (Some(kind), Some("launch")) = (kind, request) {
        errors.extend(check_type_requirements(kind, &label, entry, location));
    }

    if let Some(env) = entry.get("env").and_then(Value::as_object) {
        for name in env.keys().filter(|name| !is_valid_env_name(name)) {
            errors.push(
                error(
                    codes::INVALID_ENV_NAME,
                    format!("{label} sets invalid environment variable name \"{name}\""),
                    location,
                )
                .with_context("variable", name.as_str()),
            );
        }
    }
    errors
}

fn check_type_requirements(
    kind: &str,
    label: &str,
    entry: &Map<String, Value>,
    location: &Location,
) -> Option<ValidationError> {
    if PROCESS_TYPES.contains(&kind) && !has_text(entry, "program") {
        return Some(error(
            codes::MISSING_PROGRAM,
            format!("{label} ({kind}) needs \"program\""),
            location,
        ));
    }
    if BROWSER_TYPES.contains(&kind) && !has_text(entry, "url") && !has_text(entry, "file") {
        return Some(error(
            codes::MISSING_URL,
            format!("{label} ({kind}) needs \"url\" or \"file\""),
            location,
        ));
    }
    if INTERPRETER_TYPES.contains(&kind) && !has_text(entry, "program") && !has_text(entry, "module") {
        return Some(error(
            codes::MISSING_PROGRAM_OR_MODULE,
            format!("{label} ({kind}) needs \"program\" or \"module\""),
            location,
        ));
    }
    None
}

fn error(code: &str, message: impl Into<String>, location: &Location) -> ValidationError {
    make_error(code, message, Severity::Error).at(location.clone())
}

/// `preLaunchTask` references of every configuration, paired with the
/// configuration name.
#[must_use]
pub fn prelaunch_tasks(doc: &Value) -> Vec<(String, String)> {
    doc.get("configurations")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let task = text_field(entry, "preLaunchTask")?;
            let name = text_field(entry, "name").unwrap_or("<unnamed>");
            Some((name.to_string(), task.to_string()))
        })
        .collect()
}
