//! Helpers shared by the editor document stages.

use std::path::{Path, PathBuf};

use devproof_common::aggregate::{make_error, make_warning};
use devproof_common::codes;
use devproof_common::constants::{EXTENSIONS_FILE, LAUNCH_FILE, SETTINGS_FILE, TASKS_FILE};
use devproof_common::documents::{DocumentSource, strip_json_comments};
use devproof_common::error::{DevproofError, Result};
use devproof_common::types::{Location, Severity, ValidationResult};
use serde_json::{Map, Value};

/// Locations of the editor documents of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorPaths {
    /// Project root.
    pub root: PathBuf,
    /// Debug launch document.
    pub launch: PathBuf,
    /// Task document.
    pub tasks: PathBuf,
    /// Workspace settings document.
    pub settings: PathBuf,
    /// Extension recommendations document.
    pub extensions: PathBuf,
}

impl EditorPaths {
    /// Resolves the documents under `root/editor_dir`.
    #[must_use]
    pub fn new(root: &Path, editor_dir: &Path) -> Self {
        let dir = root.join(editor_dir);
        Self {
            root: root.to_path_buf(),
            launch: dir.join(LAUNCH_FILE),
            tasks: dir.join(TASKS_FILE),
            settings: dir.join(SETTINGS_FILE),
            extensions: dir.join(EXTENSIONS_FILE),
        }
    }

    /// Location of `path` relative to the project root.
    #[must_use]
    pub fn location(&self, path: &Path) -> Location {
        Location::file(devproof_common::types::display_path(&self.root, path))
    }
}

/// Reads a document that tolerates `//` and `/* */` comments.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON once
/// comments are removed.
pub fn read_jsonc(docs: &dyn DocumentSource, path: &Path) -> Result<Value> {
    let text = docs.read_text(path)?;
    parse_jsonc(&text, path)
}

/// Parses comment-tolerant JSON text.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON once comments are removed.
pub fn parse_jsonc(text: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(&strip_json_comments(text)).map_err(|source| DevproofError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Passing result for an absent optional document.
#[must_use]
pub fn missing_document(stage: &str, location: Location) -> ValidationResult {
    let mut result = ValidationResult::new(stage, format!("{} not found, skipped", location.file.display()));
    result.push_warning(
        make_warning(
            codes::DOCUMENT_MISSING,
            format!("{} does not exist", location.file.display()),
            Some("Generate the document or remove it from the environment template"),
        )
        .at(location),
    );
    result
}

/// Checks the `version` field: absent is an error, a different literal a warning.
pub fn check_version(
    doc: &Map<String, Value>,
    expected: &str,
    location: &Location,
    result: &mut ValidationResult,
) {
    match doc.get("version").and_then(Value::as_str) {
        None => result.push_error(
            make_error(codes::MISSING_VERSION, "missing \"version\" field", Severity::Error)
                .at(location.clone()),
        ),
        Some(version) if version != expected => result.push_warning(
            make_warning(
                codes::VERSION_MISMATCH,
                format!("version is \"{version}\", expected \"{expected}\""),
                Some(format!("Set \"version\" to \"{expected}\"").as_str()),
            )
            .at(location.clone()),
        ),
        Some(_) => {}
    }
}

/// A string field, treating empty strings as absent.
#[must_use]
pub fn text_field<'a>(entry: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Whether `key` is present with a non-empty string value.
#[must_use]
pub fn has_text(entry: &Map<String, Value>, key: &str) -> bool {
    text_field(entry, key).is_some()
}
