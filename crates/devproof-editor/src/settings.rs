//! Workspace settings document checks.
//!
//! The settings document is JSON with comments in practice, so comments are
//! reported as a warning and stripped before the remaining checks run.

use std::path::Path;

use devproof_common::aggregate::{make_error, make_warning};
use devproof_common::codes;
use devproof_common::constants::stages;
use devproof_common::documents::{DocumentSource, has_comment_syntax};
use devproof_common::error::Result;
use devproof_common::types::{Location, Severity, ValidationError, ValidationResult};
use serde_json::Value;

use crate::document::{EditorPaths, missing_document, parse_jsonc};

/// Deprecated keys and the setting that replaced them.
const DEPRECATED: &[(&str, &str)] = &[
    ("python.pythonPath", "python.defaultInterpreterPath"),
    ("python.formatting.provider", "editor.defaultFormatter"),
    ("eslint.autoFixOnSave", "editor.codeActionsOnSave"),
    ("terminal.integrated.shell.linux", "terminal.integrated.defaultProfile.linux"),
    ("terminal.integrated.shell.osx", "terminal.integrated.defaultProfile.osx"),
    ("terminal.integrated.shell.windows", "terminal.integrated.defaultProfile.windows"),
    ("editor.formatOnSaveTimeout", "editor.codeActionsOnSave"),
];

const POSITIVE_NUMBERS: &[&str] = &[
    "editor.tabSize",
    "editor.fontSize",
    "editor.wordWrapColumn",
    "files.autoSaveDelay",
];

const BOOLEANS: &[&str] = &[
    "editor.formatOnSave",
    "editor.formatOnPaste",
    "editor.formatOnType",
    "files.trimTrailingWhitespace",
    "files.insertFinalNewline",
    "editor.minimap.enabled",
];

/// Reads and checks the settings document.
///
/// # Errors
///
/// Returns an error if the document exists but cannot be read, or is not
/// valid JSON once comments are removed.
pub fn validate(docs: &dyn DocumentSource, paths: &EditorPaths) -> Result<ValidationResult> {
    let location = paths.location(&paths.settings);
    if !docs.exists(&paths.settings) {
        return Ok(missing_document(stages::SETTINGS, location));
    }
    let text = docs.read_text(&paths.settings)?;
    check_text(&text, &paths.settings, &location)
}

/// Checks raw settings text.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON once comments are removed.
pub fn check_text(text: &str, path: &Path, location: &Location) -> Result<ValidationResult> {
    let doc = parse_jsonc(text, path)?;
    let mut result = check(&doc, location);
    if has_comment_syntax(text) {
        result.push_warning(
            make_warning(
                codes::COMMENTS_IN_JSON,
                "settings document contains comments",
                Some("Remove comments so strict JSON tooling can read the file"),
            )
            .at(location.clone()),
        );
    }
    Ok(result)
}

/// Checks a parsed settings document.
#[must_use]
pub fn check(doc: &Value, location: &Location) -> ValidationResult {
    let mut result = ValidationResult::new(stages::SETTINGS, "settings are valid");
    let Some(settings) = doc.as_object() else {
        result.push_error(
            make_error(
                codes::INVALID_SETTINGS_FORMAT,
                "settings document must be a JSON object of key/value pairs",
                Severity::Error,
            )
            .at(location.clone()),
        );
        result.set_message("settings document is malformed");
        return result;
    };

    for (old, replacement) in DEPRECATED.iter().filter(|(old, _)| settings.contains_key(*old)) {
        result.push_warning(
            make_warning(
                codes::DEPRECATED_SETTING,
                format!("\"{old}\" is deprecated"),
                Some(format!("Use \"{replacement}\" instead").as_str()),
            )
            .at(location.clone()),
        );
    }

    for key in POSITIVE_NUMBERS {
        if let Some(value) = settings.get(*key) {
            if !is_positive_number(value) {
                result.push_error(error(
                    codes::INVALID_NUMBER,
                    format!("\"{key}\" must be a positive number, found {value}"),
                    key,
                    location,
                ));
            }
        }
    }

    if let Some(rulers) = settings.get("editor.rulers") {
        if !is_valid_rulers(rulers) {
            result.push_error(error(
                codes::INVALID_RULERS,
                format!("\"editor.rulers\" must be an array of positive numbers, found {rulers}"),
                "editor.rulers",
                location,
            ));
        }
    }

    for key in BOOLEANS {
        if let Some(value) = settings.get(*key) {
            if !value.is_boolean() {
                result.push_error(error(
                    codes::INVALID_BOOLEAN,
                    format!("\"{key}\" must be true or false, found {value}"),
                    key,
                    location,
                ));
            }
        }
    }

    result.set_metadata("settingCount", settings.len());
    if !result.success {
        result.set_message(format!("{} invalid setting(s)", result.errors.len()));
    }
    result
}

fn is_positive_number(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n > 0.0)
}

/// Rulers are numbers, or `{ "column": n, "color": ... }` objects.
fn is_valid_rulers(value: &Value) -> bool {
    value.as_array().is_some_and(|rulers| {
        rulers.iter().all(|ruler| match ruler {
            Value::Object(o) => o.get("column").is_some_and(is_positive_number),
            other => is_positive_number(other),
        })
    })
}

fn error(code: &str, message: String, key: &str, location: &Location) -> ValidationError {
    make_error(code, message, Severity::Error)
        .at(location.clone())
        .with_context("setting", key)
}

/// Whether both `key`s are explicitly enabled.
#[must_use]
pub fn both_enabled(doc: &Value, first: &str, second: &str) -> bool {
    let enabled = |key: &str| doc.get(key).and_then(Value::as_bool).unwrap_or(false);
    enabled(first) && enabled(second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location() -> Location {
        Location::file(".vscode/settings.json")
    }

    #[test]
    fn well_formed_settings_pass() {
        let result = check(
            &json!({
                "editor.tabSize": 2,
                "editor.fontSize": 13.5,
                "editor.rulers": [80, { "column": 120, "color": "#ff0000" }],
                "editor.formatOnSave": true,
                "files.insertFinalNewline": false
            }),
            &location(),
        );
        assert!(result.success, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn array_document_is_rejected() {
        let result = check(&json!([1, 2]), &location());
        assert!(result.has_error_code(codes::INVALID_SETTINGS_FORMAT));
    }

    #[test]
    fn comments_warn_but_still_validate() {
        let text = "{\n  // indentation\n  \"editor.tabSize\": 0\n}";
        let result = check_text(text, Path::new("settings.json"), &location()).unwrap();
        assert!(result.has_warning_code(codes::COMMENTS_IN_JSON));
        assert!(result.has_error_code(codes::INVALID_NUMBER));
    }

    #[test]
    fn deprecated_keys_suggest_replacement() {
        let result = check(&json!({ "python.pythonPath": "/usr/bin/python3" }), &location());
        assert!(result.success);
        let warning = &result.warnings[0];
        assert_eq!(warning.code, codes::DEPRECATED_SETTING);
        assert!(warning.suggestion.as_deref().unwrap().contains("python.defaultInterpreterPath"));
    }

    #[test]
    fn type_errors() {
        let result = check(
            &json!({
                "editor.tabSize": "4",
                "files.autoSaveDelay": -1,
                "editor.rulers": [80, 0],
                "editor.formatOnSave": "yes"
            }),
            &location(),
        );
        let count = |code: &str| result.errors.iter().filter(|e| e.code == code).count();
        assert_eq!(count(codes::INVALID_NUMBER), 2);
        assert_eq!(count(codes::INVALID_RULERS), 1);
        assert_eq!(count(codes::INVALID_BOOLEAN), 1);
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(check_text("{ \"a\": ", Path::new("settings.json"), &location()).is_err());
    }

    #[test]
    fn both_enabled_requires_explicit_true() {
        let doc = json!({ "eslint.format.enable": true, "prettier.enable": true });
        assert!(both_enabled(&doc, "eslint.format.enable", "prettier.enable"));
        let doc = json!({ "eslint.format.enable": true });
        assert!(!both_enabled(&doc, "eslint.format.enable", "prettier.enable"));
    }
}
