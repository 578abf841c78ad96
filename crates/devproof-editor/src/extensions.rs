//! Extension recommendations advisory.

use std::collections::BTreeSet;

use devproof_common::aggregate::{make_error, make_warning};
use devproof_common::codes;
use devproof_common::constants::stages;
use devproof_common::documents::DocumentSource;
use devproof_common::error::Result;
use devproof_common::types::{Location, Severity, ValidationResult};
use serde_json::Value;

use crate::document::{EditorPaths, read_jsonc};

/// How deep below the project root source files are looked for.
const SCAN_DEPTH: usize = 4;

/// Recognized languages: file extensions and the extension ids suggested
/// for them.
const LANGUAGES: &[(&str, &[&str], &[&str])] = &[
    ("typescript", &["ts", "tsx"], &["dbaeumer.vscode-eslint", "esbenp.prettier-vscode"]),
    ("javascript", &["js", "jsx", "mjs", "cjs"], &["dbaeumer.vscode-eslint", "esbenp.prettier-vscode"]),
    ("python", &["py"], &["ms-python.python"]),
    ("go", &["go"], &["golang.go"]),
    ("rust", &["rs"], &["rust-lang.rust-analyzer"]),
    ("java", &["java"], &["vscjava.vscode-java-pack"]),
    ("csharp", &["cs"], &["ms-dotnettools.csharp"]),
    ("cpp", &["c", "cc", "cpp", "h", "hpp"], &["ms-vscode.cpptools"]),
    ("ruby", &["rb"], &["Shopify.ruby-lsp"]),
    ("php", &["php"], &["bmewburn.vscode-intelephense-client"]),
];

/// Checks the recommendations document, or advises creating one.
///
/// # Errors
///
/// Returns an error if the document exists but cannot be read or parsed.
pub fn validate(docs: &dyn DocumentSource, paths: &EditorPaths) -> Result<ValidationResult> {
    let location = paths.location(&paths.extensions);
    if docs.exists(&paths.extensions) {
        let doc = read_jsonc(docs, &paths.extensions)?;
        return Ok(check(&doc, &location));
    }

    let all_exts: Vec<&str> = LANGUAGES.iter().flat_map(|(_, exts, _)| exts.iter().copied()).collect();
    let found: BTreeSet<String> = docs
        .find_files(&paths.root, &all_exts, SCAN_DEPTH)
        .iter()
        .filter_map(|path| path.extension().and_then(|e| e.to_str()).map(str::to_string))
        .collect();
    Ok(advise(&found, location))
}

/// Result for a project without a recommendations document, given the
/// source file extensions present.
#[must_use]
pub fn advise(found_exts: &BTreeSet<String>, location: Location) -> ValidationResult {
    let mut result = ValidationResult::new(stages::EXTENSIONS, "no extension recommendations needed");
    let mut languages = Vec::new();
    let mut suggested = BTreeSet::new();
    for (language, exts, ids) in LANGUAGES {
        if exts.iter().any(|ext| found_exts.contains(*ext)) {
            languages.push(Value::from(*language));
            suggested.extend(ids.iter().copied());
        }
    }
    if languages.is_empty() {
        return result;
    }

    let ids: Vec<&str> = suggested.into_iter().collect();
    result.push_warning(
        make_warning(
            codes::MISSING_EXTENSIONS_FILE,
            "no extensions.json recommends extensions for the project's languages",
            Some(format!("Recommend {}", ids.join(", ")).as_str()),
        )
        .at(location),
    );
    result.set_message("extension recommendations are missing");
    result.set_metadata("languages", languages);
    result
}

/// Checks a parsed recommendations document.
#[must_use]
pub fn check(doc: &Value, location: &Location) -> ValidationResult {
    let mut result = ValidationResult::new(stages::EXTENSIONS, "extension recommendations are valid");
    match doc.get("recommendations") {
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => {
            result.set_metadata("recommendationCount", items.len());
        }
        Some(Value::Array(_)) => result.push_error(
            make_error(
                codes::INVALID_RECOMMENDATIONS,
                "every entry of \"recommendations\" must be an extension id string",
                Severity::Error,
            )
            .at(location.clone()),
        ),
        _ => result.push_error(
            make_error(
                codes::INVALID_RECOMMENDATIONS,
                "\"recommendations\" must be an array",
                Severity::Error,
            )
            .at(location.clone()),
        ),
    }
    if !result.success {
        result.set_message("extension recommendations are malformed");
    }
    result
}
