//! Read-only access to the documents a pipeline validates.
//!
//! Pipelines go through [`DocumentSource`] instead of touching the file
//! system directly, so a stage never needs to know where documents live.

use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{DevproofError, Result};

/// Directories never descended into when scanning for source files.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
];

/// Document access used by the validation pipelines.
pub trait DocumentSource: Send + Sync {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Reads `path` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_text(&self, path: &Path) -> Result<String>;

    /// Reads and parses `path` as strict JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    fn read_json(&self, path: &Path) -> Result<Value> {
        let text = self.read_text(path)?;
        serde_json::from_str(&text).map_err(|source| DevproofError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Lists files under `root` whose extension is in `extensions`, up to
    /// `max_depth` directory levels deep.
    fn find_files(&self, root: &Path, extensions: &[&str], max_depth: usize) -> Vec<PathBuf>;
}

/// [`DocumentSource`] backed by the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocuments;

impl DocumentSource for FsDocuments {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        tracing::debug!(path = %path.display(), "reading document");
        std::fs::read_to_string(path).map_err(|source| DevproofError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn find_files(&self, root: &Path, extensions: &[&str], max_depth: usize) -> Vec<PathBuf> {
        WalkDir::new(root)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !IGNORED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(root = %root.display(), error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.contains(&ext))
            })
            .map(walkdir::DirEntry::into_path)
            .collect()
    }
}

/// Whether `text` contains `//` or `/* */` comments outside string literals.
#[must_use]
pub fn has_comment_syntax(text: &str) -> bool {
    strip_json_comments(text).len() != text.len()
}

/// Removes `//` and `/* */` comments outside string literals.
#[must_use]
pub fn strip_json_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                let _ = chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_removes_line_and_block_comments() {
        let text = "{\n  // note\n  \"a\": 1, /* x */ \"b\": 2\n}";
        let stripped = strip_json_comments(text);
        let value: Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(value["b"], 2);
    }

    #[test]
    fn strip_keeps_slashes_inside_strings() {
        let text = r#"{"url": "http://localhost:3000", "glob": "src/**/*.ts"}"#;
        assert_eq!(strip_json_comments(text), text);
        assert!(!has_comment_syntax(text));
    }

    #[test]
    fn detects_comment_syntax() {
        assert!(has_comment_syntax("{ // hi\n}"));
        assert!(has_comment_syntax("{ /* hi */ }"));
    }

    #[test]
    fn read_json_reports_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = FsDocuments.read_json(&path).unwrap_err();
        assert!(matches!(err, DevproofError::Json { .. }));
    }

    #[test]
    fn read_text_reports_missing_files() {
        let err = FsDocuments.read_text(Path::new("/nonexistent/devproof.json")).unwrap_err();
        assert!(matches!(err, DevproofError::Io { .. }));
    }

    #[test]
    fn find_files_skips_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        std::fs::write(dir.path().join("src/index.ts"), "").unwrap();
        std::fs::write(dir.path().join("node_modules/pkg/index.ts"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();

        let found = FsDocuments.find_files(dir.path(), &["ts"], 4);
        assert_eq!(found, vec![dir.path().join("src/index.ts")]);
    }

    #[test]
    fn find_files_skips_unreadable_roots() {
        let dir = tempfile::tempdir().unwrap();
        let found = FsDocuments.find_files(&dir.path().join("missing"), &["ts"], 4);
        assert!(found.is_empty());
    }
}
