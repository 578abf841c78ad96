//! Derived image tags.
//!
//! A tag is computed from project identity alone, so the same project always
//! builds to the same tag and two projects with the same directory name do
//! not collide.

use std::fmt::Write as _;
use std::path::Path;

use devproof_common::constants::IMAGE_TAG_PREFIX;
use sha2::{Digest, Sha256};

const HASH_CHARS: usize = 8;

/// Derives the image tag for the project rooted at `project_root`.
#[must_use]
pub fn derive_image_tag(project_root: &Path) -> String {
    let canonical = std::fs::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());
    let base = canonical
        .file_name()
        .map(|n| sanitize(&n.to_string_lossy()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "project".to_string());

    let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
    let mut hash = String::with_capacity(HASH_CHARS);
    for byte in digest.iter().take(HASH_CHARS / 2) {
        let _ = write!(hash, "{byte:02x}");
    }
    format!("{IMAGE_TAG_PREFIX}-{base}-{hash}")
}

/// Lowercases `name` and maps characters outside `[a-z0-9_.-]` to `-`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    let mapped: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    mapped.trim_matches(|c| matches!(c, '-' | '.' | '_')).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_replaces() {
        assert_eq!(sanitize("My Project!"), "my-project");
        assert_eq!(sanitize("api_v2.1"), "api_v2.1");
    }

    #[test]
    fn tag_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(derive_image_tag(dir.path()), derive_image_tag(dir.path()));
    }

    #[test]
    fn tag_embeds_base_name_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("Web App");
        std::fs::create_dir(&project).unwrap();
        let tag = derive_image_tag(&project);
        assert!(tag.starts_with("devproof-web-app-"));
        assert_eq!(tag.len(), "devproof-web-app-".len() + 8);
    }

    #[test]
    fn same_base_name_in_different_parents_differs() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::create_dir(a.path().join("app")).unwrap();
        std::fs::create_dir(b.path().join("app")).unwrap();
        assert_ne!(derive_image_tag(&a.path().join("app")), derive_image_tag(&b.path().join("app")));
    }
}
