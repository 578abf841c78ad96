//! Build-script inspection stage.

use devproof_common::aggregate::{make_error, make_warning};
use devproof_common::codes;
use devproof_common::constants::stages;
use devproof_common::types::{Location, Severity, ValidationResult};
use devproof_runtime::dockerfile::ScriptInfo;
use serde_json::Value;

/// Result when the config names an image and no script.
#[must_use]
pub fn no_script(image: Option<&str>) -> ValidationResult {
    ValidationResult::new(stages::DOCKERFILE, "no Dockerfile referenced, using the configured image")
        .with_metadata("baseImage", image.map_or(Value::Null, Value::from))
}

/// Result when the referenced script does not exist.
#[must_use]
pub fn not_found(location: Location) -> ValidationResult {
    let mut result = ValidationResult::new(stages::DOCKERFILE, "Dockerfile not found");
    result.push_error(
        make_error(
            codes::DOCKERFILE_NOT_FOUND,
            format!("{} does not exist", location.file.display()),
            Severity::Error,
        )
        .at(location),
    );
    result
}

/// Checks what was extracted from an existing script.
///
/// Findings tied to an instruction point at its line in `location`.
#[must_use]
pub fn check(info: &ScriptInfo, location: &Location) -> ValidationResult {
    let mut result = ValidationResult::new(stages::DOCKERFILE, "Dockerfile looks usable");

    if info.base_image.is_none() {
        result.push_error(
            make_error(codes::MISSING_BASE_IMAGE, "no FROM line declares a base image", Severity::Error)
                .at(location.clone()),
        );
    }
    if info.workdir.is_none() {
        result.push_warning(
            make_warning(
                codes::MISSING_WORKDIR,
                "no WORKDIR is declared",
                Some("Add a WORKDIR so commands run in a predictable directory"),
            )
            .at(location.clone()),
        );
    }
    if info.user.as_deref().is_some_and(is_root) {
        result.push_warning(
            make_warning(
                codes::ROOT_USER,
                "the image runs as root",
                Some("Add a non-root USER to match the host user's file ownership"),
            )
            .at(at_line(location, info.user_line)),
        );
    }

    result.set_metadata("baseImage", info.base_image.as_deref().map_or(Value::Null, Value::from));
    result.set_metadata("baseImageLine", info.base_image_line.map_or(Value::Null, Value::from));
    result.set_metadata("workdir", info.workdir.as_deref().map_or(Value::Null, Value::from));
    result.set_metadata("user", info.user.as_deref().map_or(Value::Null, Value::from));
    result.set_metadata("exposedPorts", info.exposed_ports.clone());
    if !result.success {
        result.set_message("Dockerfile has no base image");
    }
    result
}

fn at_line(location: &Location, line: Option<u32>) -> Location {
    line.map_or_else(|| location.clone(), |line| Location::line(location.file.clone(), line))
}

/// `root`, `0`, or either with a group suffix.
fn is_root(user: &str) -> bool {
    let name = user.split(':').next().unwrap_or(user).trim();
    name == "root" || name == "0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use devproof_runtime::dockerfile::parse_script;

    fn location() -> Location {
        Location::file(".devcontainer/Dockerfile")
    }

    #[test]
    fn complete_script_passes_cleanly() {
        let info = parse_script("FROM node:20\nWORKDIR /app\nUSER node\nEXPOSE 3000\n");
        let result = check(&info, &location());
        assert!(result.success);
        assert!(result.warnings.is_empty());
        assert_eq!(result.metadata["baseImage"], "node:20");
        assert_eq!(result.metadata["exposedPorts"], serde_json::json!([3000]));
    }

    #[test]
    fn missing_base_image_is_error() {
        let result = check(&parse_script("RUN true\n"), &location());
        assert!(result.has_error_code(codes::MISSING_BASE_IMAGE));
        assert!(result.has_warning_code(codes::MISSING_WORKDIR));
    }

    #[test]
    fn root_user_warns() {
        for user in ["root", "0", "root:root"] {
            let info = parse_script(&format!("FROM debian\nWORKDIR /w\nUSER {user}\n"));
            let result = check(&info, &location());
            assert!(result.success);
            assert!(result.has_warning_code(codes::ROOT_USER), "{user}");
        }
        let info = parse_script("FROM debian\nWORKDIR /w\nUSER rooter\n");
        assert!(!check(&info, &location()).has_warning_code(codes::ROOT_USER));
    }

    #[test]
    fn findings_point_at_instruction_lines() {
        let info = parse_script("# base\nFROM debian\nWORKDIR /w\n\nUSER root\n");
        let result = check(&info, &location());
        assert_eq!(result.metadata["baseImageLine"], 2);
        let warning = &result.warnings[0];
        assert_eq!(warning.location, Some(Location::line(".devcontainer/Dockerfile", 5)));
    }

    #[test]
    fn no_script_records_image() {
        let result = no_script(Some("python:3.12"));
        assert!(result.success);
        assert_eq!(result.metadata["baseImage"], "python:3.12");
    }

    #[test]
    fn not_found_fails() {
        let result = not_found(location());
        assert!(result.has_error_code(codes::DOCKERFILE_NOT_FOUND));
    }
}
