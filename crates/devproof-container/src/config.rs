//! Static checks over the container config document.

use std::path::{Path, PathBuf};

use devproof_common::aggregate::make_error;
use devproof_common::codes;
use devproof_common::constants::{PRIVILEGED_PORT_LIMIT, stages};
use devproof_common::types::{Location, Severity, ValidationError, ValidationResult};
use serde_json::{Map, Value};

const MAX_PORT: i64 = 65_535;

/// Where the environment's image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A prebuilt image reference.
    Image(String),
    /// A build script, with its context directory and build arguments.
    Script {
        /// Build script path, resolved against the config directory.
        dockerfile: PathBuf,
        /// Build context directory.
        context: PathBuf,
        /// Build arguments in declaration order.
        args: Vec<(String, String)>,
    },
}

/// Checks a parsed config document.
#[must_use]
pub fn check(doc: &Value, location: &Location) -> ValidationResult {
    let mut result = ValidationResult::new(stages::CONFIG, "devcontainer.json is valid");
    let Some(root) = doc.as_object() else {
        result.push_error(
            make_error(
                codes::MISSING_IMAGE_SOURCE,
                "devcontainer.json must be a JSON object",
                Severity::Critical,
            )
            .at(location.clone()),
        );
        result.set_message("devcontainer.json is malformed");
        return result;
    };

    if script_reference(root).is_none() && text(root, "image").is_none() {
        result.push_error(
            make_error(
                codes::MISSING_IMAGE_SOURCE,
                "one of \"image\", \"dockerFile\" or \"build.dockerfile\" is required",
                Severity::Critical,
            )
            .at(location.clone()),
        );
    }

    let extensions = root.get("extensions").into_iter().chain(
        root.get("customizations")
            .and_then(|c| c.get("vscode"))
            .and_then(|v| v.get("extensions")),
    );
    for value in extensions {
        if !value.is_array() {
            result.push_error(
                make_error(codes::INVALID_EXTENSIONS, "\"extensions\" must be an array", Severity::Error)
                    .at(location.clone()),
            );
        }
    }

    if let Some(features) = root.get("features") {
        if !features.is_object() {
            result.push_error(
                make_error(codes::INVALID_FEATURES, "\"features\" must be an object", Severity::Error)
                    .at(location.clone()),
            );
        }
    }

    match root.get("forwardPorts") {
        None => {}
        Some(Value::Array(ports)) => {
            result.extend_errors(
                ports
                    .iter()
                    .filter_map(validate_port)
                    .map(|e| e.at(location.clone())),
            );
        }
        Some(_) => result.push_error(
            make_error(codes::INVALID_PORT, "\"forwardPorts\" must be an array", Severity::Error)
                .at(location.clone()),
        ),
    }

    if let Some(user) = text(root, "remoteUser") {
        result.set_metadata("remoteUser", user);
    }
    if let Some(image) = text(root, "image") {
        result.set_metadata("image", image);
    }
    if !result.success {
        result.set_message(format!("{} problem(s) in devcontainer.json", result.errors.len()));
    }
    result
}

/// Checks one `forwardPorts` entry.
#[must_use]
pub fn validate_port(port: &Value) -> Option<ValidationError> {
    let Some(number) = port.as_i64() else {
        return Some(
            make_error(codes::INVALID_PORT, format!("port {port} is not an integer"), Severity::Error)
                .with_context("port", port.clone()),
        );
    };
    if !(1..=MAX_PORT).contains(&number) {
        return Some(
            make_error(
                codes::PORT_OUT_OF_RANGE,
                format!("port {number} is outside 1-{MAX_PORT}"),
                Severity::Error,
            )
            .with_context("port", number),
        );
    }
    if number < PRIVILEGED_PORT_LIMIT {
        return Some(
            make_error(
                codes::PRIVILEGED_PORT,
                format!("port {number} is privileged (below {PRIVILEGED_PORT_LIMIT})"),
                Severity::Error,
            )
            .with_context("port", number),
        );
    }
    None
}

/// Resolves the image source, with paths relative to `config_dir`.
///
/// `build.dockerfile` takes precedence over `dockerFile`, which takes
/// precedence over `image`.
#[must_use]
pub fn image_source(doc: &Value, config_dir: &Path) -> Option<ImageSource> {
    let root = doc.as_object()?;
    if let Some(script) = script_reference(root) {
        let dockerfile = config_dir.join(script);
        let build = root.get("build").and_then(Value::as_object);
        let context = build
            .and_then(|b| text(b, "context"))
            .or_else(|| text(root, "context"))
            .map_or_else(
                || dockerfile.parent().unwrap_or(config_dir).to_path_buf(),
                |c| config_dir.join(c),
            );
        let args = build
            .and_then(|b| b.get("args"))
            .and_then(Value::as_object)
            .map(build_args)
            .unwrap_or_default();
        return Some(ImageSource::Script {
            dockerfile,
            context,
            args,
        });
    }
    text(root, "image").map(|image| ImageSource::Image(image.to_string()))
}

fn script_reference(root: &Map<String, Value>) -> Option<&str> {
    root.get("build")
        .and_then(Value::as_object)
        .and_then(|b| text(b, "dockerfile"))
        .or_else(|| text(root, "dockerFile"))
}

fn build_args(args: &Map<String, Value>) -> Vec<(String, String)> {
    args.iter()
        .map(|(key, value)| {
            let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            (key.clone(), value)
        })
        .collect()
}

fn text<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
