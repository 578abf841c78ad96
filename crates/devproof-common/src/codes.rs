//! Stable symbolic identifiers for errors and warnings.
//!
//! Codes are part of the report contract: consumers match on them, so a
//! code is never renamed once published.

// Stage boundary
/// A document read or parse failed inside a stage.
pub const STAGE_EXCEPTION: &str = "STAGE_EXCEPTION";
/// An external invocation exceeded its wall-clock limit.
pub const COMMAND_TIMEOUT: &str = "COMMAND_TIMEOUT";
/// An optional editor document is absent.
pub const DOCUMENT_MISSING: &str = "DOCUMENT_MISSING";

// Container config
/// The container config document does not exist.
pub const CONFIG_NOT_FOUND: &str = "CONFIG_NOT_FOUND";
/// None of `image`, `dockerFile`, `build.dockerfile` is set.
pub const MISSING_IMAGE_SOURCE: &str = "MISSING_IMAGE_SOURCE";
/// `extensions` is present but not an array.
pub const INVALID_EXTENSIONS: &str = "INVALID_EXTENSIONS";
/// `features` is present but not an object.
pub const INVALID_FEATURES: &str = "INVALID_FEATURES";
/// A forwarded port is not an integer, or `forwardPorts` is not an array.
pub const INVALID_PORT: &str = "INVALID_PORT";
/// A forwarded port lies outside `1..=65535`.
pub const PORT_OUT_OF_RANGE: &str = "PORT_OUT_OF_RANGE";
/// A forwarded port lies below 1024.
pub const PRIVILEGED_PORT: &str = "PRIVILEGED_PORT";

// Runtime and build script
/// The runtime version probe failed.
pub const RUNTIME_UNAVAILABLE: &str = "RUNTIME_UNAVAILABLE";
/// A referenced build script does not exist.
pub const DOCKERFILE_NOT_FOUND: &str = "DOCKERFILE_NOT_FOUND";
/// The build script has no base-image line.
pub const MISSING_BASE_IMAGE: &str = "MISSING_BASE_IMAGE";
/// The build script declares no working directory.
pub const MISSING_WORKDIR: &str = "MISSING_WORKDIR";
/// The build script switches to the root user.
pub const ROOT_USER: &str = "ROOT_USER";

// Build, compile, test
/// The image build exited non-zero.
pub const BUILD_FAILED: &str = "BUILD_FAILED";
/// The generated build script could not be written.
pub const GENERATED_DOCKERFILE_FAILED: &str = "GENERATED_DOCKERFILE_FAILED";
/// An error line in compile output.
pub const COMPILE_ERROR: &str = "COMPILE_ERROR";
/// A warning line in compile output.
pub const COMPILE_WARNING: &str = "COMPILE_WARNING";
/// The compile command exited non-zero.
pub const COMPILE_FAILED: &str = "COMPILE_FAILED";
/// Extracted counts report failing tests.
pub const TESTS_FAILED: &str = "TESTS_FAILED";
/// The test command exited non-zero and no counts were extracted.
pub const TEST_COMMAND_FAILED: &str = "TEST_COMMAND_FAILED";
/// The test command ran but no summary could be recognized.
pub const TEST_COUNTS_UNKNOWN: &str = "TEST_COUNTS_UNKNOWN";

// Launch and task documents
/// `version` is absent.
pub const MISSING_VERSION: &str = "MISSING_VERSION";
/// `version` differs from the expected literal.
pub const VERSION_MISMATCH: &str = "VERSION_MISMATCH";
/// `configurations` is absent or not an array.
pub const INVALID_CONFIGURATIONS: &str = "INVALID_CONFIGURATIONS";
/// An entry has no `type`.
pub const MISSING_TYPE: &str = "MISSING_TYPE";
/// A launch entry has a missing or unknown `request`.
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
/// A launch entry has no `name`.
pub const MISSING_NAME: &str = "MISSING_NAME";
/// A process-style launch entry has no `program`.
pub const MISSING_PROGRAM: &str = "MISSING_PROGRAM";
/// A browser-style launch entry has neither `url` nor `file`.
pub const MISSING_URL: &str = "MISSING_URL";
/// An interpreter-style launch entry has neither `program` nor `module`.
pub const MISSING_PROGRAM_OR_MODULE: &str = "MISSING_PROGRAM_OR_MODULE";
/// Two launch entries share a name.
pub const DUPLICATE_NAME: &str = "DUPLICATE_NAME";
/// An environment variable name is not upper-case identifier-like.
pub const INVALID_ENV_NAME: &str = "INVALID_ENV_NAME";
/// `tasks` is absent or not an array.
pub const INVALID_TASKS: &str = "INVALID_TASKS";
/// A task has no `label`.
pub const MISSING_LABEL: &str = "MISSING_LABEL";
/// A shell or process task has no `command`.
pub const MISSING_COMMAND: &str = "MISSING_COMMAND";
/// A package-manager task has neither `script` nor `path`.
pub const MISSING_SCRIPT: &str = "MISSING_SCRIPT";
/// Two tasks share a label.
pub const DUPLICATE_LABEL: &str = "DUPLICATE_LABEL";
/// A `dependsOn` reference names no existing task.
pub const MISSING_DEPENDENCY: &str = "MISSING_DEPENDENCY";
/// `dependsOn` references form a cycle.
pub const DEPENDENCY_CYCLE: &str = "DEPENDENCY_CYCLE";
/// A task `group` is outside the allowed set.
pub const INVALID_GROUP: &str = "INVALID_GROUP";
/// A task `presentation` field is outside its allowed set.
pub const INVALID_PRESENTATION: &str = "INVALID_PRESENTATION";

// Settings document
/// The settings document is not a key/value object.
pub const INVALID_SETTINGS_FORMAT: &str = "INVALID_SETTINGS_FORMAT";
/// The settings document contains comment syntax.
pub const COMMENTS_IN_JSON: &str = "COMMENTS_IN_JSON";
/// A deprecated setting key is used.
pub const DEPRECATED_SETTING: &str = "DEPRECATED_SETTING";
/// A numeric setting is not a positive number.
pub const INVALID_NUMBER: &str = "INVALID_NUMBER";
/// `editor.rulers` is not an array of positive numbers.
pub const INVALID_RULERS: &str = "INVALID_RULERS";
/// A boolean setting holds a non-boolean value.
pub const INVALID_BOOLEAN: &str = "INVALID_BOOLEAN";

// Cross-document and extensions
/// A `preLaunchTask` names no task label.
pub const MISSING_PRELAUNCH_TASK: &str = "MISSING_PRELAUNCH_TASK";
/// Two formatters are enabled at the same time.
pub const CONFLICTING_FORMATTERS: &str = "CONFLICTING_FORMATTERS";
/// No recommendations document next to recognized source files.
pub const MISSING_EXTENSIONS_FILE: &str = "MISSING_EXTENSIONS_FILE";
/// `recommendations` is present but not an array.
pub const INVALID_RECOMMENDATIONS: &str = "INVALID_RECOMMENDATIONS";
