//! Detection of a project's compile and test commands.
//!
//! Markers are probed in a fixed priority order; the first marker that
//! applies decides the command.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use devproof_common::documents::DocumentSource;
use devproof_common::error::Result;
use regex::Regex;
use serde_json::Value;

/// A `test:` rule at the start of a Makefile line.
static MAKE_TEST_TARGET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?m)^test\s*:").ok());

/// A command to run inside the built image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCommand {
    /// Marker file that selected the command.
    pub marker: &'static str,
    /// Program and arguments.
    pub argv: Vec<String>,
}

impl ProjectCommand {
    fn new(marker: &'static str, argv: &[&str]) -> Self {
        Self {
            marker,
            argv: argv.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl fmt::Display for ProjectCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Detects the compile command. `None` means nothing needs compiling.
///
/// # Errors
///
/// Returns an error if a marker document exists but cannot be read.
pub fn compile_command(docs: &dyn DocumentSource, root: &Path) -> Result<Option<ProjectCommand>> {
    if npm_script(docs, root, "build")? {
        return Ok(Some(ProjectCommand::new("package.json", &["npm", "run", "build"])));
    }
    let probes: &[(&'static str, &[&str])] = &[
        ("setup.py", &["python", "setup.py", "build"]),
        ("go.mod", &["go", "build", "./..."]),
        ("pom.xml", &["mvn", "-q", "compile"]),
        ("build.gradle", &["gradle", "build", "-x", "test"]),
        ("build.gradle.kts", &["gradle", "build", "-x", "test"]),
        ("Cargo.toml", &["cargo", "build"]),
        ("Makefile", &["make"]),
    ];
    Ok(first_marker(docs, root, probes))
}

/// Detects the test command. `None` means the project has no tests to run.
///
/// # Errors
///
/// Returns an error if a marker document exists but cannot be read.
pub fn test_command(docs: &dyn DocumentSource, root: &Path) -> Result<Option<ProjectCommand>> {
    if npm_script(docs, root, "test")? {
        return Ok(Some(ProjectCommand::new("package.json", &["npm", "test"])));
    }
    let probes: &[(&'static str, &[&str])] = &[
        ("setup.py", &["python", "-m", "pytest"]),
        ("pyproject.toml", &["python", "-m", "pytest"]),
        ("pytest.ini", &["python", "-m", "pytest"]),
        ("go.mod", &["go", "test", "./..."]),
        ("pom.xml", &["mvn", "-q", "test"]),
        ("build.gradle", &["gradle", "test"]),
        ("build.gradle.kts", &["gradle", "test"]),
        ("Cargo.toml", &["cargo", "test"]),
    ];
    if let Some(command) = first_marker(docs, root, probes) {
        return Ok(Some(command));
    }
    let makefile = root.join("Makefile");
    if docs.exists(&makefile) {
        let text = docs.read_text(&makefile)?;
        if MAKE_TEST_TARGET.as_ref().is_some_and(|re| re.is_match(&text)) {
            return Ok(Some(ProjectCommand::new("Makefile", &["make", "test"])));
        }
    }
    Ok(None)
}

fn first_marker(
    docs: &dyn DocumentSource,
    root: &Path,
    probes: &[(&'static str, &[&str])],
) -> Option<ProjectCommand> {
    probes
        .iter()
        .find(|(marker, _)| docs.exists(&root.join(marker)))
        .map(|(marker, argv)| ProjectCommand::new(*marker, argv))
}

/// Whether `package.json` declares a non-empty `scripts.<name>`.
fn npm_script(docs: &dyn DocumentSource, root: &Path, name: &str) -> Result<bool> {
    let manifest = root.join("package.json");
    if !docs.exists(&manifest) {
        return Ok(false);
    }
    let doc = docs.read_json(&manifest)?;
    Ok(doc
        .get("scripts")
        .and_then(|s| s.get(name))
        .and_then(Value::as_str)
        .is_some_and(|script| !script.trim().is_empty()))
}
