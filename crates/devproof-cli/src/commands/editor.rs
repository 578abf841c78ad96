//! `devproof editor`: Check the editor configuration documents.

use std::path::Path;

use devproof_common::config::ValidatorConfig;
use devproof_common::types::ValidationReport;
use devproof_editor::EditorConfigPipeline;

/// Executes the `editor` command.
pub fn execute(project: &Path, config: &ValidatorConfig) -> ValidationReport {
    EditorConfigPipeline::new(config).validate(project)
}
