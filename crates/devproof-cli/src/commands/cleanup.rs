//! `devproof cleanup`: Remove what an earlier `container --keep-image` left behind.

use std::path::Path;

use devproof_common::config::ValidatorConfig;
use devproof_container::ContainerPipeline;

/// Executes the `cleanup` command and returns the tag it cleaned.
///
/// Never fails; problems are logged.
pub fn execute(project: &Path, config: ValidatorConfig) -> String {
    let tag = ContainerPipeline::image_tag(project);
    ContainerPipeline::new(config).cleanup(&tag);
    tag
}
