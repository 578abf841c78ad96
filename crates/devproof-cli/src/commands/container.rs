//! `devproof container`: Build the dev container and run compile and tests in it.

use std::path::Path;

use clap::Args;
use devproof_common::config::ValidatorConfig;
use devproof_common::types::ValidationReport;
use devproof_container::ContainerPipeline;

/// Arguments for the `container` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ContainerArgs {
    /// Keep the built image instead of removing it afterwards.
    #[arg(long)]
    pub keep_image: bool,
}

/// Executes the `container` command.
///
/// The built image is removed afterwards unless `--keep-image` is given.
pub fn execute(args: &ContainerArgs, project: &Path, config: ValidatorConfig) -> ValidationReport {
    let pipeline = ContainerPipeline::new(config);
    let report = pipeline.validate(project);
    let tag = ContainerPipeline::image_tag(project);
    if args.keep_image {
        tracing::info!(tag, "keeping built image");
    } else {
        pipeline.cleanup(&tag);
    }
    report
}
