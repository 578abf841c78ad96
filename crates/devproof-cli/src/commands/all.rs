//! `devproof all`: Run both pipelines.

use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use devproof_common::aggregate::{build_report, exception_result};
use devproof_common::config::ValidatorConfig;
use devproof_common::constants::EDITOR_PIPELINE;
use devproof_common::types::ValidationReport;

use super::{container, editor};

/// Arguments for the `all` command.
#[derive(Args, Debug)]
pub struct AllArgs {
    #[command(flatten)]
    container: container::ContainerArgs,
}

/// Executes the `all` command.
///
/// The editor pipeline only reads documents, so it runs alongside the
/// container pipeline. Reports come back container first.
pub fn execute(args: &AllArgs, project: &Path, config: ValidatorConfig) -> Vec<ValidationReport> {
    let editor_config = config.clone();
    thread::scope(|scope| {
        let editor = scope.spawn(|| editor::execute(project, &editor_config));
        let container = container::execute(&args.container, project, config);
        let editor = editor.join().unwrap_or_else(|_| {
            tracing::error!("editor pipeline panicked");
            build_report(
                EDITOR_PIPELINE,
                Utc::now(),
                Duration::ZERO,
                vec![exception_result(EDITOR_PIPELINE, &"pipeline panicked")],
            )
        });
        vec![container, editor]
    })
}
