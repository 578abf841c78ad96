//! CLI command definitions and dispatch.

pub mod all;
pub mod cleanup;
pub mod container;
pub mod editor;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use devproof_common::config::ValidatorConfig;
use devproof_common::types::ValidationReport;

use crate::output;

/// devproof: validate development containers and editor configuration.
#[derive(Parser, Debug)]
#[command(name = "devproof", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Project root to validate.
    #[arg(long, short, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Container runtime binary (overrides `DEVPROOF_RUNTIME`).
    #[arg(long, global = true)]
    pub runtime: Option<String>,

    /// Timeout for build, compile and test commands, in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print reports as JSON instead of the human-readable listing.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl Cli {
    /// Resolves the run configuration: defaults, then environment, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is invalid.
    pub fn config(&self) -> anyhow::Result<ValidatorConfig> {
        let mut config = ValidatorConfig::from_env()?;
        if let Some(runtime) = &self.runtime {
            config = config.with_runtime(runtime.as_str())?;
        }
        if let Some(secs) = self.timeout {
            config = config.with_command_timeout(secs)?;
        }
        Ok(config)
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the dev container image and run the project's compile and tests in it.
    Container(container::ContainerArgs),
    /// Check launch, tasks, settings and extensions documents.
    Editor,
    /// Run the container and editor pipelines together.
    All(all::AllArgs),
    /// Remove the image and generated files of an earlier container run.
    Cleanup,
}

/// Dispatches the parsed CLI command to its handler.
///
/// Exits with failure when any report contains a failed stage.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the project directory
/// does not exist, or the output cannot be written.
pub fn execute(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = cli.config()?;
    if !cli.project.is_dir() {
        anyhow::bail!("project directory {} does not exist", cli.project.display());
    }
    tracing::debug!(project = %cli.project.display(), runtime = %config.runtime, "resolved configuration");

    let reports = match &cli.command {
        Command::Container(args) => vec![container::execute(args, &cli.project, config)],
        Command::Editor => vec![editor::execute(&cli.project, &config)],
        Command::All(args) => all::execute(args, &cli.project, config),
        Command::Cleanup => {
            let tag = cleanup::execute(&cli.project, config);
            output::cleaned(&mut std::io::stdout().lock(), &tag)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    output::emit(&mut std::io::stdout().lock(), &reports, cli.json)?;
    Ok(if reports.iter().all(ValidationReport::success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
