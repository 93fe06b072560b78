// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All run logic is delegated to Layer 2 (application).
//
// One invocation = one run; --mission selects what it does:
//   1. `train`   - fine-tune on the train split, dev each epoch
//   2. `eval`    - score a saved run on the dev split
//   3. `predict` - load the test split and the saved model
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::RunArgs;

use crate::application::mission::MissionOrchestrator;
use crate::domain::config::RunConfig;
use crate::ml::toolkit::BurnToolkit;

/// The main CLI struct. clap reads the fields and generates
/// argument parsing code via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "csqa-runner",
    version = "0.1.0",
    about = "Train, evaluate or predict multiple-choice QA tasks on pretrained-model tokenizers."
)]
pub struct Cli {
    #[command(flatten)]
    pub args: RunArgs,
}

impl Cli {
    /// Validate the flags, then hand the run to the orchestrator.
    /// This keeps the CLI layer thin: it only routes, never computes.
    pub fn run(self) -> Result<()> {
        let config = RunConfig::try_from(self.args).context("Invalid command line")?;
        tracing::info!(
            "Starting '{}' mission for task '{}'",
            config.mission.as_str(),
            config.task_name
        );

        let mut orchestrator = MissionOrchestrator::new(BurnToolkit);
        let report = orchestrator.run(config)?;

        println!(
            "Mission '{}' finished in {:.1}s. Results in '{}'",
            report.mission.as_str(),
            report.elapsed.as_secs_f64(),
            report.result_dir.display()
        );
        Ok(())
    }
}
