//! Command-line interface for `kitchen-sim`.
//!
//! Flags override the environment configuration loaded by [`Config::from_env`].

use crate::config::{Config, PacingMode};
use clap::{Args, Parser, Subcommand};

/// Restaurant kitchen simulator
#[derive(Debug, Parser)]
#[command(name = "kitchen-sim", version, about = "Replay restaurant orders through a simulated kitchen")]
pub struct Cli {
    /// Command to run (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The selected command, `run` with no overrides when none was given
    #[must_use]
    pub fn into_command(self) -> Command {
        self.command.unwrap_or_else(|| Command::Run(RunArgs::default()))
    }
}

/// Subcommands
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Reset the orders table and run the simulation
    Run(RunArgs),
    /// Print status-over-time, status and timing summaries
    Report(ReportArgs),
}

/// Overrides for `run`
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct RunArgs {
    /// Virtual seconds per wall second
    #[arg(long, env = "SIMULATION_SPEED")]
    pub speed: Option<f64>,
    /// Number of cooks
    #[arg(long, env = "NUM_COOKS")]
    pub cooks: Option<usize>,
    /// Do not pace against the wall clock
    #[arg(long)]
    pub instant: bool,
}

impl RunArgs {
    /// Apply the overrides to `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(speed) = self.speed {
            config.simulation.speed = speed;
        }
        if let Some(cooks) = self.cooks {
            config.simulation.num_cooks = cooks;
        }
        if self.instant {
            config.simulation.pacing = PacingMode::Instant;
        }
    }
}

/// Overrides for `report`
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct ReportArgs {
    /// Bucket width in seconds for the status table
    #[arg(long = "bucket", value_name = "SECS", env = "REPORT_BUCKET_SECONDS")]
    pub bucket_seconds: Option<u64>,
}

impl ReportArgs {
    /// Apply the overrides to `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(bucket_seconds) = self.bucket_seconds {
            config.report.bucket_seconds = bucket_seconds;
        }
    }
}
