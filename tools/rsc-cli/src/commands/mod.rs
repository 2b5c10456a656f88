//! CLI command implementations.

pub mod config;
pub mod simulate;

use clap::{Args, Subcommand};

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to the script (TOML).
    pub script: String,

    /// Stop at the first failed action instead of reporting it and continuing.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Print the path of the config file in use.
    Path,
    /// Write a default config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
