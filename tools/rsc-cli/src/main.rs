//! rsc-nav - Command line tool for the streamed-content navigator.
//!
//! Commands:
//! - `rsc-nav simulate` - Run a scripted navigation session
//! - `rsc-nav config` - Inspect and manage navigator configuration

mod commands;
mod context;
mod output;
mod script;

use anyhow::{Context as _, Result};
use clap::{ArgAction, Parser, Subcommand};
use rsc_observability::{init_logging, LogConfig, LogFormat};

use commands::{ConfigArgs, SimulateArgs};

/// rsc-nav - Drive and inspect client navigation sessions
#[derive(Parser)]
#[command(name = "rsc-nav")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Log format: pretty, compact or json
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted navigation session
    Simulate(SimulateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = match (cli.log_format, cli.json) {
        (Some(format), _) => format,
        (None, true) => LogFormat::Json,
        (None, false) => LogFormat::Compact,
    };
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(format))
        .context("Failed to initialize logging")?;

    let output = output::Output::new(cli.verbose > 0, cli.json);

    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let result = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
