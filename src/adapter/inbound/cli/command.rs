//! Command-line interface definitions.
//!
//! Defines the CLI structure for the chatlink client using `clap`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Resilient chat channel client
#[derive(Parser, Debug)]
#[command(name = "chatlink")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (defaults apply when it does not exist)
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect and relay stdin lines as chat messages (foreground)
    Run(RunArgs),

    /// Validate the configuration and print the effective settings
    CheckConfig,

    /// Print a freshly generated client identifier
    ClientId,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Override the endpoint URL (ws:// or wss://)
    #[arg(long)]
    pub url: Option<String>,

    /// Present this client id instead of generating one
    #[arg(long)]
    pub client_id: Option<String>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}
