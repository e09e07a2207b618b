//! # CLI Interface
//!
//! Defines the command-line argument structure for `termstake-node` using
//! `clap` derive. Supports two subcommands: `run` and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TERMSTAKE scenario runner.
///
/// Replays a JSON scenario file — deposits, clock advances, reward lookups,
/// withdrawals — against a fresh staking ledger on a manually driven clock,
/// then prints the resulting event log and balances as JSON on stdout.
#[derive(Parser, Debug)]
#[command(
    name = "termstake-node",
    about = "TERMSTAKE staking ledger scenario runner",
    version,
    propagate_version = true
)]
pub struct TermstakeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `termstake-node` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario file against a fresh ledger.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the scenario file (JSON).
    #[arg(long, short = 's', env = "TERMSTAKE_SCENARIO")]
    pub scenario: PathBuf,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "TERMSTAKE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log level when RUST_LOG is not set.
    #[arg(long, env = "TERMSTAKE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
