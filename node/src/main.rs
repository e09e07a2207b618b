// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # TERMSTAKE Scenario Runner
//!
//! Entry point for the `termstake-node` binary. Parses CLI arguments,
//! initializes logging, and replays a JSON scenario file against a fresh
//! staking ledger on a manually driven clock.
//!
//! The binary supports two subcommands:
//!
//! - `run`     — replay a scenario file, print the report JSON on stdout
//! - `version` — print build version information

mod cli;
mod logging;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Commands, TermstakeCli};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = TermstakeCli::parse();

    match cli.command {
        Commands::Run(args) => run_scenario(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads, replays, and reports a scenario.
fn run_scenario(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        &format!("termstake_node={0},termstake_ledger={0}", args.log_level),
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(scenario = %args.scenario.display(), "replaying scenario");

    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read scenario file: {}", args.scenario.display()))?;
    let parsed: scenario::Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse scenario file: {}", args.scenario.display()))?;

    let report = scenario::run(&parsed)?;
    tracing::info!(
        steps = report.outcomes.len(),
        events = report.events.len(),
        "replay complete"
    );

    // Report on stdout, logs on stderr.
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Prints version information.
fn print_version() {
    println!("termstake-node {}", env!("CARGO_PKG_VERSION"));
}
