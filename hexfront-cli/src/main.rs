//! HEXFRONT CLI - Command-line interface
//!
//! Commands:
//! - inspect: Summarize a scenario
//! - reach: Show where a unit can move
//! - supply: Show each side's supply network
//! - play: Drive a game from a command script
//! - serve: Start the browser view server

mod inspect_cmd;
mod play_cmd;
mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hexfront_core::{Hex, RulesConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexfront")]
#[command(about = "HEXFRONT hex wargame rules engine")]
struct Cli {
    /// Rules configuration JSON (combat table, seed)
    #[arg(long, global = true, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Die seed, overrides the rules file
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a scenario file
    Inspect(inspect_cmd::InspectArgs),
    /// List hexes reachable by the unit on a hex
    Reach(inspect_cmd::ReachArgs),
    /// Show supplied hexes and units out of supply
    Supply(inspect_cmd::SupplyArgs),
    /// Play a scripted game
    Play(play_cmd::PlayArgs),
    /// Start the browser view server
    Serve(server::ServerArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rules = load_rules(cli.rules.as_deref(), cli.seed)?;

    match cli.command {
        Commands::Inspect(args) => inspect_cmd::run_inspect(args),
        Commands::Reach(args) => inspect_cmd::run_reach(args),
        Commands::Supply(args) => inspect_cmd::run_supply(args),
        Commands::Play(args) => play_cmd::run(args, rules),
        Commands::Serve(args) => server::run(args, rules),
    }
}

/// Rules from an optional file, with the seed flag taking precedence
pub fn load_rules(path: Option<&Path>, seed: Option<u64>) -> Result<RulesConfig> {
    let rules = match path {
        Some(path) => RulesConfig::load(path)
            .with_context(|| format!("Failed to load rules: {}", path.display()))?,
        None => RulesConfig::default(),
    };
    Ok(match seed {
        Some(seed) => rules.with_seed(seed),
        None => rules,
    })
}

/// Parse "x,y" into a hex
pub fn parse_hex(value: &str) -> Result<Hex, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{}'", value))?;
    let x = x.trim().parse().map_err(|_| format!("invalid x in '{}'", value))?;
    let y = y.trim().parse().map_err(|_| format!("invalid y in '{}'", value))?;
    Ok(Hex::new(x, y))
}
