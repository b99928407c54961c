//! Inspect commands - read-only views of a scenario
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_inspect(), run_reach(), run_supply() - orchestration
//! - Level 2: load_scenario(), summarize(), reach_report(), supply_report()
//! - Level 3: (delegated to hexfront-core)
//! - Level 4: formatting utilities

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use hexfront_core::pathfinder::unit_reachability;
use hexfront_core::supply::supplied_hexes;
use hexfront_core::{GameEngine, Hex, Player, RulesConfig, Scenario};

use crate::parse_hex;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct InspectArgs {
    /// Scenario JSON file
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ReachArgs {
    /// Scenario JSON file
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Hex of the moving unit, as x,y
    #[arg(long, value_parser = parse_hex)]
    pub from: Hex,

    /// Print the path to this hex, as x,y
    #[arg(long, value_parser = parse_hex)]
    pub to: Option<Hex>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SupplyArgs {
    /// Scenario JSON file
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ScenarioSummary {
    width: i32,
    height: i32,
    hexes: usize,
    starting_player: Player,
    terrain: BTreeMap<String, usize>,
    units: BTreeMap<String, usize>,
    supplied: BTreeMap<String, usize>,
    winner: Option<Player>,
}

#[derive(Debug, Serialize)]
struct ReachReport {
    from: Hex,
    movement: u32,
    reachable: Vec<(Hex, f32)>,
    path: Option<Vec<Hex>>,
}

#[derive(Debug, Serialize)]
struct SupplyReport {
    player: Player,
    supplied_hexes: usize,
    units_out_of_supply: Vec<Hex>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run inspect command
pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let summary = summarize(scenario);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Run reach command
pub fn run_reach(args: ReachArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let report = reach_report(scenario, args.from, args.to)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Unit at ({}, {}) has {} movement points, {} hexes reachable",
        report.from.x,
        report.from.y,
        report.movement,
        report.reachable.len()
    );
    for (hex, cost) in &report.reachable {
        println!("  ({}, {})  cost {:.1}", hex.x, hex.y, cost);
    }
    match (&report.path, args.to) {
        (Some(path), _) => println!("Path: {}", format_path(path)),
        (None, Some(to)) => println!("No path to ({}, {})", to.x, to.y),
        (None, None) => {}
    }
    Ok(())
}

/// Run supply command
pub fn run_supply(args: SupplyArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let reports = supply_report(scenario);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "{:?}: {} hexes in supply, {} unit(s) out of supply",
            report.player,
            report.supplied_hexes,
            report.units_out_of_supply.len()
        );
        for hex in &report.units_out_of_supply {
            println!("  ({}, {})", hex.x, hex.y);
        }
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_scenario(path: &Path) -> Result<Scenario> {
    Scenario::load(path).with_context(|| format!("Failed to load scenario: {}", path.display()))
}

fn summarize(scenario: Scenario) -> ScenarioSummary {
    let grid = &scenario.field.grid;
    let mut terrain = BTreeMap::new();
    for tile in grid.tiles() {
        *terrain.entry(tile.terrain.properties().name.to_string()).or_insert(0) += 1;
    }
    let mut units = BTreeMap::new();
    for unit in scenario.field.units() {
        let key = format!("{:?} {}", unit.player, unit.stats().name);
        *units.entry(key).or_insert(0) += 1;
    }
    let mut supplied = BTreeMap::new();
    for player in Player::ALL {
        let count = supplied_hexes(grid, &scenario.supply, player).len();
        supplied.insert(format!("{:?}", player), count);
    }

    let summary = ScenarioSummary {
        width: grid.size().width,
        height: grid.size().height,
        hexes: grid.tiles().count(),
        starting_player: scenario.starting_player,
        terrain,
        units,
        supplied,
        winner: None,
    };
    let engine = GameEngine::new(scenario, RulesConfig::default());
    ScenarioSummary {
        winner: engine.winner(),
        ..summary
    }
}

fn reach_report(scenario: Scenario, from: Hex, to: Option<Hex>) -> Result<ReachReport> {
    // Start an engine so supply flags are current
    let engine = GameEngine::new(scenario, RulesConfig::default());
    let unit = engine
        .field()
        .unit_at(from)
        .with_context(|| format!("No unit at ({}, {})", from.x, from.y))?;

    let reach = unit_reachability(engine.grid(), unit);
    let reachable = reach
        .reachable
        .iter()
        .map(|hex| (*hex, reach.g_score.get(hex).copied().unwrap_or_default()))
        .collect();
    let path = to.filter(|t| reach.contains(*t)).and_then(|t| reach.path_to(t));

    Ok(ReachReport {
        from,
        movement: unit.effective_movement(),
        reachable,
        path,
    })
}

fn supply_report(scenario: Scenario) -> Vec<SupplyReport> {
    let engine = GameEngine::new(scenario, RulesConfig::default());
    Player::ALL
        .into_iter()
        .map(|player| SupplyReport {
            player,
            supplied_hexes: engine.supplied_hexes(player).len(),
            units_out_of_supply: engine
                .field()
                .units_of(player)
                .filter(|u| !u.supplied)
                .map(|u| u.position)
                .collect(),
        })
        .collect()
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn print_summary(summary: &ScenarioSummary) {
    println!(
        "Scenario {}x{} ({} hexes), {:?} moves first",
        summary.width, summary.height, summary.hexes, summary.starting_player
    );
    println!("Terrain:");
    for (name, count) in &summary.terrain {
        println!("  {:<10} {}", name, count);
    }
    println!("Units:");
    for (name, count) in &summary.units {
        println!("  {:<16} {}", name, count);
    }
    println!("Supplied hexes:");
    for (player, count) in &summary.supplied {
        println!("  {:<6} {}", player, count);
    }
    if let Some(winner) = summary.winner {
        println!("Already decided: {:?} wins", winner);
    }
}

fn format_path(path: &[Hex]) -> String {
    path.iter()
        .map(|h| format!("({}, {})", h.x, h.y))
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ============================================================================
// TESTS
// ============================================================================
