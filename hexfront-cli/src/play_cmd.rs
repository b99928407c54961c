//! Play command - drive a game from a command script
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_script(), play_script(), report_outcome()
//! - Level 3: apply_command(), settle_moves()
//! - Level 4: parsing and formatting utilities
//!
//! Script lines:
//!
//! ```text
//! # comment
//! unit 1 1     click the unit on hex (1, 1)
//! hex 1 3      click hex (1, 3)
//! end          end the current phase
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use hexfront_core::{EngineEvent, GameEngine, Hex, RulesConfig, Scenario};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Scenario JSON file
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Command script (reads stdin when omitted)
    #[arg(long, value_name = "FILE")]
    pub commands: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Save the final position as a scenario file
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Command {
    Hex(Hex),
    Unit(Hex),
    End,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// 1. Load scenario and script
/// 2. Feed each command to the engine
/// 3. Report the outcome and optionally save
pub fn run(args: PlayArgs, rules: RulesConfig) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario: {}", args.scenario.display()))?;
    let script = load_script(&args)?;
    let commands = parse_script(&script)?;

    tracing::info!("Playing {} commands", commands.len());

    let mut engine = GameEngine::new(scenario, rules);
    play_script(&mut engine, &commands, args.json)?;

    report_outcome(&engine);

    if let Some(path) = &args.save {
        engine
            .to_scenario()
            .save(path)
            .with_context(|| format!("Failed to save scenario: {}", path.display()))?;
        tracing::info!("Saved final position to {}", path.display());
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_script(args: &PlayArgs) -> Result<String> {
    match &args.commands {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read commands: {}", path.display())),
        None => {
            let mut script = String::new();
            std::io::stdin()
                .read_to_string(&mut script)
                .context("Failed to read commands from stdin")?;
            Ok(script)
        }
    }
}

fn play_script(engine: &mut GameEngine, commands: &[Command], json: bool) -> Result<()> {
    for command in commands {
        if engine.state().is_ended() {
            tracing::info!("Game over, ignoring remaining commands");
            break;
        }
        apply_command(engine, *command);
        for event in settle_moves(engine) {
            print_event(&event, json)?;
        }
    }
    Ok(())
}

fn report_outcome(engine: &GameEngine) {
    let state = engine.state();
    match state.winner {
        Some(winner) => println!("{:?} wins on turn {}", winner, state.turn),
        None => println!(
            "No winner yet: turn {}, {:?} to play, {:?} phase",
            state.turn, state.active_player, state.phase
        ),
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn apply_command(engine: &mut GameEngine, command: Command) {
    match command {
        Command::Hex(hex) => {
            engine.handle_hex_click(hex);
        }
        Command::Unit(hex) => engine.handle_unit_click_at(hex),
        Command::End => {
            engine.end_phase();
        }
    }
}

/// Drain events, completing every move animation as soon as it starts
fn settle_moves(engine: &mut GameEngine) -> Vec<EngineEvent> {
    let mut seen = Vec::new();
    loop {
        let batch = engine.drain_events();
        if batch.is_empty() {
            return seen;
        }
        for event in &batch {
            if let EngineEvent::UnitMoving { ticket, .. } = event {
                engine.complete_move(*ticket);
            }
        }
        seen.extend(batch);
    }
}

// ============================================================================
// LEVEL 4 - PARSING AND FORMATTING
// ============================================================================

fn parse_script(script: &str) -> Result<Vec<Command>> {
    script
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.split('#').next().unwrap_or("").trim();
            (!line.is_empty()).then_some((i + 1, line))
        })
        .map(|(number, line)| {
            parse_command(line).with_context(|| format!("line {}: '{}'", number, line))
        })
        .collect()
}

fn parse_command(line: &str) -> Result<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["end"] => Ok(Command::End),
        ["hex", x, y] => Ok(Command::Hex(parse_coords(x, y)?)),
        ["unit", x, y] => Ok(Command::Unit(parse_coords(x, y)?)),
        _ => bail!("unknown command"),
    }
}

fn parse_coords(x: &str, y: &str) -> Result<Hex> {
    let x = x.parse().context("invalid x")?;
    let y = y.parse().context("invalid y")?;
    Ok(Hex::new(x, y))
}

fn print_event(event: &EngineEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        EngineEvent::SelectionChanged {
            selected,
            highlighted,
        } => println!(
            "selection: {} unit(s), {} hex(es) highlighted",
            selected.len(),
            highlighted.len()
        ),
        EngineEvent::PhaseChanged {
            player,
            phase,
            turn,
        } => println!("turn {}: {:?} {:?}", turn, player, phase),
        EngineEvent::CombatResolved(report) => println!(
            "combat: {} vs {} on {} row, die {} -> {:?}",
            report.attack_strength, report.defense_strength, report.row_label, report.die, report.result
        ),
        EngineEvent::CurrentSpecialPhaseUpdated { special_phase } => {
            println!("special phase: {:?}", special_phase)
        }
        EngineEvent::WinnerUpdated { winner } => println!("winner: {:?}", winner),
        EngineEvent::UnitMoving { unit, path, .. } => {
            let steps: Vec<String> = path.iter().map(|h| format!("({}, {})", h.x, h.y)).collect();
            println!("unit {} moves {}", unit.0, steps.join(" -> "))
        }
        EngineEvent::UnitsRemoved { units } => println!("removed {} unit(s)", units.len()),
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
