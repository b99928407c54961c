//! Integration tests for HEXFRONT
//!
//! Drives full games through the engine the way the view does

use hexfront_core::{
    dice::RngDie, GameEngine, Player, RulesConfig, Scenario, SpecialPhase, TurnPhase, UnitId,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn skirmish() -> Scenario {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../scenarios/skirmish.json");
    Scenario::load(&path).unwrap()
}

fn seeded_engine(seed: u64) -> GameEngine {
    let rules = RulesConfig::default().with_seed(seed);
    GameEngine::with_die(skirmish(), rules, Box::new(RngDie::seeded(seed)))
}

fn own_units(engine: &GameEngine) -> Vec<UnitId> {
    let player = engine.state().active_player;
    let mut ids: Vec<UnitId> = engine.field().units_of(player).map(|u| u.id).collect();
    ids.sort();
    ids
}

/// Settle every special phase: absorb losses on the first involved attacker, skip advances
fn settle_special_phases(engine: &mut GameEngine) {
    for _ in 0..10 {
        match engine.state().current_special_phase() {
            Some(SpecialPhase::AttackerDamage) => {
                let pick = engine.state().involved_attackers[0];
                engine.handle_unit_click(pick);
            }
            Some(SpecialPhase::Advance) => {
                engine.end_phase();
            }
            None => return,
        }
    }
    panic!("special phases did not settle");
}

/// One full player turn with random legal moves and attacks
fn play_turn(engine: &mut GameEngine, rng: &mut ChaCha8Rng) {
    if engine.state().is_ended() {
        return;
    }
    for id in own_units(engine) {
        engine.handle_unit_click(id);
        let targets: Vec<_> = engine
            .highlighted()
            .iter()
            .copied()
            .filter(|&hex| engine.is_valid_move(hex))
            .collect();
        match targets.choose(rng) {
            Some(&hex) => {
                let ticket = engine.handle_hex_click(hex).unwrap();
                assert!(engine.complete_move(ticket));
            }
            None => engine.handle_unit_click(id),
        }
        if engine.state().is_ended() {
            return;
        }
    }
    engine.end_phase();
    assert_eq!(engine.state().phase, TurnPhase::Attack);

    for id in own_units(engine) {
        if engine.field().unit(id).map_or(true, |u| u.attacked) {
            continue;
        }
        engine.handle_unit_click(id);
        let Some(&target) = engine.highlighted().first() else {
            engine.handle_unit_click(id);
            continue;
        };
        engine.handle_unit_click_at(target);
        if engine.state().is_ended() {
            return;
        }
        settle_special_phases(engine);
    }
    engine.end_phase();
}

fn assert_consistent(engine: &GameEngine) {
    let grid = engine.grid();
    let mut seen = Vec::new();
    for unit in engine.field().units() {
        assert!(grid.contains(unit.position), "unit {:?} off the grid", unit.id);
        assert_eq!(grid.occupant(unit.position).map(|o| o.id), Some(unit.id));
        assert!(!unit.is_dead());
        assert!(!seen.contains(&unit.position), "two units on {:?}", unit.position);
        seen.push(unit.position);
    }
    let occupied = grid.tiles().filter(|t| t.occupant.is_some()).count();
    assert_eq!(occupied, engine.field().unit_count());
}

// ============================================================================
// FULL GAMES
// ============================================================================

#[test]
fn test_random_games_keep_board_consistent() {
    for seed in 0..5 {
        let mut engine = seeded_engine(seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..30 {
            play_turn(&mut engine, &mut rng);
            engine.drain_events();
            assert_consistent(&engine);
            if engine.state().is_ended() {
                break;
            }
        }
        if let Some(winner) = engine.state().winner {
            assert_eq!(engine.winner(), Some(winner));
        }
    }
}

#[test]
fn test_seeded_games_replay_identically() {
    let mut first = seeded_engine(42);
    let mut second = seeded_engine(42);
    let mut rng_a = ChaCha8Rng::seed_from_u64(7);
    let mut rng_b = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..10 {
        play_turn(&mut first, &mut rng_a);
        play_turn(&mut second, &mut rng_b);
    }
    assert_eq!(
        serde_json::to_value(first.snapshot()).unwrap(),
        serde_json::to_value(second.snapshot()).unwrap()
    );
}

#[test]
fn test_saved_position_reloads() {
    let mut engine = seeded_engine(3);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    play_turn(&mut engine, &mut rng);

    let json = engine.to_scenario().to_json().unwrap();
    let reloaded = GameEngine::new(Scenario::from_json(&json).unwrap(), RulesConfig::default());

    assert_eq!(reloaded.field().unit_count(), engine.field().unit_count());
    for unit in engine.field().units() {
        let copy = reloaded.field().unit_at(unit.position).unwrap();
        assert_eq!(copy.unit_type, unit.unit_type);
        assert_eq!(copy.player, unit.player);
    }
    assert_eq!(reloaded.state().active_player, Player::Grey);
}
