//! Game API endpoints
//!
//! Forward view input to the engine session and return the events it
//! produced together with the resulting state.

use crate::state::ServerState;
use axum::{extract::State, Json};
use hexfront_core::engine::MoveTicket;
use hexfront_core::state::PhaseTransition;
use hexfront_core::{GameEngine, Hex, Player, Scenario, UnitId};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

fn no_game() -> Json<Value> {
    Json(json!({
        "success": false,
        "error": "No game loaded"
    }))
}

/// Events drained from the engine plus its current snapshot
fn outcome(engine: &mut GameEngine, extra: Value) -> Json<Value> {
    let events = engine.drain_events();
    let mut body = json!({
        "success": true,
        "events": events,
        "state": engine.snapshot(),
    });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    Json(body)
}

/// Get current game state
pub async fn get_game_state(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let game = state.game.read().unwrap();
    match game.as_ref() {
        Some(engine) => Json(json!({
            "success": true,
            "state": engine.snapshot(),
        })),
        None => no_game(),
    }
}

/// Load request: inline scenario JSON or a file path
#[derive(Deserialize)]
pub struct LoadRequest {
    pub scenario: Option<Value>,
    pub path: Option<String>,
}

/// Start a game on a scenario
pub async fn load_scenario(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<LoadRequest>,
) -> Json<Value> {
    let loaded = match (req.scenario, req.path) {
        (Some(scenario), _) => Scenario::from_json(&scenario.to_string()),
        (None, Some(path)) => Scenario::load(std::path::Path::new(&path)),
        (None, None) => {
            return Json(json!({
                "success": false,
                "error": "Expected 'scenario' or 'path'"
            }))
        }
    };

    let scenario = match loaded {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::warn!("Scenario load failed: {}", e);
            return Json(json!({
                "success": false,
                "error": e.to_string()
            }));
        }
    };

    state.start_game(scenario);
    let mut game = state.game.write().unwrap();
    match game.as_mut() {
        Some(engine) => outcome(engine, json!({})),
        None => no_game(),
    }
}

/// Export the current map and units in scenario form
pub async fn export_scenario(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let game = state.game.read().unwrap();
    match game.as_ref() {
        Some(engine) => Json(json!({
            "success": true,
            "scenario": engine.to_scenario().to_file(),
        })),
        None => no_game(),
    }
}

#[derive(Deserialize)]
pub struct HexRequest {
    pub x: i32,
    pub y: i32,
}

/// Hex clicked in the view
pub async fn hex_click(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<HexRequest>,
) -> Json<Value> {
    let mut game = state.game.write().unwrap();
    let Some(engine) = game.as_mut() else {
        return no_game();
    };
    let ticket = engine.handle_hex_click(Hex::new(req.x, req.y));
    outcome(engine, json!({ "ticket": ticket }))
}

/// Unit clicked, by id or by hex
#[derive(Deserialize)]
pub struct UnitRequest {
    pub id: Option<u32>,
    pub x: Option<i32>,
    pub y: Option<i32>,
}

pub async fn unit_click(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<UnitRequest>,
) -> Json<Value> {
    let mut game = state.game.write().unwrap();
    let Some(engine) = game.as_mut() else {
        return no_game();
    };
    match (req.id, req.x, req.y) {
        (Some(id), _, _) => engine.handle_unit_click(UnitId(id)),
        (None, Some(x), Some(y)) => engine.handle_unit_click_at(Hex::new(x, y)),
        _ => {
            return Json(json!({
                "success": false,
                "error": "Expected 'id' or 'x' and 'y'"
            }))
        }
    }
    outcome(engine, json!({}))
}

/// End the current phase or special phase
pub async fn end_phase(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let mut game = state.game.write().unwrap();
    let Some(engine) = game.as_mut() else {
        return no_game();
    };
    let transition = match engine.end_phase() {
        Some(PhaseTransition::Rejected) => "rejected",
        Some(PhaseTransition::SpecialPhaseEnded(_)) => "special_phase_ended",
        Some(PhaseTransition::Phase(_)) => "phase",
        Some(PhaseTransition::TurnPassed(_)) => "turn_passed",
        None => "ignored",
    };
    outcome(engine, json!({ "transition": transition }))
}

#[derive(Deserialize)]
pub struct CompleteMoveRequest {
    pub ticket: u64,
}

/// The view finished animating a move
pub async fn complete_move(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<CompleteMoveRequest>,
) -> Json<Value> {
    let mut game = state.game.write().unwrap();
    let Some(engine) = game.as_mut() else {
        return no_game();
    };
    let committed = engine.complete_move(MoveTicket(req.ticket));
    outcome(engine, json!({ "committed": committed }))
}

/// Supplied hexes per player
pub async fn get_supply(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let game = state.game.read().unwrap();
    let Some(engine) = game.as_ref() else {
        return no_game();
    };
    let sorted = |player: Player| {
        let mut hexes: Vec<Hex> = engine.supplied_hexes(player).iter().copied().collect();
        hexes.sort();
        hexes
    };
    Json(json!({
        "success": true,
        "grey": sorted(Player::Grey),
        "green": sorted(Player::Green),
    }))
}
