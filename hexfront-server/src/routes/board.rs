//! Board and rules-table endpoints

use crate::state::ServerState;
use axum::{extract::State, Json};
use hexfront_core::terrain::TERRAIN_PROPERTIES;
use hexfront_core::unit::UNIT_STATS;
use hexfront_core::{HexLayout, HexTile, TerrainType};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Serialize)]
pub struct BoardInfo<'a> {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<&'a HexTile>,
    pub layout: HexLayout,
    /// Bounding-box corner of each tile, in tile order
    pub positions: Vec<(f32, f32)>,
    pub neighbor_names: Vec<&'static str>,
    pub edge_names: Vec<&'static str>,
}

/// Get the loaded grid: size, terrain, owners, rivers, roads, occupants
pub async fn get_board(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let game = state.game.read().unwrap();
    let Some(engine) = game.as_ref() else {
        return Json(json!({
            "success": false,
            "error": "No game loaded"
        }));
    };
    let grid = engine.grid();
    let layout = HexLayout { radius: 28.0 };
    let board = BoardInfo {
        width: grid.size().width,
        height: grid.size().height,
        tiles: grid.tiles().collect(),
        layout,
        positions: grid.tiles().map(|tile| layout.position(tile.hex)).collect(),
        neighbor_names: vec!["N", "NE", "SE", "S", "SW", "NW"],
        edge_names: vec!["SE", "S", "SW", "NW", "N", "NE"],
    };
    Json(json!({
        "success": true,
        "board": board,
    }))
}

#[derive(Serialize)]
struct TerrainInfo {
    terrain: TerrainType,
    movement_cost: f32,
    attack_modifier: Option<f32>,
    defender_crt_shift: i32,
    impassable: bool,
}

/// Terrain, unit and combat tables in effect
pub async fn get_rules(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let terrain: Vec<TerrainInfo> = TerrainType::ALL
        .into_iter()
        .zip(TERRAIN_PROPERTIES.iter())
        .map(|(terrain, props)| TerrainInfo {
            terrain,
            movement_cost: props.movement_cost,
            attack_modifier: props.attack_modifier,
            defender_crt_shift: props.defender_crt_shift,
            impassable: props.is_impassable(),
        })
        .collect();

    let units: Vec<Value> = UNIT_STATS
        .iter()
        .map(|stats| {
            json!({
                "name": stats.name,
                "attack": [stats.attack, stats.reduced_attack],
                "defense": [stats.defense, stats.reduced_defense],
                "movement": stats.movement,
                "supply_exempt": stats.supply_exempt,
            })
        })
        .collect();

    let rules = state.rules.read().unwrap();
    Json(json!({
        "terrain": terrain,
        "units": units,
        "combat_table": rules.combat_table,
        "supply_penalty_in_combat": rules.supply_penalty_in_combat,
    }))
}
