//! Scenario files: the persisted map and unit layout
//!
//! Two layouts are read. The current one is an object with grid size,
//! starting player, supply configuration and a `hexList`. The old one is a
//! bare array of hex entries, where `flag: true` plus a hex-level `player`
//! marks an owned flag and `unit` may be a plain unit type name.

use std::path::Path;

use crate::battlefield::Battlefield;
use crate::board::{GridSize, Hex, EDGE_COUNT};
use crate::error::{Result, ScenarioError};
use crate::grid::Grid;
use crate::supply::{SupplyConfig, SupplyEdges};
use crate::terrain::TerrainType;
use crate::unit::{Player, UnitType};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// FILE FORMAT
// ============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFile {
    pub width: i32,
    pub height: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_player: Option<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1_supply_edges: Option<SupplyEdges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_supply_edges: Option<SupplyEdges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_cities: Option<SupplyCities>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub player1_supply_cities: Vec<Hex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub player2_supply_cities: Vec<Hex>,
    #[serde(default)]
    pub hex_list: Vec<HexEntry>,
}

/// Combined list (each city serves whoever owns it) or per-player lists
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SupplyCities {
    Combined(Vec<Hex>),
    PerPlayer {
        #[serde(default)]
        grey: Vec<Hex>,
        #[serde(default)]
        green: Vec<Hex>,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexEntry {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub terrain: Option<TerrainType>,
    #[serde(default)]
    pub unit: Option<UnitEntry>,
    #[serde(default)]
    pub owner: Option<Player>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub river_edges: Vec<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roads: Vec<bool>,
    /// Old format: any truthy value marks a flag hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<serde_json::Value>,
    /// Old format: owner of the flag and of a plain-name unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitEntry {
    Typed {
        #[serde(rename = "unitType", alias = "type")]
        unit_type: String,
        #[serde(default)]
        player: Option<Player>,
    },
    Name(String),
}

fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// SCENARIO
// ============================================================================

/// A loaded scenario, ready to start an engine
#[derive(Clone, Debug)]
pub struct Scenario {
    pub field: Battlefield,
    pub supply: SupplyConfig,
    pub starting_player: Player,
}

impl Scenario {
    /// Empty clear-terrain map supplied from the home edges
    pub fn empty(size: GridSize) -> Self {
        Self {
            field: Battlefield::new(Grid::new(size)),
            supply: SupplyConfig::home_edges(),
            starting_player: Player::Grey,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_json(&json)?;
        tracing::info!(
            "Loaded scenario {} ({}x{}, {} units)",
            path.display(),
            scenario.field.grid.size().width,
            scenario.field.grid.size().height,
            scenario.field.unit_count()
        );
        Ok(scenario)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let file = if value.is_array() {
            let hex_list: Vec<HexEntry> = serde_json::from_value(value)?;
            let width = hex_list.iter().map(|h| h.x + 1).max().unwrap_or(0);
            let height = hex_list.iter().map(|h| h.y + 1).max().unwrap_or(0);
            ScenarioFile {
                width,
                height,
                hex_list,
                ..Default::default()
            }
        } else {
            serde_json::from_value(value)?
        };
        Self::from_file(file)
    }

    pub fn from_file(file: ScenarioFile) -> Result<Self> {
        if file.width <= 0 || file.height <= 0 {
            return Err(ScenarioError::InvalidDimensions {
                width: file.width,
                height: file.height,
            });
        }
        let mut field = Battlefield::new(Grid::new(GridSize::new(file.width, file.height)));

        for entry in &file.hex_list {
            if !field.grid.contains(Hex::new(entry.x, entry.y)) {
                tracing::warn!("Skipping hex entry ({}, {}) outside the grid", entry.x, entry.y);
                continue;
            }
            apply_entry(&mut field, entry)?;
        }
        let repaired = field.grid.normalize_rivers();
        if repaired > 0 {
            tracing::warn!("Moved {} river record(s) to their owning hex", repaired);
        }

        let edges = [
            file.player1_supply_edges.unwrap_or(SupplyEdges::WEST),
            file.player2_supply_edges.unwrap_or(SupplyEdges::EAST),
        ];
        let mut cities: [Vec<Hex>; 2] = [file.player1_supply_cities.clone(), file.player2_supply_cities.clone()];
        match &file.supply_cities {
            Some(SupplyCities::Combined(list)) => {
                for list_of in cities.iter_mut() {
                    list_of.extend(list.iter().copied());
                }
            }
            Some(SupplyCities::PerPlayer { grey, green }) => {
                cities[Player::Grey.index()].extend(grey.iter().copied());
                cities[Player::Green.index()].extend(green.iter().copied());
            }
            None => {}
        }
        for list in cities.iter_mut() {
            list.sort();
            list.dedup();
            list.retain(|&hex| field.grid.contains(hex));
        }

        Ok(Self {
            field,
            supply: SupplyConfig { edges, cities },
            starting_player: file.starting_player.unwrap_or(Player::Grey),
        })
    }

    /// Serialize to the current file layout
    pub fn to_file(&self) -> ScenarioFile {
        let grid = &self.field.grid;
        let hex_list = grid
            .tiles()
            .map(|tile| HexEntry {
                x: tile.hex.x,
                y: tile.hex.y,
                terrain: Some(tile.terrain),
                unit: self.field.unit_at(tile.hex).map(|unit| UnitEntry::Typed {
                    unit_type: unit.stats().name.to_string(),
                    player: Some(unit.player),
                }),
                owner: tile.owner,
                river_edges: tile.river_edges.iter().map(|&e| e as i64).collect(),
                roads: tile.roads.to_vec(),
                flag: None,
                player: None,
            })
            .collect();

        ScenarioFile {
            width: grid.size().width,
            height: grid.size().height,
            starting_player: Some(self.starting_player),
            player1_supply_edges: Some(self.supply.edges[Player::Grey.index()]),
            player2_supply_edges: Some(self.supply.edges[Player::Green.index()]),
            supply_cities: Some(SupplyCities::PerPlayer {
                grey: self.supply.cities[Player::Grey.index()].clone(),
                green: self.supply.cities[Player::Green.index()].clone(),
            }),
            player1_supply_cities: Vec::new(),
            player2_supply_cities: Vec::new(),
            hex_list,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_file())?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn apply_entry(field: &mut Battlefield, entry: &HexEntry) -> Result<()> {
    let hex = Hex::new(entry.x, entry.y);
    let is_old_flag = entry.flag.as_ref().is_some_and(is_truthy);
    let terrain = match entry.terrain {
        Some(TerrainType::Clear) | None if is_old_flag => TerrainType::Flag,
        Some(terrain) => terrain,
        None => TerrainType::Clear,
    };
    let owner = entry.owner.or(if is_old_flag { entry.player } else { None });

    let river_edges = sanitize_river_edges(hex, &entry.river_edges);
    let roads = sanitize_roads(hex, &entry.roads);

    if let Some(tile) = field.grid.tile_mut(hex) {
        tile.terrain = terrain;
        tile.owner = if terrain.is_ownable() { owner } else { None };
        tile.river_edges = river_edges;
        tile.roads = roads;
    }

    if let Some(unit) = &entry.unit {
        let (name, player) = match unit {
            UnitEntry::Typed { unit_type, player } => (unit_type.as_str(), player.or(entry.player)),
            UnitEntry::Name(name) => (name.as_str(), entry.player),
        };
        let unit_type = UnitType::from_name(name).ok_or_else(|| ScenarioError::UnknownUnitType(name.to_string()))?;
        let player = player.ok_or(ScenarioError::MissingUnitPlayer { x: entry.x, y: entry.y })?;
        field.place_unit(hex, unit_type, player);
    }
    Ok(())
}

fn sanitize_river_edges(hex: Hex, raw: &[i64]) -> Vec<u8> {
    let mut edges: Vec<u8> = Vec::with_capacity(raw.len());
    for &edge in raw {
        match u8::try_from(edge) {
            Ok(edge) if edge < EDGE_COUNT => {
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
            _ => tracing::warn!("Dropping river edge {} on ({}, {})", edge, hex.x, hex.y),
        }
    }
    edges
}

fn sanitize_roads(hex: Hex, raw: &[bool]) -> [bool; 6] {
    if !raw.is_empty() && raw.len() != EDGE_COUNT as usize {
        tracing::warn!("Road list on ({}, {}) has {} entries", hex.x, hex.y, raw.len());
    }
    let mut roads = [false; 6];
    for (slot, &value) in roads.iter_mut().zip(raw) {
        *slot = value;
    }
    roads
}
