//! Terrain type definitions

use serde::{Deserialize, Serialize};

/// Movement cost that no unit can ever pay (impassable terrain, occupied hexes)
pub const MAX_MOVEMENT_COST: f32 = 99.0;

/// Terrain of a single hex
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    #[default]
    Clear,
    Forest,
    Swamp,
    Water,
    Mountain,
    City,
    Flag,
}

/// Per-terrain rules
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainProperties {
    pub name: &'static str,
    /// Movement points spent entering the hex
    pub movement_cost: f32,
    /// Multiplier on the strength of a unit attacking out of this hex
    pub attack_modifier: Option<f32>,
    /// Combat table row shift when the defender stands here (negative favors defender)
    pub defender_crt_shift: i32,
}

impl TerrainProperties {
    const fn new(
        name: &'static str,
        movement_cost: f32,
        attack_modifier: Option<f32>,
        defender_crt_shift: i32,
    ) -> Self {
        Self {
            name,
            movement_cost,
            attack_modifier,
            defender_crt_shift,
        }
    }

    pub fn is_impassable(&self) -> bool {
        self.movement_cost >= MAX_MOVEMENT_COST
    }
}

/// Indexed by `TerrainType as usize`
pub static TERRAIN_PROPERTIES: [TerrainProperties; 7] = [
    TerrainProperties::new("clear", 1.0, None, 0),
    TerrainProperties::new("forest", 2.0, None, -1),
    TerrainProperties::new("swamp", 3.0, Some(0.5), 0),
    TerrainProperties::new("water", MAX_MOVEMENT_COST, None, 0),
    TerrainProperties::new("mountain", 3.0, None, -2),
    TerrainProperties::new("city", 1.0, None, -1),
    TerrainProperties::new("flag", 1.0, None, 0),
];

impl TerrainType {
    pub const ALL: [TerrainType; 7] = [
        TerrainType::Clear,
        TerrainType::Forest,
        TerrainType::Swamp,
        TerrainType::Water,
        TerrainType::Mountain,
        TerrainType::City,
        TerrainType::Flag,
    ];

    pub fn properties(self) -> &'static TerrainProperties {
        &TERRAIN_PROPERTIES[self as usize]
    }

    pub fn movement_cost(self) -> f32 {
        self.properties().movement_cost
    }

    /// Attack multiplier, 1 when the terrain defines none
    pub fn attack_modifier(self) -> f32 {
        self.properties().attack_modifier.unwrap_or(1.0)
    }

    pub fn defender_crt_shift(self) -> i32 {
        self.properties().defender_crt_shift
    }

    /// City and flag hexes carry an owner
    pub fn is_ownable(self) -> bool {
        matches!(self, TerrainType::City | TerrainType::Flag)
    }
}
