//! Unit types, players and per-unit state

use crate::board::Hex;
use serde::{Deserialize, Serialize};

// ============================================================================
// PLAYERS
// ============================================================================

/// Player side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    #[serde(alias = "GREY", alias = "1")]
    Grey = 0,
    #[serde(alias = "GREEN", alias = "2")]
    Green = 1,
}

impl Player {
    /// Enumeration order used by the win check
    pub const ALL: [Player; 2] = [Player::Grey, Player::Green];

    pub fn opponent(self) -> Self {
        match self {
            Player::Grey => Player::Green,
            Player::Green => Player::Grey,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// UNIT TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Infantry,
    Tank,
}

/// Fixed stats of a unit type
#[derive(Clone, Copy, Debug)]
pub struct UnitStats {
    pub name: &'static str,
    pub attack: u32,
    pub reduced_attack: u32,
    pub defense: u32,
    pub reduced_defense: u32,
    pub movement: u32,
    /// Out-of-supply penalty does not apply
    pub supply_exempt: bool,
}

pub static UNIT_STATS: [UnitStats; 2] = [
    UnitStats {
        name: "infantry",
        attack: 3,
        reduced_attack: 2,
        defense: 2,
        reduced_defense: 1,
        movement: 6,
        supply_exempt: true,
    },
    UnitStats {
        name: "tank",
        attack: 6,
        reduced_attack: 3,
        defense: 2,
        reduced_defense: 1,
        movement: 10,
        supply_exempt: false,
    },
];

impl UnitType {
    pub const ALL: [UnitType; 2] = [UnitType::Infantry, UnitType::Tank];

    pub fn stats(self) -> &'static UnitStats {
        &UNIT_STATS[self as usize]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.stats().name.eq_ignore_ascii_case(name))
    }
}

/// Out-of-supply reduction: two thirds, rounded down, never below 1
pub fn supply_penalty(value: u32) -> u32 {
    (value * 2 / 3).max(1)
}

// ============================================================================
// HEALTH
// ============================================================================

/// Three-rung health ladder, dead is terminal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Full,
    Reduced,
    Dead,
}

impl HealthStatus {
    /// One rung down
    pub fn damaged(self) -> Self {
        match self {
            HealthStatus::Full => HealthStatus::Reduced,
            HealthStatus::Reduced | HealthStatus::Dead => HealthStatus::Dead,
        }
    }
}

// ============================================================================
// UNIT
// ============================================================================

/// Stable unit identifier (index into the unit collection)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Mirrors the hex holding this unit
    pub position: Hex,
    pub unit_type: UnitType,
    pub player: Player,
    pub health: HealthStatus,
    pub moved: bool,
    pub attacked: bool,
    pub advanced: bool,
    pub supplied: bool,
}

impl Unit {
    pub fn new(id: UnitId, position: Hex, unit_type: UnitType, player: Player) -> Self {
        Self {
            id,
            position,
            unit_type,
            player,
            health: HealthStatus::Full,
            moved: false,
            attacked: false,
            advanced: false,
            supplied: true,
        }
    }

    pub fn stats(&self) -> &'static UnitStats {
        self.unit_type.stats()
    }

    pub fn is_dead(&self) -> bool {
        self.health == HealthStatus::Dead
    }

    pub fn take_damage(&mut self) {
        self.health = self.health.damaged();
    }

    pub fn clear_turn_flags(&mut self) {
        self.moved = false;
        self.attacked = false;
        self.advanced = false;
    }

    fn penalized(&self, value: u32) -> u32 {
        if self.supplied || self.stats().supply_exempt {
            value
        } else {
            supply_penalty(value)
        }
    }

    pub fn base_movement(&self) -> u32 {
        self.stats().movement
    }

    pub fn effective_movement(&self) -> u32 {
        self.penalized(self.base_movement())
    }

    /// Health-dependent attack strength
    pub fn base_attack(&self) -> u32 {
        let stats = self.stats();
        match self.health {
            HealthStatus::Full => stats.attack,
            _ => stats.reduced_attack,
        }
    }

    pub fn effective_attack(&self) -> u32 {
        self.penalized(self.base_attack())
    }

    /// Health-dependent defense strength
    pub fn base_defense(&self) -> u32 {
        let stats = self.stats();
        match self.health {
            HealthStatus::Full => stats.defense,
            _ => stats.reduced_defense,
        }
    }

    pub fn effective_defense(&self) -> u32 {
        self.penalized(self.base_defense())
    }
}
