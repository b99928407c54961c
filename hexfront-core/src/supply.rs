//! Supply network: breadth-first reachability from each player's sources

use std::collections::VecDeque;

use crate::board::Hex;
use crate::grid::Grid;
use crate::terrain::TerrainType;
use crate::unit::Player;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Map edges that act as a player's supply sources
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyEdges {
    #[serde(default)]
    pub n: bool,
    #[serde(default)]
    pub e: bool,
    #[serde(default)]
    pub s: bool,
    #[serde(default)]
    pub w: bool,
}

impl SupplyEdges {
    pub const WEST: SupplyEdges = SupplyEdges { n: false, e: false, s: false, w: true };
    pub const EAST: SupplyEdges = SupplyEdges { n: false, e: true, s: false, w: false };

    fn touches(&self, grid: &Grid, hex: Hex) -> bool {
        let size = grid.size();
        (self.n && hex.y == 0)
            || (self.s && hex.y == size.last_row(hex.x))
            || (self.w && hex.x == 0)
            || (self.e && hex.x == size.width - 1)
    }
}

/// Per-scenario supply configuration for both players
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyConfig {
    /// Indexed by `Player::index()`
    pub edges: [SupplyEdges; 2],
    /// Candidate supply cities per player; a city only counts while owned
    pub cities: [Vec<Hex>; 2],
}

impl SupplyConfig {
    /// Player 1 supplied from the west edge, player 2 from the east edge
    pub fn home_edges() -> Self {
        Self {
            edges: [SupplyEdges::WEST, SupplyEdges::EAST],
            cities: [Vec::new(), Vec::new()],
        }
    }

    pub fn edges_of(&self, player: Player) -> SupplyEdges {
        self.edges[player.index()]
    }

    pub fn cities_of(&self, player: Player) -> &[Hex] {
        &self.cities[player.index()]
    }
}

/// Whether supply for `player` cannot pass through `hex`
pub fn is_supply_path_blocked(grid: &Grid, hex: Hex, player: Player) -> bool {
    let Some(tile) = grid.tile(hex) else {
        return true;
    };
    if tile.terrain.properties().is_impassable() {
        return true;
    }

    match tile.occupant {
        // Friendly units negate ZoC for supply; enemy units always block
        Some(occupant) => occupant.player != player,
        // An empty hex in both sides' ZoC is also in this player's enemy ZoC,
        // so the dual-ZoC block needs no separate test
        None => grid.is_hex_in_enemy_zoc(hex, player),
    }
}

/// Source hexes: unblocked edge cells plus owned supply cities
pub fn supply_sources(grid: &Grid, config: &SupplyConfig, player: Player) -> Vec<Hex> {
    let edges = config.edges_of(player);
    let mut sources: Vec<Hex> = grid
        .tiles()
        .map(|t| t.hex)
        .filter(|&hex| edges.touches(grid, hex) && !is_supply_path_blocked(grid, hex, player))
        .collect();

    for &city in config.cities_of(player) {
        let owned = grid
            .tile(city)
            .is_some_and(|t| t.terrain == TerrainType::City && t.owner == Some(player));
        if owned {
            sources.push(city);
        }
    }
    sources
}

/// All hexes connected to `player`'s supply sources
pub fn supplied_hexes(grid: &Grid, config: &SupplyConfig, player: Player) -> FxHashSet<Hex> {
    let mut supplied = FxHashSet::default();
    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::new();

    for source in supply_sources(grid, config, player) {
        if visited.insert(source) {
            queue.push_back(source);
        }
    }

    while let Some(current) = queue.pop_front() {
        supplied.insert(current);
        for neighbor in grid.adjacent_hexes(current) {
            if visited.contains(&neighbor) || is_supply_path_blocked(grid, neighbor, player) {
                continue;
            }
            visited.insert(neighbor);
            queue.push_back(neighbor);
        }
    }
    supplied
}
