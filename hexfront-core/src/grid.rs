//! Hex grid: per-hex terrain, ownership, occupant and edge features

use crate::board::{across_edge, edge_between, opposite_edge, GridSize, Hex, EDGE_COUNT};
use crate::terrain::TerrainType;
use crate::unit::{Player, UnitId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The unit standing on a hex (mirrors the unit collection)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: UnitId,
    pub player: Player,
}

/// One grid cell, created at grid-build time and mutated in place
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HexTile {
    pub hex: Hex,
    pub terrain: TerrainType,
    pub owner: Option<Player>,
    /// River edges this hex owns, see [`Grid::river_owner`]
    pub river_edges: Vec<u8>,
    /// Road per edge, stored on both adjacent hexes
    pub roads: [bool; 6],
    pub occupant: Option<Occupant>,
}

impl HexTile {
    fn new(hex: Hex) -> Self {
        Self {
            hex,
            terrain: TerrainType::Clear,
            owner: None,
            river_edges: Vec::new(),
            roads: [false; 6],
            occupant: None,
        }
    }

    pub fn has_river_edge(&self, edge: u8) -> bool {
        self.river_edges.contains(&edge)
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// Hex existence, adjacency and edge features
#[derive(Clone, Debug)]
pub struct Grid {
    size: GridSize,
    tiles: Vec<HexTile>,
    index: FxHashMap<Hex, usize>,
}

impl Grid {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Build every cell of a `width` x `height` grid as clear terrain
    pub fn new(size: GridSize) -> Self {
        let tiles: Vec<HexTile> = size.hexes().map(HexTile::new).collect();
        let index = tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| (tile.hex, i))
            .collect();
        Self { size, tiles, index }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.index.contains_key(&hex)
    }

    pub fn tile(&self, hex: Hex) -> Option<&HexTile> {
        self.index.get(&hex).map(|&i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, hex: Hex) -> Option<&mut HexTile> {
        self.index.get(&hex).map(|&i| &mut self.tiles[i])
    }

    /// Iterate cells, row-major
    pub fn tiles(&self) -> impl Iterator<Item = &HexTile> {
        self.tiles.iter()
    }

    pub fn terrain(&self, hex: Hex) -> Option<TerrainType> {
        self.tile(hex).map(|t| t.terrain)
    }

    pub fn occupant(&self, hex: Hex) -> Option<Occupant> {
        self.tile(hex).and_then(|t| t.occupant)
    }

    pub fn is_occupied(&self, hex: Hex) -> bool {
        self.occupant(hex).is_some()
    }

    pub fn adjacent_hexes(&self, hex: Hex) -> Vec<Hex> {
        self.size.adjacent_hexes(hex)
    }

    // ========================================================================
    // EDGE QUERIES
    // ========================================================================

    /// The hex that stores a river on the a-b edge: smaller x, then smaller y
    pub fn river_owner(a: Hex, b: Hex) -> Hex {
        if a.x < b.x || (a.x == b.x && a.y < b.y) {
            a
        } else {
            b
        }
    }

    /// True if either side records a river on the shared edge
    pub fn is_river_between(&self, a: Hex, b: Hex) -> bool {
        let Some(edge_a) = edge_between(a, b) else {
            return false;
        };
        let edge_b = opposite_edge(edge_a);
        let side_a = self.tile(a).is_some_and(|t| t.has_river_edge(edge_a));
        let side_b = self.tile(b).is_some_and(|t| t.has_river_edge(edge_b));
        side_a || side_b
    }

    pub fn is_road_between(&self, a: Hex, b: Hex) -> bool {
        let Some(edge_a) = edge_between(a, b) else {
            return false;
        };
        let edge_b = opposite_edge(edge_a);
        let side_a = self.tile(a).is_some_and(|t| t.roads[edge_a as usize]);
        let side_b = self.tile(b).is_some_and(|t| t.roads[edge_b as usize]);
        side_a || side_b
    }

    /// Any adjacent enemy unit not separated by a river
    pub fn is_hex_in_enemy_zoc(&self, hex: Hex, player: Player) -> bool {
        let enemy = player.opponent();
        self.adjacent_hexes(hex).into_iter().any(|adj| {
            self.occupant(adj).is_some_and(|o| o.player == enemy) && !self.is_river_between(hex, adj)
        })
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub fn set_terrain(&mut self, hex: Hex, terrain: TerrainType) {
        if let Some(tile) = self.tile_mut(hex) {
            tile.terrain = terrain;
        }
    }

    pub fn set_owner(&mut self, hex: Hex, owner: Option<Player>) {
        if let Some(tile) = self.tile_mut(hex) {
            tile.owner = owner;
        }
    }

    pub(crate) fn set_occupant(&mut self, hex: Hex, occupant: Option<Occupant>) {
        if let Some(tile) = self.tile_mut(hex) {
            tile.occupant = occupant;
        }
    }

    /// Toggle the river on `edge` of `hex`, keeping it on the owning side only.
    /// Returns the new river state, `None` when no hex lies across the edge.
    pub fn toggle_river(&mut self, hex: Hex, edge: u8) -> Option<bool> {
        if edge >= EDGE_COUNT || !self.contains(hex) {
            return None;
        }
        let other = across_edge(hex, edge);
        if !self.contains(other) {
            return None;
        }
        let other_edge = opposite_edge(edge);
        let (owner, owner_edge, stray, stray_edge) = if Self::river_owner(hex, other) == hex {
            (hex, edge, other, other_edge)
        } else {
            (other, other_edge, hex, edge)
        };

        let present = self.is_river_between(hex, other);
        if let Some(tile) = self.tile_mut(stray) {
            tile.river_edges.retain(|&e| e != stray_edge);
        }
        let tile = self.tile_mut(owner)?;
        tile.river_edges.retain(|&e| e != owner_edge);
        if !present {
            tile.river_edges.push(owner_edge);
        }
        Some(!present)
    }

    /// Toggle the road between two adjacent hexes on both sides
    pub fn toggle_road(&mut self, a: Hex, b: Hex) -> Option<bool> {
        let edge_a = edge_between(a, b)?;
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        let edge_b = opposite_edge(edge_a);
        let value = !self.is_road_between(a, b);
        self.tile_mut(a)?.roads[edge_a as usize] = value;
        self.tile_mut(b)?.roads[edge_b as usize] = value;
        Some(value)
    }

    /// Move river records that sit on the non-owning side to the owning side.
    /// Returns how many records were moved or dropped.
    pub fn normalize_rivers(&mut self) -> usize {
        let mut repaired = 0;
        for i in 0..self.tiles.len() {
            let hex = self.tiles[i].hex;
            let edges = self.tiles[i].river_edges.clone();
            for edge in edges {
                let other = across_edge(hex, edge);
                if Self::river_owner(hex, other) == hex {
                    continue;
                }
                self.tiles[i].river_edges.retain(|&e| e != edge);
                repaired += 1;
                if let Some(tile) = self.tile_mut(other) {
                    let other_edge = opposite_edge(edge);
                    if !tile.has_river_edge(other_edge) {
                        tile.river_edges.push(other_edge);
                    }
                }
            }
        }
        repaired
    }
}
