//! Reachable-hex search with a movement-point budget
//!
//! Depth-first expansion that revisits a hex only when it is reached with
//! strictly more remaining points than any earlier visit. This is not a
//! Dijkstra search: the visiting order (N, NE, SE, S, SW, NW) decides which
//! predecessor a hex keeps when two routes leave the same points, and the
//! zone-of-control stop interacts with revisits. Results must stay identical
//! to that order, so do not swap in a priority queue.

use crate::board::Hex;
use crate::grid::Grid;
use crate::terrain::MAX_MOVEMENT_COST;
use crate::unit::{Player, Unit};
use rustc_hash::FxHashMap;

/// Cost of any move along a road edge
pub const ROAD_MOVEMENT_COST: f32 = 0.5;

/// Extra cost for crossing a river edge (not on roads)
pub const RIVER_CROSSING_COST: f32 = 1.0;

/// Result of a reachability search
#[derive(Clone, Debug, Default)]
pub struct Reachability {
    pub origin: Hex,
    /// Reachable hexes in discovery order, origin excluded
    pub reachable: Vec<Hex>,
    /// Predecessor of each visited hex
    pub came_from: FxHashMap<Hex, Hex>,
    /// Cumulative cost of the recorded route to each visited hex
    pub g_score: FxHashMap<Hex, f32>,
}

impl Reachability {
    pub fn contains(&self, hex: Hex) -> bool {
        self.reachable.contains(&hex)
    }

    /// Route from the origin to `end`, both included
    pub fn path_to(&self, end: Hex) -> Option<Vec<Hex>> {
        if !self.came_from.contains_key(&end) {
            return None;
        }
        let mut path = vec![end];
        let mut current = end;
        while let Some(&prev) = self.came_from.get(&current) {
            if path.len() > self.came_from.len() {
                break;
            }
            path.push(prev);
            current = prev;
        }
        path.reverse();
        Some(path)
    }
}

/// Entry cost for moving from `from` onto `to`
pub fn entry_cost(grid: &Grid, from: Hex, to: Hex) -> f32 {
    let Some(tile) = grid.tile(to) else {
        return MAX_MOVEMENT_COST;
    };
    if tile.occupant.is_some() {
        return MAX_MOVEMENT_COST;
    }
    if grid.is_road_between(from, to) {
        return ROAD_MOVEMENT_COST;
    }
    let mut cost = tile.terrain.movement_cost();
    if grid.is_river_between(from, to) {
        cost += RIVER_CROSSING_COST;
    }
    cost
}

struct Search<'a> {
    grid: &'a Grid,
    player: Player,
    origin: Hex,
    visited: FxHashMap<Hex, f32>,
    result: Reachability,
}

impl Search<'_> {
    fn visit(&mut self, hex: Hex, movement_points: f32, from: Option<Hex>) {
        if !self.grid.contains(hex) {
            return;
        }

        let cost = match from {
            Some(prev) => entry_cost(self.grid, prev, hex),
            None => 0.0,
        };
        if movement_points < cost {
            return;
        }
        let remaining = movement_points - cost;

        if self.visited.get(&hex).is_some_and(|&best| best >= remaining) {
            return;
        }
        self.visited.insert(hex, remaining);

        match from {
            Some(prev) => {
                self.result.came_from.insert(hex, prev);
                let base = self.result.g_score.get(&prev).copied().unwrap_or(0.0);
                self.result.g_score.insert(hex, base + cost);
            }
            None => {
                self.result.g_score.insert(hex, 0.0);
            }
        }

        if hex != self.origin && !self.result.reachable.contains(&hex) {
            self.result.reachable.push(hex);
        }

        if remaining > 0.0 {
            // Entering enemy ZoC ends movement; leaving it from the origin is free
            let stopped = from.is_some() && self.grid.is_hex_in_enemy_zoc(hex, self.player);
            if !stopped {
                for next in self.grid.adjacent_hexes(hex) {
                    self.visit(next, remaining, Some(hex));
                }
            }
        }
    }
}

/// Every hex a unit of `player` at `origin` can reach with `movement_points`
pub fn reachable_hexes(grid: &Grid, origin: Hex, movement_points: f32, player: Player) -> Reachability {
    let mut search = Search {
        grid,
        player,
        origin,
        visited: FxHashMap::default(),
        result: Reachability {
            origin,
            ..Default::default()
        },
    };
    search.visit(origin, movement_points, None);
    search.result
}

/// Reachability of a unit using its effective (supply-adjusted) movement
pub fn unit_reachability(grid: &Grid, unit: &Unit) -> Reachability {
    reachable_hexes(grid, unit.position, unit.effective_movement() as f32, unit.player)
}

/// Path for `unit` from `start` to `end`, `None` when out of range
pub fn find_path(grid: &Grid, start: Hex, end: Hex, unit: &Unit) -> Option<Vec<Hex>> {
    let reach = reachable_hexes(grid, start, unit.effective_movement() as f32, unit.player);
    reach.path_to(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battlefield::Battlefield;
    use crate::board::{edge_between, GridSize};
    use crate::terrain::TerrainType;
    use crate::unit::UnitType;

    fn open_field() -> Battlefield {
        Battlefield::new(Grid::new(GridSize::new(8, 8)))
    }

    #[test]
    fn test_default_reachability_is_empty() {
        let reach = Reachability::default();
        assert_eq!(reach.origin, Hex::default());
        assert!(!reach.contains(Hex::new(0, 0)));
        assert_eq!(reach.path_to(Hex::new(1, 0)), None);
    }

    #[test]
    fn test_clear_terrain_range() {
        let field = open_field();
        let reach = reachable_hexes(&field.grid, Hex::new(3, 3), 1.0, Player::Grey);
        assert_eq!(reach.reachable.len(), 6);
        assert!(!reach.contains(Hex::new(3, 3)));
        assert_eq!(reach.g_score[&Hex::new(3, 3)], 0.0);
    }

    #[test]
    fn test_forest_costs_two() {
        let mut field = open_field();
        field.grid.set_terrain(Hex::new(3, 2), TerrainType::Forest);
        let reach = reachable_hexes(&field.grid, Hex::new(3, 3), 1.0, Player::Grey);
        assert!(!reach.contains(Hex::new(3, 2)));
        let reach = reachable_hexes(&field.grid, Hex::new(3, 3), 2.0, Player::Grey);
        assert!(reach.contains(Hex::new(3, 2)));
        assert_eq!(reach.g_score[&Hex::new(3, 2)], 2.0);
    }

    #[test]
    fn test_river_adds_one() {
        let mut field = open_field();
        let a = Hex::new(3, 3);
        let b = Hex::new(3, 2);
        field.grid.toggle_river(a, edge_between(a, b).unwrap());
        let reach = reachable_hexes(&field.grid, a, 1.0, Player::Grey);
        assert!(!reach.contains(b));
        let reach = reachable_hexes(&field.grid, a, 2.0, Player::Grey);
        assert_eq!(reach.came_from[&b], a);
        assert_eq!(reach.g_score[&b], 2.0);
    }

    #[test]
    fn test_road_overrides_terrain_and_river() {
        let mut field = open_field();
        let a = Hex::new(3, 3);
        let b = Hex::new(3, 2);
        field.grid.set_terrain(b, TerrainType::Mountain);
        field.grid.toggle_river(a, edge_between(a, b).unwrap());
        field.grid.toggle_road(a, b);
        let reach = reachable_hexes(&field.grid, a, 0.5, Player::Grey);
        assert_eq!(reach.reachable, vec![b]);
        assert_eq!(reach.g_score[&b], ROAD_MOVEMENT_COST);
    }

    #[test]
    fn test_occupied_hex_blocks() {
        let mut field = open_field();
        field.place_unit(Hex::new(3, 2), UnitType::Infantry, Player::Grey);
        let reach = reachable_hexes(&field.grid, Hex::new(3, 3), 6.0, Player::Grey);
        assert!(!reach.contains(Hex::new(3, 2)));
        assert!(!reach.came_from.contains_key(&Hex::new(3, 2)));
        // Still reachable around it
        assert!(reach.contains(Hex::new(3, 1)));
    }

    #[test]
    fn test_water_is_impassable() {
        let mut field = open_field();
        field.grid.set_terrain(Hex::new(3, 2), TerrainType::Water);
        let reach = reachable_hexes(&field.grid, Hex::new(3, 3), 20.0, Player::Grey);
        assert!(!reach.contains(Hex::new(3, 2)));
    }

    #[test]
    fn test_enemy_zoc_stops_movement() {
        let mut field = open_field();
        // Enemy at (5,3); its ZoC includes (4,3)
        field.place_unit(Hex::new(5, 3), UnitType::Infantry, Player::Green);
        let reach = reachable_hexes(&field.grid, Hex::new(3, 3), 2.0, Player::Grey);
        assert!(reach.contains(Hex::new(4, 3)));
        // (5,2) is only reachable through ZoC hexes in two steps
        assert!(!reach.contains(Hex::new(5, 2)));
        assert!(!reach.contains(Hex::new(5, 4)));
    }

    #[test]
    fn test_origin_zoc_does_not_block_leaving() {
        let mut field = open_field();
        field.place_unit(Hex::new(3, 2), UnitType::Infantry, Player::Green);
        let reach = reachable_hexes(&field.grid, Hex::new(3, 3), 2.0, Player::Grey);
        // (3,4) is outside enemy ZoC, so movement continues to (3,5)
        assert!(reach.contains(Hex::new(3, 4)));
        assert!(reach.contains(Hex::new(3, 5)));
    }

    #[test]
    fn test_reachable_within_budget_bound() {
        let field = open_field();
        let reach = reachable_hexes(&field.grid, Hex::new(4, 4), 3.0, Player::Grey);
        for hex in &reach.reachable {
            let path = reach.path_to(*hex).unwrap();
            assert!(path.len() - 1 <= 3, "{:?} needs {} steps", hex, path.len() - 1);
            assert!(reach.g_score[hex] <= 3.0);
        }
    }

    #[test]
    fn test_find_path_is_deterministic() {
        let mut field = open_field();
        field.grid.set_terrain(Hex::new(4, 3), TerrainType::Forest);
        let id = field.place_unit(Hex::new(1, 1), UnitType::Infantry, Player::Grey).unwrap();
        let unit = field.unit(id).unwrap().clone();
        let first = find_path(&field.grid, unit.position, Hex::new(5, 4), &unit).unwrap();
        for _ in 0..5 {
            let again = find_path(&field.grid, unit.position, Hex::new(5, 4), &unit).unwrap();
            assert_eq!(first, again);
        }
        assert_eq!(first.first(), Some(&Hex::new(1, 1)));
        assert_eq!(first.last(), Some(&Hex::new(5, 4)));
        for pair in first.windows(2) {
            assert!(field.grid.adjacent_hexes(pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn test_find_path_out_of_range() {
        let mut field = open_field();
        let id = field.place_unit(Hex::new(0, 0), UnitType::Tank, Player::Grey).unwrap();
        field.unit_mut(id).unwrap().supplied = false;
        let unit = field.unit(id).unwrap().clone();
        // Out of supply: 10 -> 6 movement points
        assert!(find_path(&field.grid, unit.position, Hex::new(0, 6), &unit).is_some());
        assert!(find_path(&field.grid, unit.position, Hex::new(0, 7), &unit).is_none());
    }
}
