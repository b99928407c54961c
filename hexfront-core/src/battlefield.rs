//! Grid plus unit collection, kept consistent with each other
//!
//! The grid owns cells by coordinate, the unit map owns units by id. A tile
//! only holds the id and side of its occupant; a unit only holds its position.

use std::collections::BTreeMap;

use crate::board::Hex;
use crate::grid::{Grid, Occupant};
use crate::unit::{Player, Unit, UnitId, UnitType};

#[derive(Clone, Debug)]
pub struct Battlefield {
    pub grid: Grid,
    units: BTreeMap<UnitId, Unit>,
    next_id: u32,
}

impl Battlefield {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            units: BTreeMap::new(),
            next_id: 0,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Iterate units in id order
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    pub fn units_of(&self, player: Player) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.player == player)
    }

    pub fn unit_at(&self, hex: Hex) -> Option<&Unit> {
        self.grid.occupant(hex).and_then(|o| self.units.get(&o.id))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Place a new unit on an empty existing hex
    pub fn place_unit(&mut self, hex: Hex, unit_type: UnitType, player: Player) -> Option<UnitId> {
        if !self.grid.contains(hex) || self.grid.is_occupied(hex) {
            return None;
        }
        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.units.insert(id, Unit::new(id, hex, unit_type, player));
        self.grid.set_occupant(hex, Some(Occupant { id, player }));
        Some(id)
    }

    /// Remove a unit from both collections
    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        if self.grid.occupant(unit.position).is_some_and(|o| o.id == id) {
            self.grid.set_occupant(unit.position, None);
        }
        Some(unit)
    }

    /// Commit a unit's new position; the target must be empty
    pub fn relocate_unit(&mut self, id: UnitId, to: Hex) -> bool {
        if !self.grid.contains(to) || self.grid.is_occupied(to) {
            return false;
        }
        let Some(unit) = self.units.get_mut(&id) else {
            return false;
        };
        let from = unit.position;
        unit.position = to;
        let occupant = Occupant { id, player: unit.player };
        self.grid.set_occupant(from, None);
        self.grid.set_occupant(to, Some(occupant));
        true
    }

    /// Remove every dead unit, returning them
    pub fn remove_dead_units(&mut self) -> Vec<Unit> {
        let dead: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.is_dead())
            .map(|u| u.id)
            .collect();
        dead.into_iter().filter_map(|id| self.remove_unit(id)).collect()
    }

    pub fn clear_turn_flags(&mut self) {
        self.units.values_mut().for_each(Unit::clear_turn_flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GridSize;

    fn field() -> Battlefield {
        Battlefield::new(Grid::new(GridSize::new(5, 5)))
    }

    #[test]
    fn test_place_and_lookup() {
        let mut field = field();
        let id = field.place_unit(Hex::new(1, 1), UnitType::Tank, Player::Grey).unwrap();
        assert_eq!(field.unit_at(Hex::new(1, 1)).unwrap().id, id);
        assert!(field.place_unit(Hex::new(1, 1), UnitType::Infantry, Player::Green).is_none());
        // Clipped bottom-row cell does not exist
        assert!(field.place_unit(Hex::new(1, 4), UnitType::Infantry, Player::Green).is_none());
    }

    #[test]
    fn test_relocate_keeps_mirrors_in_sync() {
        let mut field = field();
        let id = field.place_unit(Hex::new(0, 0), UnitType::Tank, Player::Grey).unwrap();
        assert!(field.relocate_unit(id, Hex::new(2, 2)));
        assert!(!field.grid.is_occupied(Hex::new(0, 0)));
        assert_eq!(field.unit(id).unwrap().position, Hex::new(2, 2));
        assert_eq!(field.grid.occupant(Hex::new(2, 2)).unwrap().id, id);
    }

    #[test]
    fn test_remove_dead_units() {
        let mut field = field();
        let a = field.place_unit(Hex::new(0, 0), UnitType::Tank, Player::Grey).unwrap();
        let b = field.place_unit(Hex::new(2, 0), UnitType::Tank, Player::Green).unwrap();
        let unit = field.unit_mut(b).unwrap();
        unit.take_damage();
        unit.take_damage();

        let removed = field.remove_dead_units();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, b);
        assert!(field.unit(a).is_some());
        assert!(!field.grid.is_occupied(Hex::new(2, 0)));
        assert_eq!(field.units_of(Player::Green).count(), 0);
    }
}
