//! Game engine: input handling, rules orchestration and outgoing events
//!
//! The engine owns the battlefield, the turn state and the die. External
//! input (hex clicks, unit clicks, end-phase requests, move completions)
//! mutates state synchronously and queues [`EngineEvent`]s that the caller
//! pulls with [`GameEngine::drain_events`].

use crate::battlefield::Battlefield;
use crate::board::Hex;
use crate::combat::{resolve_attack, CombatReport, CombatResultsTable};
use crate::config::RulesConfig;
use crate::dice::Die;
use crate::grid::Grid;
use crate::pathfinder::{unit_reachability, Reachability};
use crate::scenario::Scenario;
use crate::state::{CombatDisplay, GameState, PhaseTransition, SpecialPhase, TurnPhase};
use crate::supply::{supplied_hexes, SupplyConfig};
use crate::terrain::TerrainType;
use crate::unit::{Player, Unit, UnitId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

// ============================================================================
// EVENTS
// ============================================================================

/// Handle for a move awaiting its completion signal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveTicket(pub u64);

/// Notification for the view layer
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    SelectionChanged {
        selected: Vec<UnitId>,
        highlighted: Vec<Hex>,
    },
    PhaseChanged {
        player: Player,
        phase: TurnPhase,
        turn: u32,
    },
    CombatResolved(CombatReport),
    CurrentSpecialPhaseUpdated {
        special_phase: Option<SpecialPhase>,
    },
    WinnerUpdated {
        winner: Player,
    },
    UnitMoving {
        ticket: MoveTicket,
        unit: UnitId,
        path: Vec<Hex>,
    },
    UnitsRemoved {
        units: Vec<UnitId>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PendingMove {
    pub ticket: MoveTicket,
    pub unit: UnitId,
    pub destination: Hex,
    pub path: Vec<Hex>,
    pub advancing: bool,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct GameEngine {
    field: Battlefield,
    state: GameState,
    supply: SupplyConfig,
    rules: RulesConfig,
    die: Box<dyn Die>,
    highlighted: Vec<Hex>,
    reach: Option<Reachability>,
    supplied: [FxHashSet<Hex>; 2],
    pending_move: Option<PendingMove>,
    next_ticket: u64,
    events: Vec<EngineEvent>,
}

impl GameEngine {
    pub fn new(scenario: Scenario, rules: RulesConfig) -> Self {
        let die = Box::new(rules.die());
        Self::with_die(scenario, rules, die)
    }

    /// Engine with an explicit die (tests, replays)
    pub fn with_die(scenario: Scenario, rules: RulesConfig, die: Box<dyn Die>) -> Self {
        let Scenario {
            field,
            supply,
            starting_player,
        } = scenario;
        let mut engine = Self {
            field,
            state: GameState::new(starting_player),
            supply,
            rules,
            die,
            highlighted: Vec::new(),
            reach: None,
            supplied: [FxHashSet::default(), FxHashSet::default()],
            pending_move: None,
            next_ticket: 0,
            events: Vec::new(),
        };
        engine.refresh_supply();
        engine.check_winner();
        tracing::info!(
            "Game started: {} units, {:?} moves first",
            engine.field.unit_count(),
            starting_player
        );
        engine
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn field(&self) -> &Battlefield {
        &self.field
    }

    pub fn grid(&self) -> &Grid {
        &self.field.grid
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn combat_table(&self) -> &CombatResultsTable {
        &self.rules.combat_table
    }

    pub fn supply_config(&self) -> &SupplyConfig {
        &self.supply
    }

    pub fn highlighted(&self) -> &[Hex] {
        &self.highlighted
    }

    pub fn supplied_hexes(&self, player: Player) -> &FxHashSet<Hex> {
        &self.supplied[player.index()]
    }

    pub fn pending_move(&self) -> Option<&PendingMove> {
        self.pending_move.as_ref()
    }

    pub fn is_move_in_flight(&self) -> bool {
        self.pending_move.is_some()
    }

    /// Take all queued events, oldest first
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current grid and units in scenario form
    pub fn to_scenario(&self) -> Scenario {
        Scenario {
            field: self.field.clone(),
            supply: self.supply.clone(),
            starting_player: self.state.starting_player,
        }
    }

    /// Whether the selected unit may move onto `hex` right now.
    /// Derived from the current highlight set, not recomputed.
    pub fn is_valid_move(&self, hex: Hex) -> bool {
        !self.state.selection.is_empty() && self.highlighted.contains(&hex) && !self.field.grid.is_occupied(hex)
    }

    /// Units the view should render dimmed (not actionable in this phase)
    pub fn dimmed_units(&self) -> Vec<UnitId> {
        let involved = &self.state.involved_attackers;
        self.field
            .units()
            .filter(|unit| match self.state.current_special_phase() {
                Some(_) => !involved.contains(&unit.id),
                None => match self.state.phase {
                    TurnPhase::Move => unit.moved,
                    TurnPhase::Attack => unit.attacked,
                },
            })
            .map(|unit| unit.id)
            .collect()
    }

    fn accepts_input(&self) -> bool {
        if self.state.is_ended() {
            tracing::debug!("Input ignored: game has ended");
            return false;
        }
        if self.pending_move.is_some() {
            tracing::debug!("Input ignored: move in flight");
            return false;
        }
        true
    }

    // ========================================================================
    // HEX INPUT
    // ========================================================================

    /// Move the selected unit onto `hex` when that is a legal move.
    /// The unit's position is committed by [`GameEngine::complete_move`].
    pub fn handle_hex_click(&mut self, hex: Hex) -> Option<MoveTicket> {
        if !self.accepts_input() {
            return None;
        }

        let special = self.state.current_special_phase();
        let advancing = special == Some(SpecialPhase::Advance);
        let move_phase = self.state.phase == TurnPhase::Move && special.is_none();
        if !(move_phase || advancing) || !self.is_valid_move(hex) {
            tracing::debug!("Hex click on ({}, {}) ignored", hex.x, hex.y);
            return None;
        }

        let unit_id = self.state.selection[0];
        let from = self.field.unit(unit_id)?.position;
        let path = if advancing {
            vec![from, hex]
        } else {
            self.reach.as_ref()?.path_to(hex)?
        };

        let ticket = MoveTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending_move = Some(PendingMove {
            ticket,
            unit: unit_id,
            destination: hex,
            path: path.clone(),
            advancing,
        });

        self.clear_selection();
        self.events.push(EngineEvent::UnitMoving {
            ticket,
            unit: unit_id,
            path,
        });
        Some(ticket)
    }

    /// Commit the move behind `ticket`. Returns false for an unknown ticket.
    pub fn complete_move(&mut self, ticket: MoveTicket) -> bool {
        if self.pending_move.as_ref().map(|p| p.ticket) != Some(ticket) {
            tracing::debug!("Unknown move ticket {}", ticket.0);
            return false;
        }
        let Some(pending) = self.pending_move.take() else {
            return false;
        };

        if !self.field.relocate_unit(pending.unit, pending.destination) {
            tracing::warn!("Move target ({}, {}) became unavailable", pending.destination.x, pending.destination.y);
        }
        if let Some(unit) = self.field.unit_mut(pending.unit) {
            unit.moved = true;
            if pending.advancing {
                unit.advanced = true;
            }
        }
        tracing::debug!(
            "Unit {} moved to ({}, {})",
            pending.unit.0,
            pending.destination.x,
            pending.destination.y
        );

        if pending.advancing && self.state.current_special_phase() == Some(SpecialPhase::Advance) {
            self.end_special_phase();
        }
        self.refresh_supply();
        self.check_winner();
        true
    }

    // ========================================================================
    // UNIT INPUT
    // ========================================================================

    pub fn handle_unit_click(&mut self, id: UnitId) {
        if !self.accepts_input() {
            return;
        }
        let Some(unit) = self.field.unit(id).cloned() else {
            return;
        };
        let involved = self.state.involved_attackers.contains(&id);

        match self.state.current_special_phase() {
            Some(SpecialPhase::AttackerDamage) if involved => self.assign_attacker_damage(id),
            Some(SpecialPhase::Advance)
                if involved && self.state.selection.first().map_or(true, |&s| s == id) =>
            {
                self.select_advancing_unit(id)
            }
            Some(phase) => tracing::debug!("Unit {} not eligible during {:?}", id.0, phase),
            None => match self.state.phase {
                TurnPhase::Attack => self.attack_phase_click(&unit),
                TurnPhase::Move => self.move_phase_click(&unit),
            },
        }
    }

    /// Click on the unit standing on `hex`, if any
    pub fn handle_unit_click_at(&mut self, hex: Hex) {
        if let Some(id) = self.field.grid.occupant(hex).map(|o| o.id) {
            self.handle_unit_click(id);
        }
    }

    fn move_phase_click(&mut self, unit: &Unit) {
        let selectable = unit.player == self.state.active_player
            && !unit.moved
            && self.state.selection.first().map_or(true, |&s| s == unit.id);
        if !selectable {
            tracing::debug!("Unit {} cannot be selected for movement", unit.id.0);
            return;
        }

        if self.state.selection.first() == Some(&unit.id) {
            self.clear_selection();
            return;
        }
        let reach = unit_reachability(&self.field.grid, unit);
        self.state.selection = vec![unit.id];
        self.highlighted = reach.reachable.clone();
        self.reach = Some(reach);
        self.emit_selection();
    }

    fn attack_phase_click(&mut self, unit: &Unit) {
        if unit.player == self.state.active_player && !unit.attacked {
            if let Some(pos) = self.state.selection.iter().position(|&s| s == unit.id) {
                self.state.selection.remove(pos);
            } else {
                self.state.selection.push(unit.id);
            }
            self.highlighted = self.common_enemy_neighbors();
            self.emit_selection();
        } else if self.highlighted.contains(&unit.position) && !self.state.selection.is_empty() {
            let attackers = self.state.selection.clone();
            self.attack(&attackers, unit.id);
        } else {
            tracing::debug!("Unit {} is not a valid attack target", unit.id.0);
        }
    }

    /// Enemy-occupied hexes adjacent to every selected unit
    fn common_enemy_neighbors(&self) -> Vec<Hex> {
        let enemy = self.state.active_player.opponent();
        let mut common: Option<Vec<Hex>> = None;
        for unit in self.state.selection.iter().filter_map(|id| self.field.unit(*id)) {
            let hexes: Vec<Hex> = self
                .field
                .grid
                .adjacent_hexes(unit.position)
                .into_iter()
                .filter(|&hex| self.field.grid.occupant(hex).is_some_and(|o| o.player == enemy))
                .collect();
            common = Some(match common {
                None => hexes,
                Some(prev) => prev.into_iter().filter(|h| hexes.contains(h)).collect(),
            });
        }
        common.unwrap_or_default()
    }

    fn assign_attacker_damage(&mut self, id: UnitId) {
        if let Some(unit) = self.field.unit_mut(id) {
            unit.take_damage();
        }
        self.state.unassigned_damage = self.state.unassigned_damage.saturating_sub(1);
        tracing::info!("Attacker {} absorbs a loss", id.0);
        self.remove_dead_units();

        if self.state.unassigned_damage == 0 {
            self.end_special_phase();
        }
        self.emit_selection();
        self.refresh_supply();
        self.check_winner();
    }

    fn select_advancing_unit(&mut self, id: UnitId) {
        if self.state.selection.first() == Some(&id) {
            self.state.selection.clear();
        } else {
            self.state.selection = vec![id];
        }
        self.highlighted = self.state.vacated_hex.into_iter().collect();
        self.emit_selection();
    }

    // ========================================================================
    // COMBAT
    // ========================================================================

    fn attack(&mut self, attackers: &[UnitId], defender: UnitId) {
        let options = self.rules.combat_options();
        let Some(report) = resolve_attack(
            &mut self.field,
            &self.rules.combat_table,
            attackers,
            defender,
            self.die.as_mut(),
            options,
        ) else {
            return;
        };

        self.state.combat_result = Some(CombatDisplay {
            row_index: report.row_index,
            row_label: report.row_label.clone(),
            die: report.die,
        });
        if report.deferred_attacker_damage > 0 {
            self.state.unassigned_damage = report.deferred_attacker_damage;
            self.state.push_special_phase(SpecialPhase::AttackerDamage);
        }
        if let Some(vacated) = report.vacated_hex {
            self.state.vacated_hex = Some(vacated);
            self.state.push_special_phase(SpecialPhase::Advance);
        }
        // Only special phases consume the attacker list
        if self.state.current_special_phase().is_some() {
            self.state.involved_attackers = attackers.to_vec();
        }
        self.events.push(EngineEvent::CombatResolved(report));

        self.remove_dead_units();
        self.clear_selection();
        self.refresh_supply();
        self.check_winner();
        self.start_special_phase();
    }

    fn remove_dead_units(&mut self) {
        let removed: Vec<UnitId> = self.field.remove_dead_units().into_iter().map(|u| u.id).collect();
        if !removed.is_empty() {
            tracing::info!("Removed {} destroyed unit(s)", removed.len());
            self.events.push(EngineEvent::UnitsRemoved { units: removed });
        }
    }

    // ========================================================================
    // PHASES
    // ========================================================================

    fn start_special_phase(&mut self) {
        if self.state.is_ended() {
            return;
        }
        let current = self.state.current_special_phase();
        if current == Some(SpecialPhase::Advance) {
            let any_alive = self
                .state
                .involved_attackers
                .iter()
                .any(|id| self.field.unit(*id).is_some_and(|u| !u.is_dead()));
            if !any_alive {
                self.end_special_phase();
                return;
            }
            self.highlighted = self.state.vacated_hex.into_iter().collect();
        }
        if current.is_some() {
            tracing::info!("Special phase {:?}", current);
        }
        self.events.push(EngineEvent::CurrentSpecialPhaseUpdated { special_phase: current });
    }

    fn end_special_phase(&mut self) {
        if self.state.end_special_phase().is_some() {
            self.highlighted.clear();
            self.reach = None;
            self.start_special_phase();
        }
    }

    /// Handle an end-phase request
    pub fn end_phase(&mut self) -> Option<PhaseTransition> {
        if !self.accepts_input() {
            return None;
        }
        let transition = self.state.end_phase();
        match transition {
            PhaseTransition::Rejected => {
                tracing::debug!("End phase rejected: {} damage unassigned", self.state.unassigned_damage);
                return Some(transition);
            }
            PhaseTransition::SpecialPhaseEnded(_) => {
                self.highlighted.clear();
                self.reach = None;
                self.emit_selection();
                self.start_special_phase();
                return Some(transition);
            }
            PhaseTransition::Phase(_) => {}
            PhaseTransition::TurnPassed(_) => self.field.clear_turn_flags(),
        }

        self.highlighted.clear();
        self.reach = None;
        tracing::info!(
            "Turn {}: {:?} {:?}",
            self.state.turn,
            self.state.active_player,
            self.state.phase
        );
        self.events.push(EngineEvent::PhaseChanged {
            player: self.state.active_player,
            phase: self.state.phase,
            turn: self.state.turn,
        });
        self.emit_selection();
        self.refresh_supply();
        self.check_winner();
        Some(transition)
    }

    // ========================================================================
    // SUPPLY AND VICTORY
    // ========================================================================

    /// Recompute both supply networks and refresh each unit's flag
    pub fn refresh_supply(&mut self) {
        for player in Player::ALL {
            self.supplied[player.index()] = supplied_hexes(&self.field.grid, &self.supply, player);
        }
        let supplied = &self.supplied;
        for unit in self.field.units_mut() {
            unit.supplied = supplied[unit.player.index()].contains(&unit.position);
        }
    }

    /// First player (in enumeration order) meeting a victory condition
    pub fn winner(&self) -> Option<Player> {
        Player::ALL.into_iter().find(|&player| {
            let opponent = player.opponent();
            if self.field.units_of(opponent).next().is_none() {
                return true;
            }
            self.field.grid.tiles().any(|tile| {
                tile.terrain == TerrainType::Flag
                    && tile.owner == Some(opponent)
                    && tile.occupant.is_some_and(|o| o.player == player)
            })
        })
    }

    fn check_winner(&mut self) {
        if self.state.winner.is_some() {
            return;
        }
        if let Some(winner) = self.winner() {
            tracing::info!("{:?} wins on turn {}", winner, self.state.turn);
            self.state.declare_winner(winner);
            self.highlighted.clear();
            self.reach = None;
            self.events.push(EngineEvent::WinnerUpdated { winner });
        }
    }

    fn clear_selection(&mut self) {
        self.state.selection.clear();
        self.highlighted.clear();
        self.reach = None;
        self.emit_selection();
    }

    fn emit_selection(&mut self) {
        self.events.push(EngineEvent::SelectionChanged {
            selected: self.state.selection.clone(),
            highlighted: self.highlighted.clone(),
        });
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Serializable view of the whole session
#[derive(Clone, Debug, Serialize)]
pub struct GameSnapshot<'a> {
    pub state: &'a GameState,
    pub units: Vec<&'a Unit>,
    pub highlighted: &'a [Hex],
    pub dimmed: Vec<UnitId>,
    pub pending_move: Option<&'a PendingMove>,
    pub winner: Option<Player>,
}

impl GameEngine {
    pub fn snapshot(&self) -> GameSnapshot<'_> {
        GameSnapshot {
            state: &self.state,
            units: self.field.units().collect(),
            highlighted: &self.highlighted,
            dimmed: self.dimmed_units(),
            pending_move: self.pending_move.as_ref(),
            winner: self.state.winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GridSize;
    use crate::dice::LoadedDie;
    use crate::unit::{HealthStatus, UnitType};

    fn scenario(units: &[(Hex, UnitType, Player)]) -> Scenario {
        let mut field = Battlefield::new(Grid::new(GridSize::new(8, 8)));
        for &(hex, unit_type, player) in units {
            field.place_unit(hex, unit_type, player);
        }
        Scenario {
            field,
            supply: SupplyConfig::home_edges(),
            starting_player: Player::Grey,
        }
    }

    fn engine(units: &[(Hex, UnitType, Player)], faces: &[u8]) -> GameEngine {
        let die = Box::new(LoadedDie::new(faces.iter().copied()));
        GameEngine::with_die(scenario(units), RulesConfig::default(), die)
    }

    fn id_at(engine: &GameEngine, hex: Hex) -> UnitId {
        engine.grid().occupant(hex).unwrap().id
    }

    #[test]
    fn test_move_selection_and_commit() {
        let mut engine = engine(
            &[
                (Hex::new(1, 1), UnitType::Infantry, Player::Grey),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        let id = id_at(&engine, Hex::new(1, 1));
        engine.handle_unit_click(id);
        assert_eq!(engine.state().selection, vec![id]);
        assert!(engine.is_valid_move(Hex::new(1, 3)));

        let ticket = engine.handle_hex_click(Hex::new(1, 3)).unwrap();
        assert!(engine.is_move_in_flight());
        // Unit has not moved yet
        assert_eq!(engine.field().unit(id).unwrap().position, Hex::new(1, 1));

        assert!(engine.complete_move(ticket));
        let unit = engine.field().unit(id).unwrap();
        assert_eq!(unit.position, Hex::new(1, 3));
        assert!(unit.moved);
        assert!(!engine.is_move_in_flight());
    }

    #[test]
    fn test_input_ignored_while_moving() {
        let mut engine = engine(
            &[
                (Hex::new(1, 1), UnitType::Infantry, Player::Grey),
                (Hex::new(3, 1), UnitType::Infantry, Player::Grey),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        let a = id_at(&engine, Hex::new(1, 1));
        let b = id_at(&engine, Hex::new(3, 1));
        engine.handle_unit_click(a);
        let ticket = engine.handle_hex_click(Hex::new(1, 2)).unwrap();

        engine.handle_unit_click(b);
        assert!(engine.state().selection.is_empty());
        assert!(engine.end_phase().is_none());
        assert_eq!(engine.state().phase, TurnPhase::Move);

        assert!(!engine.complete_move(MoveTicket(ticket.0 + 1)));
        assert!(engine.complete_move(ticket));
        engine.handle_unit_click(b);
        assert_eq!(engine.state().selection, vec![b]);
    }

    #[test]
    fn test_moved_unit_cannot_be_reselected() {
        let mut engine = engine(
            &[
                (Hex::new(1, 1), UnitType::Tank, Player::Grey),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        let id = id_at(&engine, Hex::new(1, 1));
        engine.handle_unit_click(id);
        let ticket = engine.handle_hex_click(Hex::new(2, 2)).unwrap();
        engine.complete_move(ticket);
        engine.handle_unit_click(id);
        assert!(engine.state().selection.is_empty());
    }

    #[test]
    fn test_clicking_selected_unit_deselects() {
        let mut engine = engine(
            &[
                (Hex::new(1, 1), UnitType::Tank, Player::Grey),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        let id = id_at(&engine, Hex::new(1, 1));
        engine.handle_unit_click(id);
        assert!(!engine.highlighted().is_empty());
        engine.handle_unit_click(id);
        assert!(engine.state().selection.is_empty());
        assert!(engine.highlighted().is_empty());
    }

    #[test]
    fn test_attack_selection_highlights_common_enemies() {
        let mut engine = engine(
            &[
                (Hex::new(2, 1), UnitType::Infantry, Player::Grey),
                (Hex::new(1, 2), UnitType::Infantry, Player::Grey),
                (Hex::new(2, 2), UnitType::Tank, Player::Green),
                (Hex::new(3, 1), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        engine.end_phase();
        let a = id_at(&engine, Hex::new(2, 1));
        let b = id_at(&engine, Hex::new(1, 2));
        engine.handle_unit_click(a);
        let mut first = engine.highlighted().to_vec();
        first.sort();
        assert_eq!(first, vec![Hex::new(2, 2), Hex::new(3, 1)]);

        engine.handle_unit_click(b);
        assert_eq!(engine.highlighted(), &[Hex::new(2, 2)]);
        assert_eq!(engine.state().selection, vec![a, b]);

        engine.handle_unit_click(a);
        assert_eq!(engine.state().selection, vec![b]);
    }

    #[test]
    fn test_multi_attacker_damage_assignment() {
        // 3 + 3 vs 2 is 3:1, die 6 -> EX
        let mut engine = engine(
            &[
                (Hex::new(2, 1), UnitType::Infantry, Player::Grey),
                (Hex::new(1, 2), UnitType::Infantry, Player::Grey),
                (Hex::new(2, 2), UnitType::Tank, Player::Green),
                (Hex::new(6, 6), UnitType::Tank, Player::Green),
            ],
            &[6],
        );
        engine.end_phase();
        let a = id_at(&engine, Hex::new(2, 1));
        let b = id_at(&engine, Hex::new(1, 2));
        let d = id_at(&engine, Hex::new(2, 2));
        engine.handle_unit_click(a);
        engine.handle_unit_click(b);
        engine.handle_unit_click(d);

        assert_eq!(engine.state().current_special_phase(), Some(SpecialPhase::AttackerDamage));
        assert_eq!(engine.state().unassigned_damage, 1);
        assert_eq!(engine.end_phase(), Some(PhaseTransition::Rejected));

        // Defender is not an eligible pick
        engine.handle_unit_click(d);
        assert_eq!(engine.state().unassigned_damage, 1);

        engine.handle_unit_click(b);
        assert_eq!(engine.field().unit(b).unwrap().health, HealthStatus::Reduced);
        assert_eq!(engine.field().unit(a).unwrap().health, HealthStatus::Full);
        assert_eq!(engine.state().current_special_phase(), None);
        assert_eq!(engine.field().unit(d).unwrap().health, HealthStatus::Reduced);
    }

    #[test]
    fn test_advance_into_vacated_hex() {
        // Tank 6 vs infantry 2 is 3:1, die 1 -> D2
        let mut engine = engine(
            &[
                (Hex::new(2, 1), UnitType::Tank, Player::Grey),
                (Hex::new(2, 2), UnitType::Infantry, Player::Green),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        engine.end_phase();
        let tank = id_at(&engine, Hex::new(2, 1));
        let defender = id_at(&engine, Hex::new(2, 2));
        engine.handle_unit_click(tank);
        engine.handle_unit_click(defender);

        assert!(engine.field().unit(defender).is_none());
        assert_eq!(engine.state().current_special_phase(), Some(SpecialPhase::Advance));
        assert_eq!(engine.state().vacated_hex, Some(Hex::new(2, 2)));
        assert_eq!(engine.highlighted(), &[Hex::new(2, 2)]);

        // No move without a selected attacker
        assert!(engine.handle_hex_click(Hex::new(2, 2)).is_none());
        engine.handle_unit_click(tank);
        let ticket = engine.handle_hex_click(Hex::new(2, 2)).unwrap();
        assert!(engine.complete_move(ticket));

        let unit = engine.field().unit(tank).unwrap();
        assert_eq!(unit.position, Hex::new(2, 2));
        assert!(unit.advanced);
        assert_eq!(engine.state().current_special_phase(), None);
        assert_eq!(engine.state().phase, TurnPhase::Attack);
    }

    #[test]
    fn test_no_effect_combat_leaves_no_involved_attackers() {
        // Infantry 3 vs tank 2 is 3:2, die 5 -> NE
        let mut engine = engine(
            &[
                (Hex::new(2, 1), UnitType::Infantry, Player::Grey),
                (Hex::new(2, 2), UnitType::Tank, Player::Green),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[5],
        );
        engine.end_phase();
        let attacker = id_at(&engine, Hex::new(2, 1));
        let defender = id_at(&engine, Hex::new(2, 2));
        engine.handle_unit_click(attacker);
        engine.handle_unit_click(defender);

        assert!(engine.state().combat_result.is_some());
        assert!(engine.field().unit(attacker).unwrap().attacked);
        assert_eq!(engine.field().unit(defender).unwrap().health, HealthStatus::Full);
        assert_eq!(engine.state().current_special_phase(), None);
        assert!(engine.state().involved_attackers.is_empty());

        assert_eq!(engine.end_phase(), Some(PhaseTransition::TurnPassed(Player::Green)));
        assert!(engine.state().involved_attackers.is_empty());
        assert!(engine.dimmed_units().is_empty());
    }

    #[test]
    fn test_end_phase_skips_advance() {
        let mut engine = engine(
            &[
                (Hex::new(2, 1), UnitType::Tank, Player::Grey),
                (Hex::new(2, 2), UnitType::Infantry, Player::Green),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        engine.end_phase();
        let tank = id_at(&engine, Hex::new(2, 1));
        engine.handle_unit_click(tank);
        engine.handle_unit_click_at(Hex::new(2, 2));
        assert_eq!(
            engine.end_phase(),
            Some(PhaseTransition::SpecialPhaseEnded(SpecialPhase::Advance))
        );
        assert_eq!(engine.state().phase, TurnPhase::Attack);
        assert_eq!(engine.field().unit(tank).unwrap().position, Hex::new(2, 1));
        assert_eq!(engine.end_phase(), Some(PhaseTransition::TurnPassed(Player::Green)));
    }

    #[test]
    fn test_advance_skipped_when_attacker_dies() {
        // Reduced infantry 2 vs reduced infantry 1 is 2:1, die 5 -> EX
        let mut engine = engine(
            &[
                (Hex::new(2, 1), UnitType::Infantry, Player::Grey),
                (Hex::new(2, 2), UnitType::Infantry, Player::Green),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
                (Hex::new(0, 6), UnitType::Infantry, Player::Grey),
            ],
            &[5],
        );
        let attacker = id_at(&engine, Hex::new(2, 1));
        let defender = id_at(&engine, Hex::new(2, 2));
        engine.field.unit_mut(attacker).unwrap().take_damage();
        engine.field.unit_mut(defender).unwrap().take_damage();
        engine.end_phase();
        engine.handle_unit_click(attacker);
        engine.handle_unit_click(defender);

        assert!(engine.field().unit(attacker).is_none());
        assert!(engine.field().unit(defender).is_none());
        assert_eq!(engine.state().current_special_phase(), None);
        assert!(engine.state().vacated_hex.is_none());
    }

    #[test]
    fn test_flag_capture_wins() {
        let mut scenario = scenario(&[
            (Hex::new(2, 2), UnitType::Tank, Player::Grey),
            (Hex::new(6, 6), UnitType::Infantry, Player::Green),
        ]);
        scenario.field.grid.set_terrain(Hex::new(2, 3), TerrainType::Flag);
        scenario.field.grid.set_owner(Hex::new(2, 3), Some(Player::Green));
        let mut engine = GameEngine::with_die(scenario, RulesConfig::default(), Box::new(LoadedDie::always(1)));

        let tank = id_at(&engine, Hex::new(2, 2));
        engine.handle_unit_click(tank);
        let ticket = engine.handle_hex_click(Hex::new(2, 3)).unwrap();
        engine.complete_move(ticket);
        assert_eq!(engine.state().winner, Some(Player::Grey));
        assert!(engine.state().is_ended());

        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(e, EngineEvent::WinnerUpdated { winner: Player::Grey })));
        assert!(engine.end_phase().is_none());
    }

    #[test]
    fn test_unsupplied_unit_flag() {
        let mut engine = engine(
            &[
                (Hex::new(4, 4), UnitType::Tank, Player::Grey),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        let tank = id_at(&engine, Hex::new(4, 4));
        assert!(engine.field().unit(tank).unwrap().supplied);

        // Wall off the west edge with water
        let mut scenario = engine.to_scenario();
        for y in 0..8 {
            scenario.field.grid.set_terrain(Hex::new(1, y), TerrainType::Water);
        }
        engine = GameEngine::with_die(scenario, RulesConfig::default(), Box::new(LoadedDie::always(1)));
        assert!(!engine.field().unit(tank).unwrap().supplied);
    }

    #[test]
    fn test_dimmed_units_follow_phase() {
        let mut engine = engine(
            &[
                (Hex::new(1, 1), UnitType::Infantry, Player::Grey),
                (Hex::new(6, 6), UnitType::Infantry, Player::Green),
            ],
            &[1],
        );
        let id = id_at(&engine, Hex::new(1, 1));
        assert!(engine.dimmed_units().is_empty());
        engine.handle_unit_click(id);
        let ticket = engine.handle_hex_click(Hex::new(1, 2)).unwrap();
        engine.complete_move(ticket);
        assert_eq!(engine.dimmed_units(), vec![id]);
        engine.end_phase();
        assert!(engine.dimmed_units().is_empty());
    }
}
