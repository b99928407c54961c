//! Turn/phase state machine

use std::collections::VecDeque;

use crate::board::Hex;
use crate::unit::{Player, UnitId};
use serde::{Deserialize, Serialize};

// ============================================================================
// PHASES
// ============================================================================

/// Normal phase within a player's turn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    #[default]
    Move,
    Attack,
}

/// Sub-phase queued by a combat outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecialPhase {
    /// Owner picks which attacker absorbs pending loss points
    AttackerDamage,
    /// A surviving attacker may move into the vacated hex
    Advance,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Ongoing,
    Ended,
}

/// Last combat outcome kept for display
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatDisplay {
    pub row_index: usize,
    pub row_label: String,
    pub die: u8,
}

/// Outcome of an end-phase request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseTransition {
    /// Pending damage must be assigned first
    Rejected,
    SpecialPhaseEnded(SpecialPhase),
    /// Same player, next phase
    Phase(TurnPhase),
    /// Play passed to this player in MOVE
    TurnPassed(Player),
}

// ============================================================================
// GAME STATE
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub active_player: Player,
    pub starting_player: Player,
    pub phase: TurnPhase,
    special_phases: VecDeque<SpecialPhase>,
    pub selection: Vec<UnitId>,
    pub combat_result: Option<CombatDisplay>,
    pub unassigned_damage: u8,
    pub vacated_hex: Option<Hex>,
    /// Attackers of the combat that queued the current special phases
    pub involved_attackers: Vec<UnitId>,
    pub status: GameStatus,
    pub winner: Option<Player>,
    /// Full rounds, starting at 1
    pub turn: u32,
}

impl GameState {
    pub fn new(starting_player: Player) -> Self {
        Self {
            active_player: starting_player,
            starting_player,
            phase: TurnPhase::Move,
            special_phases: VecDeque::new(),
            selection: Vec::new(),
            combat_result: None,
            unassigned_damage: 0,
            vacated_hex: None,
            involved_attackers: Vec::new(),
            status: GameStatus::Ongoing,
            winner: None,
            turn: 1,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.status == GameStatus::Ended
    }

    /// Head of the special-phase queue
    pub fn current_special_phase(&self) -> Option<SpecialPhase> {
        self.special_phases.front().copied()
    }

    pub fn special_phases(&self) -> impl Iterator<Item = SpecialPhase> + '_ {
        self.special_phases.iter().copied()
    }

    pub fn push_special_phase(&mut self, phase: SpecialPhase) {
        if !self.special_phases.contains(&phase) {
            self.special_phases.push_back(phase);
        }
    }

    /// Pop the current special phase and clear the data it consumed
    pub fn end_special_phase(&mut self) -> Option<SpecialPhase> {
        let ended = self.special_phases.pop_front()?;
        match ended {
            SpecialPhase::AttackerDamage => self.unassigned_damage = 0,
            SpecialPhase::Advance => self.vacated_hex = None,
        }
        if self.special_phases.is_empty() {
            self.involved_attackers.clear();
        }
        self.selection.clear();
        Some(ended)
    }

    /// Advance the phase machine; unit flag resets are the caller's job
    pub fn end_phase(&mut self) -> PhaseTransition {
        match self.current_special_phase() {
            Some(SpecialPhase::AttackerDamage) => return PhaseTransition::Rejected,
            Some(SpecialPhase::Advance) => {
                self.end_special_phase();
                return PhaseTransition::SpecialPhaseEnded(SpecialPhase::Advance);
            }
            None => {}
        }

        self.selection.clear();
        match self.phase {
            TurnPhase::Move => {
                self.phase = TurnPhase::Attack;
                PhaseTransition::Phase(TurnPhase::Attack)
            }
            TurnPhase::Attack => {
                self.active_player = self.active_player.opponent();
                self.phase = TurnPhase::Move;
                self.combat_result = None;
                if self.active_player == self.starting_player {
                    self.turn += 1;
                }
                PhaseTransition::TurnPassed(self.active_player)
            }
        }
    }

    pub fn declare_winner(&mut self, player: Player) {
        self.winner = Some(player);
        self.status = GameStatus::Ended;
        self.selection.clear();
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Player::Grey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle() {
        let mut state = GameState::new(Player::Grey);
        assert_eq!(state.end_phase(), PhaseTransition::Phase(TurnPhase::Attack));
        assert_eq!(state.active_player, Player::Grey);
        assert_eq!(state.end_phase(), PhaseTransition::TurnPassed(Player::Green));
        assert_eq!(state.phase, TurnPhase::Move);
        assert_eq!(state.turn, 1);

        state.end_phase();
        assert_eq!(state.end_phase(), PhaseTransition::TurnPassed(Player::Grey));
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_damage_phase_blocks_end_phase() {
        let mut state = GameState::new(Player::Green);
        state.phase = TurnPhase::Attack;
        state.unassigned_damage = 1;
        state.push_special_phase(SpecialPhase::AttackerDamage);
        assert_eq!(state.end_phase(), PhaseTransition::Rejected);
        assert_eq!(state.phase, TurnPhase::Attack);
        assert_eq!(state.active_player, Player::Green);
    }

    #[test]
    fn test_advance_phase_ends_first() {
        let mut state = GameState::new(Player::Grey);
        state.phase = TurnPhase::Attack;
        state.vacated_hex = Some(Hex::new(2, 2));
        state.involved_attackers = vec![UnitId(0)];
        state.push_special_phase(SpecialPhase::Advance);

        assert_eq!(
            state.end_phase(),
            PhaseTransition::SpecialPhaseEnded(SpecialPhase::Advance)
        );
        assert_eq!(state.phase, TurnPhase::Attack);
        assert!(state.vacated_hex.is_none());
        assert!(state.involved_attackers.is_empty());
        assert_eq!(state.end_phase(), PhaseTransition::TurnPassed(Player::Green));
    }

    #[test]
    fn test_special_phase_queue_is_fifo() {
        let mut state = GameState::default();
        state.push_special_phase(SpecialPhase::AttackerDamage);
        state.push_special_phase(SpecialPhase::Advance);
        state.push_special_phase(SpecialPhase::Advance);
        assert_eq!(state.special_phases().count(), 2);
        assert_eq!(state.current_special_phase(), Some(SpecialPhase::AttackerDamage));
        assert_eq!(state.end_special_phase(), Some(SpecialPhase::AttackerDamage));
        assert_eq!(state.current_special_phase(), Some(SpecialPhase::Advance));
        assert_eq!(state.end_special_phase(), Some(SpecialPhase::Advance));
        assert_eq!(state.end_special_phase(), None);
    }

    #[test]
    fn test_turn_pass_clears_combat_display() {
        let mut state = GameState::default();
        state.phase = TurnPhase::Attack;
        state.combat_result = Some(CombatDisplay {
            row_index: 1,
            row_label: "1:1".to_string(),
            die: 3,
        });
        state.end_phase();
        assert!(state.combat_result.is_none());
    }
}
