//! Combat results table and attack resolution

use crate::battlefield::Battlefield;
use crate::board::Hex;
use crate::dice::Die;
use crate::error::ScenarioError;
use crate::grid::Grid;
use crate::unit::{HealthStatus, Unit, UnitId};
use serde::{Deserialize, Serialize};

// ============================================================================
// RESULTS TABLE
// ============================================================================

/// Outcome code of a table cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    /// No effect
    NE,
    /// Attacker loses a step
    A1,
    /// Defender loses a step
    D1,
    /// Defender loses two steps
    D2,
    /// Both sides lose a step
    EX,
}

/// Signed health steps lost by each side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub attacker: i8,
    pub defender: i8,
}

impl ResultCode {
    pub fn effect(self) -> Effect {
        let (attacker, defender) = match self {
            ResultCode::NE => (0, 0),
            ResultCode::A1 => (-1, 0),
            ResultCode::D1 => (0, -1),
            ResultCode::D2 => (0, -2),
            ResultCode::EX => (-1, -1),
        };
        Effect { attacker, defender }
    }
}

/// One odds row: applies when attack/defense >= `ratio`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrtRow {
    pub ratio: f32,
    pub label: String,
    /// Results for die faces 1..=6
    pub results: [ResultCode; 6],
}

impl CrtRow {
    fn new(ratio: f32, label: &str, results: [ResultCode; 6]) -> Self {
        Self {
            ratio,
            label: label.to_string(),
            results,
        }
    }

    pub fn result(&self, die: u8) -> ResultCode {
        self.results[(die.clamp(1, 6) - 1) as usize]
    }
}

/// Rows in ascending ratio order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CrtRow>", into = "Vec<CrtRow>")]
pub struct CombatResultsTable {
    rows: Vec<CrtRow>,
}

impl CombatResultsTable {
    pub fn new(rows: Vec<CrtRow>) -> Result<Self, ScenarioError> {
        if rows.is_empty() {
            return Err(ScenarioError::EmptyCombatTable);
        }
        if rows.windows(2).any(|w| w[0].ratio >= w[1].ratio) {
            return Err(ScenarioError::UnsortedCombatTable);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[CrtRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &CrtRow {
        &self.rows[index.min(self.rows.len() - 1)]
    }

    /// Highest row whose threshold is <= `ratio`, first row when none qualify
    pub fn select_row(&self, ratio: f32) -> usize {
        self.rows.iter().rposition(|row| row.ratio <= ratio).unwrap_or(0)
    }

    /// Apply a column shift, clamped to the table
    pub fn shift_row(&self, index: usize, shift: i32) -> usize {
        let last = self.rows.len() as i64 - 1;
        (index as i64 + shift as i64).clamp(0, last) as usize
    }
}

impl TryFrom<Vec<CrtRow>> for CombatResultsTable {
    type Error = ScenarioError;

    fn try_from(rows: Vec<CrtRow>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<CombatResultsTable> for Vec<CrtRow> {
    fn from(table: CombatResultsTable) -> Self {
        table.rows
    }
}

impl Default for CombatResultsTable {
    fn default() -> Self {
        use ResultCode::*;
        Self {
            rows: vec![
                CrtRow::new(0.5, "1:2", [D1, NE, NE, A1, A1, A1]),
                CrtRow::new(1.0, "1:1", [D1, D1, NE, EX, A1, A1]),
                CrtRow::new(1.5, "3:2", [D2, D1, D1, EX, NE, A1]),
                CrtRow::new(2.0, "2:1", [D2, D2, D1, D1, EX, A1]),
                CrtRow::new(3.0, "3:1", [D2, D2, D2, D1, D1, EX]),
                CrtRow::new(4.0, "4:1", [D2, D2, D2, D2, D1, D1]),
            ],
        }
    }
}

// ============================================================================
// STRENGTHS
// ============================================================================

/// Which strength values enter combat
#[derive(Clone, Copy, Debug, Default)]
pub struct CombatOptions {
    /// Use supply-adjusted strengths instead of health-only base values
    pub supply_penalty: bool,
}

/// One attacker's contribution against a defender at `defender_hex`
pub fn attacker_strength(grid: &Grid, attacker: &Unit, defender_hex: Hex, options: CombatOptions) -> u32 {
    let base = if options.supply_penalty {
        attacker.effective_attack()
    } else {
        attacker.base_attack()
    };
    let modifier = grid
        .terrain(attacker.position)
        .map(|t| t.attack_modifier())
        .unwrap_or(1.0);
    let strength = (base as f32 * modifier).floor() as u32;
    if grid.is_river_between(attacker.position, defender_hex) {
        strength * 2 / 3
    } else {
        strength
    }
}

pub fn defender_strength(defender: &Unit, options: CombatOptions) -> u32 {
    if options.supply_penalty {
        defender.effective_defense()
    } else {
        defender.base_defense()
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Everything observable about one resolved attack
#[derive(Clone, Debug, Serialize)]
pub struct CombatReport {
    pub attackers: Vec<UnitId>,
    pub defender: UnitId,
    pub attack_strength: u32,
    pub defense_strength: u32,
    pub ratio: f32,
    /// Row after the terrain shift
    pub row_index: usize,
    pub row_label: String,
    pub die: u8,
    pub result: ResultCode,
    pub effect: Effect,
    pub original_attacker_health: Vec<HealthStatus>,
    pub original_defender_health: HealthStatus,
    pub defender_health: HealthStatus,
    /// A lone attacker took its loss directly
    pub attacker_took_damage: bool,
    /// Loss points to be assigned among several attackers
    pub deferred_attacker_damage: u8,
    pub defender_destroyed: bool,
    pub vacated_hex: Option<Hex>,
}

/// Resolve an attack by `attackers` on `defender`, mutating unit health.
///
/// Attackers must already be validated as adjacent, eligible and not yet
/// attacked this turn. Returns `None` when an id is unknown or no attacker
/// is given. Dead units are left in place for the caller to clean up.
pub fn resolve_attack(
    field: &mut Battlefield,
    table: &CombatResultsTable,
    attackers: &[UnitId],
    defender: UnitId,
    die: &mut dyn Die,
    options: CombatOptions,
) -> Option<CombatReport> {
    if attackers.is_empty() || attackers.iter().any(|id| field.unit(*id).is_none()) {
        return None;
    }
    let defender_unit = field.unit(defender)?.clone();
    let defender_hex = defender_unit.position;

    for id in attackers {
        if let Some(unit) = field.unit_mut(*id) {
            unit.attacked = true;
        }
    }

    let attack_strength: u32 = attackers
        .iter()
        .filter_map(|id| field.unit(*id))
        .map(|unit| attacker_strength(&field.grid, unit, defender_hex, options))
        .sum();
    let defense_strength = defender_strength(&defender_unit, options);
    let ratio = if defense_strength == 0 {
        f32::INFINITY
    } else {
        attack_strength as f32 / defense_strength as f32
    };

    let shift = field
        .grid
        .terrain(defender_hex)
        .map(|t| t.defender_crt_shift())
        .unwrap_or(0);
    let row_index = table.shift_row(table.select_row(ratio), shift);
    let row = table.row(row_index);

    let die_value = die.roll();
    let result = row.result(die_value);
    let effect = result.effect();

    let original_attacker_health: Vec<HealthStatus> = attackers
        .iter()
        .filter_map(|id| field.unit(*id).map(|u| u.health))
        .collect();
    let original_defender_health = defender_unit.health;

    // Attacker losses are a single step regardless of the table magnitude
    let mut attacker_took_damage = false;
    let mut deferred_attacker_damage = 0;
    if effect.attacker < 0 {
        if attackers.len() > 1 {
            deferred_attacker_damage = 1;
        } else if let Some(unit) = field.unit_mut(attackers[0]) {
            unit.take_damage();
            attacker_took_damage = true;
        }
    }

    let defender_steps = (-effect.defender).clamp(0, 2);
    let defender_health = {
        let unit = field.unit_mut(defender)?;
        for _ in 0..defender_steps {
            unit.take_damage();
        }
        unit.health
    };
    let defender_destroyed = defender_health == HealthStatus::Dead;

    tracing::info!(
        "Combat {}:{} ({}), die {} -> {:?}",
        attack_strength,
        defense_strength,
        row.label,
        die_value,
        result
    );

    Some(CombatReport {
        attackers: attackers.to_vec(),
        defender,
        attack_strength,
        defense_strength,
        ratio,
        row_index,
        row_label: row.label.clone(),
        die: die_value,
        result,
        effect,
        original_attacker_health,
        original_defender_health,
        defender_health,
        attacker_took_damage,
        deferred_attacker_damage,
        defender_destroyed,
        vacated_hex: defender_destroyed.then_some(defender_hex),
    })
}
