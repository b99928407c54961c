//! Rules configuration

use std::path::Path;

use crate::combat::{CombatOptions, CombatResultsTable};
use crate::dice::RngDie;
use crate::error::{Result, ScenarioError};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Tunable rules for one game session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub combat_table: CombatResultsTable,
    /// Die seed; entropy when absent
    pub seed: Option<u64>,
    /// Apply the out-of-supply penalty to combat strengths
    pub supply_penalty_in_combat: bool,
}

impl RulesConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn combat_options(&self) -> CombatOptions {
        CombatOptions {
            supply_penalty: self.supply_penalty_in_combat,
        }
    }

    pub fn die(&self) -> RngDie<ChaCha8Rng> {
        RngDie::from_seed_option(self.seed)
    }
}
