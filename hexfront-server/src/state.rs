//! Server state management
//!
//! One engine session shared by every request, plus the rules used when a
//! new scenario is loaded.

use hexfront_core::{GameEngine, RulesConfig, Scenario};
use std::sync::RwLock;

/// Server-wide shared state
pub struct ServerState {
    pub game: RwLock<Option<GameEngine>>,
    pub rules: RwLock<RulesConfig>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::with_rules(RulesConfig::default())
    }

    pub fn with_rules(rules: RulesConfig) -> Self {
        Self {
            game: RwLock::new(None),
            rules: RwLock::new(rules),
        }
    }

    /// Replace the running session with a fresh game on `scenario`
    pub fn start_game(&self, scenario: Scenario) {
        let rules = self.rules.read().unwrap().clone();
        let engine = GameEngine::new(scenario, rules);
        *self.game.write().unwrap() = Some(engine);
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
