//! HEXFRONT Core - Rules engine for a hex-and-counter wargame
//!
//! This crate provides the game logic behind the browser view:
//! - Board geometry (offset hex grid with a clipped bottom row)
//! - Terrain and unit tables
//! - Movement reachability with terrain, river, road and zone-of-control costs
//! - Supply networks traced from map edges and owned cities
//! - Combat resolution against an odds-based results table
//! - Turn/phase state machine and the input-driven game engine
//! - Scenario file loading and saving

pub mod terrain;
pub mod unit;
pub mod board;
pub mod grid;
pub mod battlefield;
pub mod pathfinder;
pub mod supply;
pub mod dice;
pub mod combat;
pub mod state;
pub mod engine;
pub mod scenario;
pub mod config;
pub mod error;

// Re-exports for convenient access
pub use board::{GridSize, Hex, HexLayout};
pub use terrain::{TerrainType, TerrainProperties, MAX_MOVEMENT_COST};
pub use unit::{HealthStatus, Player, Unit, UnitId, UnitType};
pub use grid::{Grid, HexTile};
pub use battlefield::Battlefield;
pub use pathfinder::{find_path, reachable_hexes, Reachability};
pub use supply::{supplied_hexes, SupplyConfig, SupplyEdges};
pub use dice::{Die, LoadedDie, RngDie};
pub use combat::{CombatReport, CombatResultsTable, ResultCode};
pub use state::{GameState, GameStatus, PhaseTransition, SpecialPhase, TurnPhase};
pub use engine::{EngineEvent, GameEngine, MoveTicket};
pub use scenario::Scenario;
pub use config::RulesConfig;
pub use error::ScenarioError;
