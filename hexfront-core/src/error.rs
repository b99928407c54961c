//! Errors for loading scenarios and rules

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("unit at ({x}, {y}) has no owning player")]
    MissingUnitPlayer { x: i32, y: i32 },

    #[error("combat results table has no rows")]
    EmptyCombatTable,

    #[error("combat results table rows must be in ascending ratio order")]
    UnsortedCombatTable,
}

pub type Result<T> = std::result::Result<T, ScenarioError>;
