use thiserror::Error;

use crate::battle::coord::GridCoord;
use crate::core::types::UnitId;

#[derive(Error, Debug)]
pub enum SkirmishError {
    #[error("Unit not found: {0:?}")]
    UnitNotFound(UnitId),

    #[error("Cell {0:?} is outside the {1}x{1} map")]
    OutOfBounds(GridCoord, usize),

    #[error("Cell {0:?} cannot hold a unit")]
    BlockedCell(GridCoord),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed map at line {line}: {reason}")]
    MapParse { line: usize, reason: String },

    #[error("Map is {size}x{size}, deployment needs at least {min}x{min}")]
    MapTooSmall { size: usize, min: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SkirmishError>;
