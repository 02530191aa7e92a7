//! Battle system - squad tactics on a square grid with line-of-sight fog
//!
//! Two teams of five units (command, two assault, medic, supply) fight over
//! dense terrain. Every unit runs its own state machine on a fixed cadence;
//! nothing is scripted from above except the command unit's dispatch orders.
//!
//! Key pieces:
//! - Perception is per unit and blocked by rock and trees
//! - Search is danger-aware, so units route around sighted enemies
//! - A stability guard breaks short movement loops and drags units out of
//!   concealment they have hidden in too long

pub mod ai;
pub mod battle_map;
pub mod constants;
pub mod coord;
pub mod danger;
pub mod execution;
pub mod movement;
pub mod pathfinding;
pub mod scenario;
pub mod stability;
pub mod terrain;
pub mod units;
pub mod visibility;

// Re-exports for convenient access
pub use ai::{
    update_unit, AssaultMode, AssaultState, CommandState, LogisticsKind, LogisticsMode,
    LogisticsState, TickContext,
};
pub use battle_map::BattleMap;
pub use constants::*;
pub use coord::{Direction, GridCoord};
pub use danger::DangerField;
pub use execution::{
    check_battle_end, BattleEvent, BattleEventLog, BattleEventType, BattleOutcome, BattlePhase,
    BattleState, BattleStats, BattleSummary,
};
pub use movement::Evasion;
pub use pathfinding::{bounded_search, find_nearest_cover, find_nearest_open, find_path, path_cost};
pub use scenario::{deploy, prepare_map, standard_battle};
pub use stability::{GuardOutcome, PositionHistory, StabilityGuard};
pub use terrain::{CellKind, DepotKind};
pub use units::{Others, Role, RoleState, Roster, Route, Unit};
pub use visibility::VisibilitySet;
