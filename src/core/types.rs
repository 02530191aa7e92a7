//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Game tick counter (simulation time unit, 60 per reference second)
pub type Tick = u64;

/// Index of a unit in the battle roster
///
/// Ids are handed out in spawn order and never reused within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two opposing sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Blue,
    Orange,
}

impl Team {
    pub fn opponent(&self) -> Team {
        match self {
            Team::Blue => Team::Orange,
            Team::Orange => Team::Blue,
        }
    }

    /// Corner the team deploys from on a square map of `size` cells
    pub fn home_corner(&self, size: usize) -> (i32, i32) {
        match self {
            Team::Blue => (0, 0),
            Team::Orange => (size as i32 - 1, size as i32 - 1),
        }
    }

    pub fn all() -> [Team; 2] {
        [Team::Blue, Team::Orange]
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Blue => write!(f, "Blue"),
            Team::Orange => write!(f, "Orange"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_index() {
        assert_eq!(UnitId::new(7).index(), 7);
        assert_eq!(UnitId(3).to_string(), "#3");
    }

    #[test]
    fn test_team_opponent() {
        assert_eq!(Team::Blue.opponent(), Team::Orange);
        assert_eq!(Team::Orange.opponent(), Team::Blue);
    }

    #[test]
    fn test_home_corners_are_opposite() {
        assert_eq!(Team::Blue.home_corner(30), (0, 0));
        assert_eq!(Team::Orange.home_corner(30), (29, 29));
    }
}
