//! Battle terrain types and their effects
//!
//! Rock stops movement, fire and sight. Trees hide whatever is in them.
//! Water stops movement but not bullets.

use serde::{Deserialize, Serialize};

/// Classification of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CellKind {
    #[default]
    Open,
    Rock,         // hard block
    Tree,         // concealment
    Water,        // soft block
    AmmoDepot,
    MedicalDepot,
}

impl CellKind {
    /// Can a unit stand here?
    pub fn is_walkable(&self) -> bool {
        !matches!(self, CellKind::Rock | CellKind::Water)
    }

    /// Does this cell stop a sight line (and therefore a shot)?
    pub fn blocks_sight(&self) -> bool {
        matches!(self, CellKind::Rock | CellKind::Tree)
    }

    pub fn is_concealment(&self) -> bool {
        matches!(self, CellKind::Tree)
    }

    pub fn is_depot(&self) -> bool {
        matches!(self, CellKind::AmmoDepot | CellKind::MedicalDepot)
    }

    /// Does standing next to this cell count as cover?
    pub fn provides_cover(&self) -> bool {
        self.blocks_sight()
    }

    /// Character used in map files
    pub fn symbol(&self) -> char {
        match self {
            CellKind::Open => '.',
            CellKind::Rock => '#',
            CellKind::Tree => 'T',
            CellKind::Water => '~',
            CellKind::AmmoDepot => 'A',
            CellKind::MedicalDepot => 'M',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(CellKind::Open),
            '#' => Some(CellKind::Rock),
            'T' => Some(CellKind::Tree),
            '~' => Some(CellKind::Water),
            'A' => Some(CellKind::AmmoDepot),
            'M' => Some(CellKind::MedicalDepot),
            _ => None,
        }
    }
}

/// Which kind of depot a logistics unit recharges at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepotKind {
    Ammo,
    Medical,
}

impl DepotKind {
    pub fn cell(&self) -> CellKind {
        match self {
            DepotKind::Ammo => CellKind::AmmoDepot,
            DepotKind::Medical => CellKind::MedicalDepot,
        }
    }
}
