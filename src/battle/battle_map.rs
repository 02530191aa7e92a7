//! Battle map: square terrain grid and line of sight
//!
//! The map is static within a match. It is supplied from outside (map file or
//! the standard skirmish layout); nothing here generates terrain.

use serde::{Deserialize, Serialize};

use crate::battle::coord::GridCoord;
use crate::battle::terrain::{CellKind, DepotKind};
use crate::core::error::{Result, SkirmishError};

/// The full battle map, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleMap {
    pub size: usize,
    cells: Vec<CellKind>,
}

impl BattleMap {
    /// Create a new map of open ground
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![CellKind::Open; size * size],
        }
    }

    /// Parse a map from text, one row per line
    ///
    /// Blank lines and lines starting with `;` are skipped. The map must be
    /// square.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let rows: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with(';'))
            .collect();

        let size = rows.len();
        if size == 0 {
            return Err(SkirmishError::MapParse {
                line: 0,
                reason: "map has no rows".into(),
            });
        }

        let mut cells = Vec::with_capacity(size * size);
        for (line, row) in &rows {
            let width = row.chars().count();
            if width != size {
                return Err(SkirmishError::MapParse {
                    line: *line,
                    reason: format!("expected {size} cells, found {width}"),
                });
            }
            for symbol in row.chars() {
                let kind = CellKind::from_symbol(symbol).ok_or_else(|| SkirmishError::MapParse {
                    line: *line,
                    reason: format!("unknown cell symbol '{symbol}'"),
                })?;
                cells.push(kind);
            }
        }

        Ok(Self { size, cells })
    }

    /// Render the map in the same format `from_ascii` reads
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.size * (self.size + 1));
        for row in self.cells.chunks(self.size) {
            out.extend(row.iter().map(|c| c.symbol()));
            out.push('\n');
        }
        out
    }

    /// Check if coordinate is within map bounds
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.row >= 0
            && coord.col >= 0
            && (coord.row as usize) < self.size
            && (coord.col as usize) < self.size
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        self.in_bounds(coord)
            .then(|| coord.row as usize * self.size + coord.col as usize)
    }

    /// Get the terrain at a coordinate
    pub fn get(&self, coord: GridCoord) -> Option<CellKind> {
        self.index(coord).map(|i| self.cells[i])
    }

    /// Set terrain at a coordinate
    pub fn set_terrain(&mut self, coord: GridCoord, kind: CellKind) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = kind;
        }
    }

    /// Is this an in-bounds cell a unit may stand on?
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.get(coord).is_some_and(|c| c.is_walkable())
    }

    pub fn is_concealment(&self, coord: GridCoord) -> bool {
        self.get(coord).is_some_and(|c| c.is_concealment())
    }

    pub fn is_depot(&self, coord: GridCoord) -> bool {
        self.get(coord).is_some_and(|c| c.is_depot())
    }

    /// A cell is cover when one of its 4 neighbours is rock or tree
    pub fn is_cover(&self, coord: GridCoord) -> bool {
        coord
            .neighbors()
            .iter()
            .any(|n| self.get(*n).is_some_and(|c| c.provides_cover()))
    }

    /// Check line of sight between two cells
    ///
    /// Every cell on the rasterized line after `from` is tested, the target
    /// included, so a unit standing in a tree cannot be seen or shot.
    pub fn has_line_of_sight(&self, from: GridCoord, to: GridCoord) -> bool {
        from.line_to(&to)
            .iter()
            .skip(1)
            .all(|coord| !self.get(*coord).is_some_and(|c| c.blocks_sight()))
    }

    /// All cells, row-major
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        let size = self.size as i32;
        (0..size).flat_map(move |row| (0..size).map(move |col| GridCoord::new(row, col)))
    }

    /// Depot of the given kind closest (Manhattan) to `corner`
    ///
    /// Ties keep the first depot in row-major order.
    pub fn nearest_depot(&self, kind: DepotKind, corner: GridCoord) -> Option<GridCoord> {
        let wanted = kind.cell();
        self.coords()
            .filter(|c| self.get(*c) == Some(wanted))
            .min_by_key(|c| c.distance(&corner))
    }
}
