//! Per-unit visibility
//!
//! Each unit recomputes the set of cells it can see on every behaviour
//! invocation. The command role merges its team's sets into one.
//!
//! Cost is O(cells in range × ray length) per unit. Fine at the 30×30 maps
//! this is built for, would need incremental updates on much larger grids.

use serde::{Deserialize, Serialize};

use crate::battle::battle_map::BattleMap;
use crate::battle::coord::GridCoord;

/// Boolean visibility mask over the whole grid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilitySet {
    size: usize,
    cells: Vec<bool>,
}

impl VisibilitySet {
    /// Empty set for a map of the given size
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    /// Compute everything visible from `origin` within `range` Manhattan cells
    pub fn compute(map: &BattleMap, origin: GridCoord, range: u32) -> Self {
        let mut set = Self::new(map.size);
        if !map.in_bounds(origin) {
            return set;
        }

        let r = range as i32;
        for row in (origin.row - r)..=(origin.row + r) {
            for col in (origin.col - r)..=(origin.col + r) {
                let target = GridCoord::new(row, col);
                if !map.in_bounds(target) || origin.distance(&target) > range {
                    continue;
                }
                if map.has_line_of_sight(origin, target) {
                    set.insert(target);
                }
            }
        }

        // A unit always knows its own cell, even standing in a tree
        set.insert(origin);
        set
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.row < 0 || coord.col < 0 {
            return None;
        }
        let (row, col) = (coord.row as usize, coord.col as usize);
        (row < self.size && col < self.size).then_some(row * self.size + col)
    }

    pub fn insert(&mut self, coord: GridCoord) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = true;
        }
    }

    /// Is this cell currently visible?
    pub fn contains(&self, coord: GridCoord) -> bool {
        self.index(coord).is_some_and(|i| self.cells[i])
    }

    /// Merge another set into this one
    pub fn union_with(&mut self, other: &VisibilitySet) {
        if self.size != other.size {
            *self = Self::new(other.size);
        }
        for (mine, theirs) in self.cells.iter_mut().zip(&other.cells) {
            *mine |= *theirs;
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Number of visible cells
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|v| *v)
    }
}
