//! Danger field: per-cell threat intensity
//!
//! Recomputed by the driver once per tick. Behaviour code only reads it.

use serde::{Deserialize, Serialize};

use crate::battle::battle_map::BattleMap;
use crate::battle::coord::GridCoord;
use crate::battle::units::Roster;
use crate::core::config::TacticsConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerField {
    size: usize,
    values: Vec<i32>,
}

impl DangerField {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0; size * size],
        }
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.row < 0 || coord.col < 0 {
            return None;
        }
        let (row, col) = (coord.row as usize, coord.col as usize);
        (row < self.size && col < self.size).then_some(row * self.size + col)
    }

    /// Threat at a cell, zero outside the map
    pub fn get(&self, coord: GridCoord) -> i32 {
        self.index(coord).map_or(0, |i| self.values[i])
    }

    pub fn set(&mut self, coord: GridCoord, value: i32) {
        if let Some(i) = self.index(coord) {
            self.values[i] = value;
        }
    }

    pub fn clear(&mut self) {
        self.values.fill(0);
    }

    /// Stamp a threat centred on `center`, keeping the max per cell
    ///
    /// Covers the square of the given radius; each cell gets
    /// `peak - falloff * manhattan`, clamped at zero.
    pub fn raise(&mut self, center: GridCoord, radius: u32, peak: i32, falloff: i32) {
        let r = radius as i32;
        for row in (center.row - r)..=(center.row + r) {
            for col in (center.col - r)..=(center.col + r) {
                let coord = GridCoord::new(row, col);
                let Some(i) = self.index(coord) else {
                    continue;
                };
                let value = (peak - falloff * center.distance(&coord) as i32).max(0);
                if value > self.values[i] {
                    self.values[i] = value;
                }
            }
        }
    }

    /// Rebuild the field from every living unit's sighted enemies
    pub fn recompute(&mut self, map: &BattleMap, roster: &Roster, config: &TacticsConfig) {
        if self.size != map.size {
            *self = Self::new(map.size);
        } else {
            self.clear();
        }

        let radius = config.danger_radius();
        for observer in roster.iter().filter(|u| u.alive) {
            for enemy in roster.iter().filter(|u| u.is_enemy_of(observer.team)) {
                if observer.visibility.contains(enemy.position) {
                    self.raise(enemy.position, radius, config.danger.peak, config.danger.falloff);
                }
            }
        }
    }

    /// Highest value anywhere on the field
    pub fn peak(&self) -> i32 {
        self.values.iter().copied().max().unwrap_or(0)
    }
}
