//! Square grid coordinates (row, col)
//!
//! Movement and search are 4-directional; forced escapes may also use the
//! diagonals. Neighbour order is fixed so every search is deterministic.

use serde::{Deserialize, Serialize};

/// A cell on the battle grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct GridCoord {
    pub row: i32,
    pub col: i32,
}

impl GridCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance
    pub fn distance(&self, other: &Self) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    pub fn offset(&self, direction: Direction) -> Self {
        let (dr, dc) = direction.delta();
        Self::new(self.row + dr, self.col + dc)
    }

    /// The 4 orthogonal neighbours: right, up, down, left
    pub fn neighbors(&self) -> [GridCoord; 4] {
        Direction::ORTHOGONAL.map(|d| self.offset(d))
    }

    /// All 8 surrounding cells, orthogonal first
    pub fn neighbors8(&self) -> [GridCoord; 8] {
        Direction::ALL.map(|d| self.offset(d))
    }

    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.distance(other) == 1
    }

    /// Rasterized straight line from self to other (inclusive on both ends)
    pub fn line_to(&self, other: &Self) -> Vec<GridCoord> {
        let dx = (other.col - self.col).abs();
        let dy = (other.row - self.row).abs();
        let sx = if self.col < other.col { 1 } else { -1 };
        let sy = if self.row < other.row { 1 } else { -1 };
        let mut err = dx - dy;

        let mut results = Vec::with_capacity((dx.max(dy) + 1) as usize);
        let (mut col, mut row) = (self.col, self.row);

        loop {
            results.push(GridCoord::new(row, col));
            if col == other.col && row == other.row {
                break;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                col += sx;
            }
            if e2 < dx {
                err += dx;
                row += sy;
            }
        }

        results
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

/// Step directions on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Up,
    Down,
    Left,
    UpRight,
    DownLeft,
    UpLeft,
    DownRight,
}

impl Direction {
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Down,
        Direction::Left,
    ];

    pub const ALL: [Direction; 8] = [
        Direction::Right,
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::UpLeft,
        Direction::DownRight,
    ];

    /// (row, col) delta
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Right => (0, 1),
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::UpRight => (-1, 1),
            Direction::DownLeft => (1, -1),
            Direction::UpLeft => (-1, -1),
            Direction::DownRight => (1, 1),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::UpRight => Direction::DownLeft,
            Direction::DownLeft => Direction::UpRight,
            Direction::UpLeft => Direction::DownRight,
            Direction::DownRight => Direction::UpLeft,
        }
    }
}
