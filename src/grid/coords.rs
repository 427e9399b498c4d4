//! Linear cell numbering and its (row, column) mapping.
//!
//! Cells are numbered 1 through 100, left to right and top to bottom.
//! Rows and columns are zero based.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::GridError;

/// Number of rows (and columns) on the grid.
pub const GRID_SIZE: u8 = 10;

/// Number of cells on the grid.
pub const CELL_COUNT: usize = 100;

/// A cell number in `1..=100`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Position(u8);

impl Position {
    /// Creates a position, rejecting anything outside `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::PositionOutOfRange`] for out-of-range values.
    pub fn new(value: i64) -> Result<Self, GridError> {
        if (1..=CELL_COUNT as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(GridError::PositionOutOfRange(value))
        }
    }

    /// Returns the cell number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Maps this cell to its zero-based row and column.
    #[instrument]
    pub fn to_coords(self) -> Coords {
        let index = self.0 - 1;
        Coords {
            row: index / GRID_SIZE,
            col: index % GRID_SIZE,
        }
    }

    /// Iterates over all 100 positions in ascending order.
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=CELL_COUNT as u8).map(Position)
    }
}

impl TryFrom<i64> for Position {
    type Error = GridError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Position> for i64 {
    fn from(position: Position) -> Self {
        i64::from(position.0)
    }
}

impl From<Position> for i32 {
    fn from(position: Position) -> Self {
        i32::from(position.0)
    }
}

/// Zero-based (row, column) pair, each in `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Coords {
    row: u8,
    col: u8,
}

impl Coords {
    /// Creates coordinates, rejecting rows or columns outside `0..=9`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CoordsOutOfRange`] for out-of-range values.
    pub fn new(row: i64, col: i64) -> Result<Self, GridError> {
        let range = 0..i64::from(GRID_SIZE);
        if range.contains(&row) && range.contains(&col) {
            Ok(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(GridError::CoordsOutOfRange { row, col })
        }
    }

    /// Builds coordinates from axis slots that are already known to be in range.
    pub(crate) fn from_slots(row: u8, col: u8) -> Self {
        debug_assert!(row < GRID_SIZE && col < GRID_SIZE);
        Self { row, col }
    }

    /// Zero-based row.
    pub fn row(&self) -> u8 {
        self.row
    }

    /// Zero-based column.
    pub fn col(&self) -> u8 {
        self.col
    }

    /// Maps these coordinates back to the cell number.
    #[instrument]
    pub fn to_position(self) -> Position {
        Position(self.row * GRID_SIZE + self.col + 1)
    }
}
