//! Errors raised by the pure grid model.

use derive_more::Display;

/// Error produced when a grid value is out of its domain.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GridError {
    /// A cell position outside `1..=100`.
    #[display("Position {} is outside 1..=100", _0)]
    PositionOutOfRange(i64),

    /// A row or column outside `0..=9`.
    #[display("Coordinates ({}, {}) are outside the 10x10 grid", row, col)]
    CoordsOutOfRange {
        /// Requested row.
        row: i64,
        /// Requested column.
        col: i64,
    },

    /// An axis that is not a permutation of the digits 0-9.
    #[display("Invalid axis numbers: {}", _0)]
    InvalidAxis(String),

    /// Payout weights that could not be parsed.
    #[display("Invalid payouts: {}", _0)]
    InvalidPayouts(String),

    /// A quarter outside `1..=4`.
    #[display("Quarter {} is outside 1..=4", _0)]
    QuarterOutOfRange(i64),

    /// Axis numbers were requested from a grid that has not been sealed.
    #[display("Grid has not been sealed; axis numbers are not assigned yet")]
    NotSealed,
}

impl std::error::Error for GridError {}
