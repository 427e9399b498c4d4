//! Score-to-cell winner resolution.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{AxisNumbers, Coords, GridError, Position};

/// Resolves a pair of running scores to the winning cell.
///
/// Only the last decimal digit of each score matters: the column is the slot
/// of `x_score % 10` on the x axis and the row is the slot of `y_score % 10`
/// on the y axis. Because both axes are permutations the result is total.
#[instrument(skip(x_axis, y_axis))]
pub fn resolve_winner(
    x_score: u32,
    y_score: u32,
    x_axis: &AxisNumbers,
    y_axis: &AxisNumbers,
) -> Position {
    let coords = Coords::from_slots(y_axis.slot_of(y_score), x_axis.slot_of(x_score));
    let position = coords.to_position();
    debug!(row = coords.row(), col = coords.col(), %position, "Winner resolved");
    position
}

/// Both axis permutations of a sealed grid. They are assigned together and
/// never change afterward.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct SealedAxes {
    x: AxisNumbers,
    y: AxisNumbers,
}

impl SealedAxes {
    /// Pairs the column (x) and row (y) permutations.
    pub fn new(x: AxisNumbers, y: AxisNumbers) -> Self {
        Self { x, y }
    }

    /// Pairs stored axes, failing unless both are present.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NotSealed`] if either axis is missing.
    pub fn from_parts(x: Option<AxisNumbers>, y: Option<AxisNumbers>) -> Result<Self, GridError> {
        match (x, y) {
            (Some(x), Some(y)) => Ok(Self { x, y }),
            _ => Err(GridError::NotSealed),
        }
    }

    /// Winning cell for the given running scores.
    pub fn resolve(&self, x_score: u32, y_score: u32) -> Position {
        resolve_winner(x_score, y_score, &self.x, &self.y)
    }
}
