//! Read-side views of a grid: the 100-cell board and per-quarter winners.

use std::collections::HashMap;

use derive_getters::Getters;
use serde::Serialize;

use crate::engine::{ClaimRecord, Grid, GridId, ScoreRecord};
use crate::grid::{AxisNumbers, Position, Quarter};

/// One cell of the board view.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct CellView {
    position: Position,
    row: u8,
    col: u8,
    claimant: Option<String>,
    winning_quarters: Vec<Quarter>,
}

impl CellView {
    /// Whether the cell has been claimed.
    pub fn is_taken(&self) -> bool {
        self.claimant.is_some()
    }
}

/// Snapshot of a grid: who holds each cell and which cells have won.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct Board {
    grid_id: GridId,
    x_label: String,
    y_label: String,
    sealed: bool,
    x_axis: Option<AxisNumbers>,
    y_axis: Option<AxisNumbers>,
    available: usize,
    cells: Vec<CellView>,
}

impl Board {
    /// Builds the board from a grid, its claims and its recorded scores.
    ///
    /// Winning cells are only marked once the grid is sealed; scores on an
    /// open grid are ignored.
    pub fn build(grid: &Grid, claims: &[ClaimRecord], scores: &[ScoreRecord]) -> Self {
        let owners: HashMap<Position, &str> = claims
            .iter()
            .flat_map(|claim| {
                claim
                    .positions()
                    .iter()
                    .map(move |p| (*p, claim.claimant().label()))
            })
            .collect();

        let mut winners: HashMap<Position, Vec<Quarter>> = HashMap::new();
        if let Some(axes) = grid.axes() {
            for score in scores {
                winners
                    .entry(axes.resolve(*score.x_score(), *score.y_score()))
                    .or_default()
                    .push(*score.quarter());
            }
        }

        let cells: Vec<CellView> = Position::all()
            .map(|position| {
                let coords = position.to_coords();
                let mut winning_quarters = winners.remove(&position).unwrap_or_default();
                winning_quarters.sort();
                CellView {
                    position,
                    row: coords.row(),
                    col: coords.col(),
                    claimant: owners.get(&position).map(|label| label.to_string()),
                    winning_quarters,
                }
            })
            .collect();

        Self {
            grid_id: *grid.id(),
            x_label: grid.x_label().clone(),
            y_label: grid.y_label().clone(),
            sealed: grid.is_sealed(),
            x_axis: grid.axes().as_ref().map(|a| a.x().clone()),
            y_axis: grid.axes().as_ref().map(|a| a.y().clone()),
            available: cells.iter().filter(|c| !c.is_taken()).count(),
            cells,
        }
    }

    /// The view of a single cell.
    pub fn cell(&self, position: Position) -> &CellView {
        &self.cells[usize::from(position.get() - 1)]
    }
}

/// Settlement of one quarter.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct QuarterWinner {
    quarter: Quarter,
    x_score: u32,
    y_score: u32,
    position: Position,
    claimant: Option<String>,
    payout_cents: u64,
}

impl QuarterWinner {
    pub(crate) fn new(
        score: &ScoreRecord,
        position: Position,
        claimant: Option<String>,
        payout_cents: u64,
    ) -> Self {
        Self {
            quarter: *score.quarter(),
            x_score: *score.x_score(),
            y_score: *score.y_score(),
            position,
            claimant,
            payout_cents,
        }
    }
}
