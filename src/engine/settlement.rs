//! Score recording and quarter settlement for sealed grids.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::engine::{
    Board, Grid, GridId, QuarterWinner, ScoreRecord, SettlementError,
};
use crate::grid::{CELL_COUNT, Position, Quarter};
use crate::store::{SquareStore, UnitOfWork};

/// Records running scores and resolves them to winning cells.
#[derive(Debug, Clone)]
pub struct Settlement<S> {
    store: S,
}

/// Scores are stored in a signed 32-bit column, so the upper bound is `i32::MAX`.
fn score_value(label: &str, value: i64) -> Result<u32, SettlementError> {
    i32::try_from(value)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            SettlementError::Validation(format!(
                "{} must be an integer between 0 and {}, got {}",
                label,
                i32::MAX,
                value
            ))
        })
}

fn load_grid(uow: &mut dyn UnitOfWork, grid_id: GridId) -> Result<Grid, SettlementError> {
    uow.grid(grid_id)?
        .ok_or(SettlementError::NotFound(grid_id))
}

impl<S: SquareStore> Settlement<S> {
    /// Creates a settlement service over `store`.
    #[instrument(skip(store))]
    pub fn new(store: S) -> Self {
        info!("Creating Settlement");
        Self { store }
    }

    /// Inserts or corrects the running score for a quarter.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Validation`] for a quarter outside `1..=4`
    /// or a negative score, [`SettlementError::NotFound`] for an unknown grid
    /// and [`SettlementError::NotSealed`] while the grid is still open.
    #[instrument(skip(self))]
    pub fn record_score(
        &self,
        grid_id: GridId,
        quarter: i64,
        x_score: i64,
        y_score: i64,
    ) -> Result<ScoreRecord, SettlementError> {
        let score = ScoreRecord::new(
            Quarter::try_from(quarter)?,
            score_value("x score", x_score)?,
            score_value("y score", y_score)?,
        );

        self.store.with_transaction(|uow| -> Result<(), SettlementError> {
            let grid = load_grid(uow, grid_id)?;
            if !grid.is_sealed() {
                return Err(SettlementError::NotSealed(grid_id));
            }
            uow.upsert_score(grid_id, &score)?;
            Ok(())
        })?;

        info!(quarter = %score.quarter(), x_score, y_score, "Score recorded");
        Ok(score)
    }

    /// Removes a quarter's score. Returns whether one was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Validation`] for a quarter outside `1..=4`
    /// and [`SettlementError::NotFound`] for an unknown grid.
    #[instrument(skip(self))]
    pub fn delete_score(&self, grid_id: GridId, quarter: i64) -> Result<bool, SettlementError> {
        let quarter = Quarter::try_from(quarter)?;
        let removed = self
            .store
            .with_transaction(|uow| -> Result<bool, SettlementError> {
                load_grid(uow, grid_id)?;
                Ok(uow.delete_score(grid_id, quarter)?)
            })?;
        debug!(removed, "Score delete processed");
        Ok(removed)
    }

    /// Resolves every recorded quarter to its winning cell and payout.
    ///
    /// The pot is the price per cell times all 100 cells, whether or not the
    /// grid filled before it was closed.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::NotFound`] for an unknown grid and
    /// [`SettlementError::NotSealed`] if the grid has no axis numbers yet.
    #[instrument(skip(self))]
    pub fn winners(&self, grid_id: GridId) -> Result<Vec<QuarterWinner>, SettlementError> {
        let (grid, claims, scores) = self.store.with_transaction(
            |uow| -> Result<_, SettlementError> {
                let grid = load_grid(uow, grid_id)?;
                Ok((grid, uow.claims(grid_id)?, uow.scores(grid_id)?))
            },
        )?;
        let axes = grid
            .sealed_axes()
            .map_err(|_| SettlementError::NotSealed(grid_id))?;

        let owners: HashMap<Position, &str> = claims
            .iter()
            .flat_map(|claim| {
                claim
                    .positions()
                    .iter()
                    .map(move |p| (*p, claim.claimant().label()))
            })
            .collect();
        let pot_cents = u64::from(*grid.price_cents()) * CELL_COUNT as u64;

        let winners: Vec<QuarterWinner> = scores
            .iter()
            .map(|score| {
                let position = axes.resolve(*score.x_score(), *score.y_score());
                QuarterWinner::new(
                    score,
                    position,
                    owners.get(&position).map(|label| label.to_string()),
                    grid.payouts().amount(*score.quarter(), pot_cents),
                )
            })
            .collect();

        info!(count = winners.len(), pot_cents, "Winners resolved");
        Ok(winners)
    }

    /// Lists every grid, oldest first.
    #[instrument(skip(self))]
    pub fn grids(&self) -> Result<Vec<Grid>, SettlementError> {
        let grids = self
            .store
            .with_transaction(|uow| uow.grids().map_err(SettlementError::from))?;
        debug!(count = grids.len(), "Grids listed");
        Ok(grids)
    }

    /// Builds the 100-cell board view of a grid.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::NotFound`] for an unknown grid.
    #[instrument(skip(self))]
    pub fn board(&self, grid_id: GridId) -> Result<Board, SettlementError> {
        let board = self
            .store
            .with_transaction(|uow| -> Result<Board, SettlementError> {
                let grid = load_grid(uow, grid_id)?;
                let claims = uow.claims(grid_id)?;
                let scores = uow.scores(grid_id)?;
                Ok(Board::build(&grid, &claims, &scores))
            })?;
        debug!(available = board.available(), sealed = board.sealed(), "Board built");
        Ok(board)
    }
}
