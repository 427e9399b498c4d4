//! Exactly-once cell allocation and sealing.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use crate::engine::{AllocationError, ClaimOutcome, Claimant, Grid, GridId, NewGrid};
use crate::grid::{AxisShuffler, CELL_COUNT, Position, SealedAxes, ThreadRngShuffler};
use crate::store::{SquareStore, StoreError};

/// Largest number of cells a single claim may reserve.
pub const MAX_CELLS_PER_CLAIM: usize = 10;

/// Checks a claim request without touching storage.
///
/// Returns the requested positions in ascending order.
///
/// # Errors
///
/// Returns [`AllocationError::Validation`] if the display name is blank, no
/// positions (or more than [`MAX_CELLS_PER_CLAIM`]) were requested, a
/// position is outside `1..=100`, or a position is repeated.
#[instrument(skip(claimant), fields(count = positions.len()))]
pub fn validate_claim(
    claimant: &Claimant,
    positions: &[i64],
) -> Result<Vec<Position>, AllocationError> {
    if claimant.display_name().is_empty() {
        return Err(AllocationError::Validation(
            "Display name is required".to_string(),
        ));
    }
    if positions.is_empty() {
        return Err(AllocationError::Validation("No cells selected".to_string()));
    }
    if positions.len() > MAX_CELLS_PER_CLAIM {
        return Err(AllocationError::Validation(format!(
            "Maximum {} cells allowed per claim",
            MAX_CELLS_PER_CLAIM
        )));
    }

    let mut unique = BTreeSet::new();
    for &value in positions {
        let position =
            Position::new(value).map_err(|e| AllocationError::Validation(e.to_string()))?;
        if !unique.insert(position) {
            return Err(AllocationError::Validation(format!(
                "Cell {} was selected more than once",
                position
            )));
        }
    }
    Ok(unique.into_iter().collect())
}

/// Reserves cells for claimants and seals grids when the last cell goes.
///
/// The allocator holds no locks of its own. It relies on the store running
/// each claim as one unit of work and rejecting duplicate `(grid, position)`
/// rows; a lost race surfaces as [`AllocationError::Conflict`] and is never
/// retried here.
#[derive(Debug, Clone)]
pub struct SquareAllocator<S, R = ThreadRngShuffler> {
    store: S,
    shuffler: R,
}

impl<S: SquareStore> SquareAllocator<S> {
    /// Creates an allocator drawing axes from the thread-local RNG.
    #[instrument(skip(store))]
    pub fn new(store: S) -> Self {
        Self::with_shuffler(store, ThreadRngShuffler)
    }
}

impl<S: SquareStore, R: AxisShuffler> SquareAllocator<S, R> {
    /// Creates an allocator with an explicit axis shuffler.
    #[instrument(skip(store, shuffler))]
    pub fn with_shuffler(store: S, shuffler: R) -> Self {
        info!("Creating SquareAllocator");
        Self { store, shuffler }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens a new grid for claims.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Validation`] if the name is already used, or
    /// [`AllocationError::Internal`] on storage failure.
    #[instrument(skip(self, grid), fields(name = %grid.name()))]
    pub fn open_grid(&self, grid: NewGrid) -> Result<Grid, AllocationError> {
        let created = self
            .store
            .with_transaction(|uow| uow.create_grid(&grid))
            .map_err(|e| match e {
                StoreError::UniqueViolation => AllocationError::Validation(format!(
                    "A grid named '{}' already exists",
                    grid.name()
                )),
                other => AllocationError::from(other),
            })?;
        info!(grid_id = created.id(), "Grid opened");
        Ok(created)
    }

    /// Atomically reserves `positions` on a grid for `claimant`.
    ///
    /// Validation happens before any storage access. The count check, the
    /// insert and, when the insert takes the 100th cell, the seal all run in
    /// one unit of work, so exactly one claim can ever observe the grid
    /// filling up.
    ///
    /// # Errors
    ///
    /// See [`AllocationError`]; every variant except `Validation` implies a
    /// full rollback.
    #[instrument(skip(self, claimant, positions), fields(claimant = %claimant.label(), count = positions.len()))]
    pub fn claim(
        &self,
        grid_id: GridId,
        claimant: Claimant,
        positions: &[i64],
    ) -> Result<ClaimOutcome, AllocationError> {
        let positions = validate_claim(&claimant, positions)?;
        debug!(positions = ?positions, "Claim request validated");

        let result = self.store.with_transaction(|uow| -> Result<ClaimOutcome, AllocationError> {
            let grid = uow
                .grid(grid_id)?
                .ok_or(AllocationError::NotFound(grid_id))?;
            if grid.is_sealed() {
                return Err(AllocationError::Closed(grid_id));
            }

            let reserved = uow.reserved_count(grid_id)?;
            let requested = positions.len();
            if reserved + requested > CELL_COUNT {
                return Err(AllocationError::Capacity {
                    requested,
                    available: CELL_COUNT.saturating_sub(reserved),
                });
            }

            let claim_id = uow.insert_claim(grid_id, &claimant, &positions)?;

            let sealed = reserved + requested == CELL_COUNT;
            if sealed {
                let axes = self.draw_axes();
                uow.seal(grid_id, &axes)?;
                info!(x_axis = %axes.x(), y_axis = %axes.y(), "Last cell taken, grid sealed");
            }

            Ok(ClaimOutcome::new(
                claim_id,
                grid_id,
                positions.clone(),
                claimant.label().to_string(),
                sealed,
            ))
        });

        match result {
            Ok(outcome) => {
                info!(claim_id = outcome.claim_id(), sealed = outcome.sealed(), "Claim committed");
                Ok(outcome)
            }
            Err(AllocationError::Conflict { .. }) => {
                let taken = self.taken_after_conflict(grid_id, &positions);
                warn!(taken = ?taken, "Claim lost a race for one or more cells");
                Err(AllocationError::Conflict { positions: taken })
            }
            Err(e) => {
                warn!(error = %e, "Claim rejected");
                Err(e)
            }
        }
    }

    /// Seals an open grid before it is full.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::NotFound`], [`AllocationError::Closed`], or
    /// [`AllocationError::Internal`].
    #[instrument(skip(self))]
    pub fn close(&self, grid_id: GridId) -> Result<SealedAxes, AllocationError> {
        let axes = self.store.with_transaction(|uow| -> Result<SealedAxes, AllocationError> {
            let grid = uow
                .grid(grid_id)?
                .ok_or(AllocationError::NotFound(grid_id))?;
            if grid.is_sealed() {
                return Err(AllocationError::Closed(grid_id));
            }
            let axes = self.draw_axes();
            uow.seal(grid_id, &axes)?;
            Ok(axes)
        })?;
        info!(x_axis = %axes.x(), y_axis = %axes.y(), "Grid closed early");
        Ok(axes)
    }

    /// Two independent draws, one per axis.
    fn draw_axes(&self) -> SealedAxes {
        SealedAxes::new(self.shuffler.shuffle(), self.shuffler.shuffle())
    }

    /// Best-effort read of which requested cells are now taken. Runs after
    /// the failed unit of work has rolled back.
    fn taken_after_conflict(&self, grid_id: GridId, positions: &[Position]) -> Vec<Position> {
        self.store
            .with_transaction(|uow| uow.taken_among(grid_id, positions))
            .unwrap_or_else(|e: StoreError| {
                warn!(error = %e, "Could not determine conflicting cells");
                Vec::new()
            })
    }
}
