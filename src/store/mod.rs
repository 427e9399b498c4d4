//! The atomic unit-of-work seam between the engine and persistence.
//!
//! Every engine operation runs inside [`SquareStore::with_transaction`]. The
//! store guarantees the closure's writes commit together or not at all, and
//! enforces uniqueness of `(grid, position)` and `(grid, quarter)`. Those two
//! guarantees are the only concurrency control the engine relies on.

mod memory;

pub use memory::MemoryStore;

use derive_more::Display;

use crate::engine::{ClaimId, ClaimRecord, Claimant, Grid, GridId, NewGrid, ScoreRecord};
use crate::grid::{Position, Quarter, SealedAxes};

/// Failure reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum StoreError {
    /// A uniqueness constraint rejected a write.
    #[display("Uniqueness constraint violated")]
    UniqueViolation,

    /// Any other storage failure.
    #[display("Storage failure: {}", _0)]
    Backend(String),
}

impl std::error::Error for StoreError {}

/// Operations available inside one atomic unit of work.
pub trait UnitOfWork {
    /// Inserts a new open grid.
    fn create_grid(&mut self, grid: &NewGrid) -> Result<Grid, StoreError>;

    /// Loads a grid, `None` if it does not exist.
    fn grid(&mut self, grid_id: GridId) -> Result<Option<Grid>, StoreError>;

    /// Every grid, in creation order.
    fn grids(&mut self) -> Result<Vec<Grid>, StoreError>;

    /// Number of cells currently reserved on a grid.
    fn reserved_count(&mut self, grid_id: GridId) -> Result<usize, StoreError>;

    /// The subset of `positions` already reserved on a grid.
    fn taken_among(
        &mut self,
        grid_id: GridId,
        positions: &[Position],
    ) -> Result<Vec<Position>, StoreError>;

    /// Inserts a claim and one cell per position.
    ///
    /// Fails with [`StoreError::UniqueViolation`] if any position is already
    /// reserved on the grid.
    fn insert_claim(
        &mut self,
        grid_id: GridId,
        claimant: &Claimant,
        positions: &[Position],
    ) -> Result<ClaimId, StoreError>;

    /// Marks an open grid sealed and stores its axes.
    fn seal(&mut self, grid_id: GridId, axes: &SealedAxes) -> Result<(), StoreError>;

    /// All claims on a grid, oldest first.
    fn claims(&mut self, grid_id: GridId) -> Result<Vec<ClaimRecord>, StoreError>;

    /// Inserts or replaces the score for one quarter.
    fn upsert_score(&mut self, grid_id: GridId, score: &ScoreRecord) -> Result<(), StoreError>;

    /// Removes a quarter's score; returns whether one existed.
    fn delete_score(&mut self, grid_id: GridId, quarter: Quarter) -> Result<bool, StoreError>;

    /// Recorded scores in quarter order.
    fn scores(&mut self, grid_id: GridId) -> Result<Vec<ScoreRecord>, StoreError>;
}

/// A store able to run a closure as one atomic unit of work.
pub trait SquareStore: Send + Sync {
    /// Runs `f` in a transaction. If `f` returns `Err` every write it made is
    /// rolled back.
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
        E: From<StoreError>;
}
