//! The allocation and settlement engine.

mod allocator;
mod board;
mod error;
mod settlement;
mod types;

pub use allocator::{MAX_CELLS_PER_CLAIM, SquareAllocator, validate_claim};
pub use board::{Board, CellView, QuarterWinner};
pub use error::{AllocationError, SettlementError};
pub use settlement::Settlement;
pub use types::{
    ClaimId, ClaimOutcome, ClaimRecord, Claimant, Grid, GridId, NewGrid, ScoreRecord,
};
