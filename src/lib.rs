//! Strictly Squares library - squares pool allocation and settlement
//!
//! Players race to claim cells on a shared 10x10 grid. Each claim is
//! all-or-nothing, no cell is ever owned twice, and the claim that takes the
//! hundredth cell seals the grid and draws its axis numbers in the same unit
//! of work. Once sealed, quarter scores resolve to winning cells.
//!
//! # Architecture
//!
//! - **Grid**: pure cell numbering, axis permutations and winner resolution
//! - **Engine**: the square allocator and the settlement service
//! - **Store**: the unit-of-work seam, with SQLite (diesel) and in-memory backends
//! - **Notify**: post-commit event gateway
//! - **Server**: axum HTTP surface
//!
//! # Example
//!
//! ```no_run
//! use strictly_squares::{Claimant, MemoryStore, NewGrid, Payouts, SquareAllocator};
//!
//! # fn example() -> Result<(), strictly_squares::AllocationError> {
//! let allocator = SquareAllocator::new(MemoryStore::new());
//! let grid = allocator.open_grid(NewGrid::new(
//!     "Big Game".to_string(),
//!     "Home".to_string(),
//!     "Away".to_string(),
//!     500,
//!     Payouts::default(),
//! ))?;
//! let outcome = allocator.claim(*grid.id(), Claimant::named("Dana"), &[1, 2, 3])?;
//! assert!(!outcome.sealed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod engine;
mod grid;
mod notify;
mod server;
mod store;

// Crate-level exports - Configuration
pub use config::{ConfigError, DATABASE_PATH_ENV, ServerConfig};

// Crate-level exports - Persistence
pub use db::{DEFAULT_BUSY_TIMEOUT_MS, DbError, GridRepository, MIGRATIONS};

// Crate-level exports - Engine
pub use engine::{
    AllocationError, Board, CellView, ClaimId, ClaimOutcome, ClaimRecord, Claimant, Grid, GridId,
    MAX_CELLS_PER_CLAIM, NewGrid, QuarterWinner, ScoreRecord, Settlement, SettlementError,
    SquareAllocator, validate_claim,
};

// Crate-level exports - Grid model
pub use grid::{
    AxisNumbers, AxisShuffler, CELL_COUNT, Coords, DIGITS, GRID_SIZE, GridError, Payouts,
    Position, Quarter, SealedAxes, ThreadRngShuffler, resolve_winner, shuffle_axis,
};

// Crate-level exports - Notifications
pub use notify::{
    BroadcastGateway, GridEvent, NotificationGateway, NotifyError, announce,
};

// Crate-level exports - HTTP surface
pub use server::{AppState, ApiError, ClaimRequest, CreateGridRequest, ScoreRequest, router};

// Crate-level exports - Storage seam
pub use store::{MemoryStore, SquareStore, StoreError, UnitOfWork};
