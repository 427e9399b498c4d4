//! Engine error taxonomies.

use derive_more::Display;
use strum::IntoStaticStr;
use tracing::error;

use crate::engine::GridId;
use crate::grid::{GridError, Position};
use crate::store::StoreError;

fn join_positions(positions: &[Position]) -> String {
    let parts: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
    parts.join(", ")
}

/// Why a claim (or a manual close) was refused.
///
/// Every variant other than `Validation` is produced after the unit of work
/// has been rolled back, so a failed claim never leaves a partial
/// reservation behind.
#[derive(Debug, Clone, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationError {
    /// Malformed request, rejected before any storage access.
    #[display("Invalid claim: {}", _0)]
    Validation(String),

    /// The grid does not exist.
    #[display("Grid {} not found", _0)]
    NotFound(GridId),

    /// The grid is sealed and accepts no more claims.
    #[display("Grid {} is closed", _0)]
    Closed(GridId),

    /// Not enough cells left for the request.
    #[display("Not enough cells available: requested {}, {} left", requested, available)]
    Capacity {
        /// Number of cells requested.
        requested: usize,
        /// Number of cells still open.
        available: usize,
    },

    /// Another claim reserved one or more of the requested cells first.
    #[display("One or more cells were just taken: [{}]", join_positions(positions))]
    Conflict {
        /// Requested positions found taken after rollback, when determinable.
        positions: Vec<Position>,
    },

    /// Unexpected storage failure. The detail is logged, not displayed.
    #[display("Internal storage error")]
    Internal(String),
}

impl std::error::Error for AllocationError {}

impl From<StoreError> for AllocationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation => Self::Conflict {
                positions: Vec::new(),
            },
            StoreError::Backend(detail) => {
                error!(detail = %detail, "Storage failure during allocation");
                Self::Internal(detail)
            }
        }
    }
}

/// Why a score or settlement query was refused.
#[derive(Debug, Clone, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementError {
    /// Malformed quarter or score.
    #[display("Invalid score: {}", _0)]
    Validation(String),

    /// The grid does not exist.
    #[display("Grid {} not found", _0)]
    NotFound(GridId),

    /// Scores and winners only exist once a grid is sealed.
    #[display("Grid {} must be closed before scores are entered", _0)]
    NotSealed(GridId),

    /// Unexpected storage failure. The detail is logged, not displayed.
    #[display("Internal storage error")]
    Internal(String),
}

impl std::error::Error for SettlementError {}

impl From<StoreError> for SettlementError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Storage failure during settlement");
        Self::Internal(err.to_string())
    }
}

impl From<GridError> for SettlementError {
    fn from(err: GridError) -> Self {
        Self::Validation(err.to_string())
    }
}
