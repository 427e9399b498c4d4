//! Domain records shared by the allocator, the settlement service and the
//! stores.

use derive_getters::Getters;
use derive_new::new;
use serde::Serialize;

use crate::grid::{GridError, Payouts, Position, Quarter, SealedAxes};
use crate::notify::GridEvent;

/// Grid identifier.
pub type GridId = i32;

/// Claim identifier.
pub type ClaimId = i32;

/// A 10x10 squares grid.
///
/// A grid is open until `axes` is assigned; from then on it is sealed and
/// accepts no further claims.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct Grid {
    id: GridId,
    name: String,
    x_label: String,
    y_label: String,
    price_cents: u32,
    payouts: Payouts,
    axes: Option<SealedAxes>,
}

impl Grid {
    pub(crate) fn from_parts(id: GridId, grid: NewGrid, axes: Option<SealedAxes>) -> Self {
        Self {
            id,
            name: grid.name,
            x_label: grid.x_label,
            y_label: grid.y_label,
            price_cents: grid.price_cents,
            payouts: grid.payouts,
            axes,
        }
    }

    /// Whether the grid has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.axes.is_some()
    }

    /// Axis permutations of a sealed grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NotSealed`] while the grid is still open.
    pub fn sealed_axes(&self) -> Result<&SealedAxes, GridError> {
        self.axes.as_ref().ok_or(GridError::NotSealed)
    }

    pub(crate) fn seal(&mut self, axes: SealedAxes) {
        self.axes = Some(axes);
    }
}

/// Metadata for a grid about to be opened.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct NewGrid {
    name: String,
    x_label: String,
    y_label: String,
    price_cents: u32,
    payouts: Payouts,
}

/// The person reserving cells.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct Claimant {
    display_name: String,
    email: Option<String>,
    phone: Option<String>,
}

impl Claimant {
    /// Creates a claimant. Blank contact fields are treated as absent.
    pub fn new(display_name: impl Into<String>, email: Option<String>, phone: Option<String>) -> Self {
        let blank_to_none = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            display_name: display_name.into().trim().to_string(),
            email: blank_to_none(email),
            phone: blank_to_none(phone),
        }
    }

    /// Creates a claimant with a display name only.
    pub fn named(display_name: impl Into<String>) -> Self {
        Self::new(display_name, None, None)
    }

    /// Label shown on claimed cells and in notifications.
    pub fn label(&self) -> &str {
        &self.display_name
    }
}

/// A committed claim and the cells it owns.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct ClaimRecord {
    id: ClaimId,
    grid_id: GridId,
    claimant: Claimant,
    positions: Vec<Position>,
}

/// Recorded running score for one quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, new)]
pub struct ScoreRecord {
    quarter: Quarter,
    x_score: u32,
    y_score: u32,
}

/// Result of a committed claim.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct ClaimOutcome {
    claim_id: ClaimId,
    grid_id: GridId,
    positions: Vec<Position>,
    claimant_label: String,
    sealed: bool,
}

impl ClaimOutcome {
    pub(crate) fn new(
        claim_id: ClaimId,
        grid_id: GridId,
        positions: Vec<Position>,
        claimant_label: String,
        sealed: bool,
    ) -> Self {
        Self {
            claim_id,
            grid_id,
            positions,
            claimant_label,
            sealed,
        }
    }

    /// Events onlookers should hear about: cells taken, then the seal if this
    /// claim filled the grid.
    pub fn events(&self) -> Vec<GridEvent> {
        let mut events = vec![GridEvent::CellsTaken {
            grid_id: self.grid_id,
            positions: self.positions.clone(),
            claimant_label: self.claimant_label.clone(),
        }];
        if self.sealed {
            events.push(GridEvent::GridSealed {
                grid_id: self.grid_id,
            });
        }
        events
    }
}
