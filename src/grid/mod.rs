//! Pure grid model: cell numbering, axis permutations, payouts and winner
//! resolution. Nothing in here touches storage.

mod axis;
mod coords;
mod error;
mod payout;
mod quarter;
mod winner;

pub use axis::{AxisNumbers, AxisShuffler, DIGITS, ThreadRngShuffler, shuffle_axis};
pub use coords::{CELL_COUNT, Coords, GRID_SIZE, Position};
pub use error::GridError;
pub use payout::Payouts;
pub use quarter::Quarter;
pub use winner::{SealedAxes, resolve_winner};
