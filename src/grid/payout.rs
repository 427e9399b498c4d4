//! Per-quarter payout weights.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{GridError, Quarter};

/// Percentage of the pot paid out for each quarter.
///
/// The engine stores whatever it is given; checking that the weights add up
/// to 100 is the caller's job (see [`Payouts::total`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payouts([u8; 4]);

impl Payouts {
    /// Creates payout weights in quarter order.
    pub fn new(weights: [u8; 4]) -> Self {
        Self(weights)
    }

    /// Weights in quarter order.
    pub fn weights(&self) -> &[u8; 4] {
        &self.0
    }

    /// Sum of all four weights.
    pub fn total(&self) -> u32 {
        self.0.iter().map(|&w| u32::from(w)).sum()
    }

    /// Weight for one quarter.
    pub fn weight(&self, quarter: Quarter) -> u8 {
        self.0[quarter.index()]
    }

    /// Amount paid for `quarter` out of `pot_cents`, rounded down.
    pub fn amount(&self, quarter: Quarter, pot_cents: u64) -> u64 {
        pot_cents * u64::from(self.weight(quarter)) / 100
    }
}

impl Default for Payouts {
    fn default() -> Self {
        Self([25, 25, 25, 25])
    }
}

/// Parses the stored comma-separated form, e.g. `"20,20,20,40"`.
impl FromStr for Payouts {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let weights = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u8>()
                    .map_err(|e| GridError::InvalidPayouts(format!("'{}': {}", part.trim(), e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let weights: [u8; 4] = weights.try_into().map_err(|v: Vec<u8>| {
            GridError::InvalidPayouts(format!("expected 4 weights, got {}", v.len()))
        })?;
        Ok(Self(weights))
    }
}

impl fmt::Display for Payouts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{},{},{},{}", a, b, c, d)
    }
}
