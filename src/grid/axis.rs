//! Axis number permutations and the shuffler that draws them.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::GridError;

/// The ten digits every axis is a permutation of.
pub const DIGITS: [u8; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

/// A permutation of the digits 0-9 assigned to the rows or columns of a
/// sealed grid.
///
/// `digits[slot]` is the digit printed on that row or column; `slots[digit]`
/// is the inverse lookup used when resolving a score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct AxisNumbers {
    digits: [u8; 10],
    slots: [u8; 10],
}

impl AxisNumbers {
    /// Validates that `digits` contains each of 0-9 exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidAxis`] for anything that is not a permutation.
    pub fn new(digits: [u8; 10]) -> Result<Self, GridError> {
        let mut slots = [u8::MAX; 10];
        for (slot, &digit) in digits.iter().enumerate() {
            let entry = slots
                .get_mut(usize::from(digit))
                .ok_or_else(|| GridError::InvalidAxis(format!("digit {} is not 0-9", digit)))?;
            if *entry != u8::MAX {
                return Err(GridError::InvalidAxis(format!("digit {} appears twice", digit)));
            }
            *entry = slot as u8;
        }
        Ok(Self { digits, slots })
    }

    /// The digits in row or column order.
    pub fn digits(&self) -> &[u8; 10] {
        &self.digits
    }

    /// Row or column index holding the last decimal digit of `score`.
    pub fn slot_of(&self, score: u32) -> u8 {
        self.slots[(score % 10) as usize]
    }
}

impl TryFrom<Vec<u8>> for AxisNumbers {
    type Error = GridError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        let digits: [u8; 10] = value.try_into().map_err(|v: Vec<u8>| {
            GridError::InvalidAxis(format!("expected 10 digits, got {}", v.len()))
        })?;
        Self::new(digits)
    }
}

impl From<AxisNumbers> for Vec<u8> {
    fn from(axis: AxisNumbers) -> Self {
        axis.digits.to_vec()
    }
}

/// Parses the stored comma-separated form, e.g. `"3,7,1,9,0,5,2,8,4,6"`.
impl FromStr for AxisNumbers {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u8>()
                    .map_err(|e| GridError::InvalidAxis(format!("'{}': {}", part.trim(), e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_from(digits)
    }
}

impl fmt::Display for AxisNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.digits.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Source of axis permutations, drawn once per axis when a grid seals.
pub trait AxisShuffler: Send + Sync {
    /// Draws a uniformly random permutation of 0-9.
    fn shuffle(&self) -> AxisNumbers;
}

/// Fisher-Yates shuffle over [`DIGITS`] using the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngShuffler;

impl AxisShuffler for ThreadRngShuffler {
    #[instrument(skip(self))]
    fn shuffle(&self) -> AxisNumbers {
        shuffle_axis()
    }
}

/// Draws one axis permutation with the thread-local RNG.
#[instrument]
pub fn shuffle_axis() -> AxisNumbers {
    let mut digits = DIGITS;
    digits.shuffle(&mut rand::rng());
    let mut slots = [0u8; 10];
    for (slot, &digit) in digits.iter().enumerate() {
        slots[usize::from(digit)] = slot as u8;
    }
    let axis = AxisNumbers { digits, slots };
    debug!(axis = %axis, "Axis shuffled");
    axis
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn shuffle_always_yields_a_permutation() {
        for _ in 0..500 {
            let axis = shuffle_axis();
            let mut sorted = *axis.digits();
            sorted.sort_unstable();
            assert_eq!(sorted, DIGITS);
            assert_eq!(AxisNumbers::new(*axis.digits()), Ok(axis));
        }
    }

    #[test]
    fn shuffle_varies_between_calls() {
        let draws: HashSet<[u8; 10]> = (0..20).map(|_| *shuffle_axis().digits()).collect();
        assert!(draws.len() > 1, "20 draws were all identical");
    }

    #[test]
    fn parse_and_display_use_comma_form() {
        let axis: AxisNumbers = "3,7,1,9,0,5,2,8,4,6".parse().unwrap();
        assert_eq!(axis.digits(), &[3, 7, 1, 9, 0, 5, 2, 8, 4, 6]);
        assert_eq!(axis.to_string(), "3,7,1,9,0,5,2,8,4,6");
        assert_eq!(axis.slot_of(0), 4);
        assert_eq!(axis.slot_of(17), 1);
    }

    #[test]
    fn rejects_non_permutations() {
        assert!("1,2,3".parse::<AxisNumbers>().is_err());
        assert!("0,0,1,2,3,4,5,6,7,8".parse::<AxisNumbers>().is_err());
        assert!("0,1,2,3,4,5,6,7,8,10".parse::<AxisNumbers>().is_err());
        assert!("0,1,2,3,4,5,6,7,8,x".parse::<AxisNumbers>().is_err());
        assert!(serde_json::from_str::<AxisNumbers>("[0,1,2,3,4,5,6,7,8,8]").is_err());
    }
}
