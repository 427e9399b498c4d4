//! Game quarters.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use super::GridError;

/// One of the four scoring periods of the event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum Quarter {
    /// Quarter 1.
    #[display("Q1")]
    First,
    /// Quarter 2.
    #[display("Q2")]
    Second,
    /// Quarter 3.
    #[display("Q3")]
    Third,
    /// Quarter 4.
    #[display("Q4")]
    Fourth,
}

impl Quarter {
    /// Quarter number, 1 through 4.
    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
        }
    }

    /// Zero-based index into per-quarter arrays.
    pub fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl TryFrom<i64> for Quarter {
    type Error = GridError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::iter()
            .find(|q| i64::from(q.number()) == value)
            .ok_or(GridError::QuarterOutOfRange(value))
    }
}

impl From<Quarter> for i64 {
    fn from(quarter: Quarter) -> Self {
        i64::from(quarter.number())
    }
}
