use std::fmt;

use serde::{Deserialize, Serialize};

/// Money in minor currency units (100 minor = 1 major), stored unsigned so a
/// negative balance is unrepresentable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    const MINOR_PER_MAJOR: u64 = 100;

    pub const ZERO: Amount = Amount(0);

    pub fn from_minor(value: u64) -> Self {
        Amount(value)
    }

    pub fn from_major(value: u64) -> Self {
        Amount(value * Self::MINOR_PER_MAJOR)
    }

    pub fn minor(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtraction that refuses to go below zero; the ledger checks
    /// sufficiency before mutating, so `None` here means a caller bug.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::MINOR_PER_MAJOR;
        let frac = self.0 % Self::MINOR_PER_MAJOR;
        write!(f, "{whole}.{frac:02}")
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}
