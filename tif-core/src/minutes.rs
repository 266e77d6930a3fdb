use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A signed quantity of work, counted in whole minutes.
///
/// All stored ledger state is kept in this type so arithmetic stays exact.  Positive values are
/// banked work, negative values are debt.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Minutes(i64);

impl Minutes {
    pub const ZERO: Minutes = Minutes(0);

    /// Largest magnitude any entry or total may take, a little under two million years.
    pub const LIMIT: Minutes = Minutes(1_000_000_000_000);

    pub const fn new(minutes: i64) -> Self {
        Minutes(minutes)
    }

    pub const fn from_hours(hours: i64) -> Self {
        Minutes(hours * 60)
    }

    /// The raw number of minutes.
    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn within_limit(self) -> bool {
        -Minutes::LIMIT.0 <= self.0 && self.0 <= Minutes::LIMIT.0
    }

    /// Sum of `self` and `rhs`, or `None` if it would leave the `LIMIT` range.
    pub fn checked_add(self, rhs: Minutes) -> Option<Minutes> {
        self.0
            .checked_add(rhs.0)
            .map(Minutes)
            .filter(|m| m.within_limit())
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whole hours, rounded towards negative infinity.
    pub fn hours(self) -> i64 {
        self.0.div_euclid(60)
    }
}

impl From<i64> for Minutes {
    fn from(minutes: i64) -> Self {
        Minutes(minutes)
    }
}

impl Add for Minutes {
    type Output = Minutes;

    fn add(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 + rhs.0)
    }
}

impl AddAssign for Minutes {
    fn add_assign(&mut self, rhs: Minutes) {
        self.0 += rhs.0;
    }
}

impl Sub for Minutes {
    type Output = Minutes;

    fn sub(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 - rhs.0)
    }
}

impl SubAssign for Minutes {
    fn sub_assign(&mut self, rhs: Minutes) {
        self.0 -= rhs.0;
    }
}

impl Neg for Minutes {
    type Output = Minutes;

    fn neg(self) -> Minutes {
        Minutes(-self.0)
    }
}

/// Saturates instead of overflowing.
impl Mul<i64> for Minutes {
    type Output = Minutes;

    fn mul(self, rhs: i64) -> Minutes {
        Minutes(self.0.saturating_mul(rhs))
    }
}

impl Sum for Minutes {
    fn sum<I: Iterator<Item = Minutes>>(iter: I) -> Minutes {
        iter.fold(Minutes::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Minutes> for Minutes {
    fn sum<I: Iterator<Item = &'a Minutes>>(iter: I) -> Minutes {
        iter.copied().sum()
    }
}

/// Renders as `H:MM`, with a leading `-` for debt.
impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let m = self.0.unsigned_abs();
        write!(f, "{}{}:{:02}", sign, m / 60, m % 60)
    }
}
