use std::convert::TryFrom;

use chrono::NaiveDate;
use typed_builder::TypedBuilder;

use super::flags::Flags;
use super::minutes::Minutes;

/// One atomic change to a keyholder's bank.
///
/// A positive amount is a credit and lives in the credit list; anything else is recorded in the
/// debit list.  Repayments of debt are also kept among the debits, as positive amounts.
///
/// Persisted as `DATE=MINUTESFLAGS`, e.g. `2014-02-03=90a`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, TypedBuilder)]
pub struct Entry {
    /// Day the work (or penalty) was recorded for.
    pub date: NaiveDate,

    /// Signed amount of work.
    #[builder(setter(into))]
    pub amount: Minutes,

    /// Provenance tags.
    #[builder(default, setter(into))]
    pub flags: Flags,
}

impl Entry {
    pub fn new(date: NaiveDate, amount: Minutes, flags: Flags) -> Self {
        Entry {
            date,
            amount,
            flags,
        }
    }

    pub fn is_credit(&self) -> bool {
        self.amount.is_positive()
    }

    /// Multiplies the amount by the behindness factor for `debt`, so that keyholders who are far
    /// behind pay their debt back faster.
    pub fn adjust_for_behindness(&mut self, debt: Minutes, rotation_max: Minutes) {
        self.amount = self.amount * behindness_factor(debt, rotation_max);
    }
}

/// `ceil((rotation_max + |debt|) / rotation_max)`.
///
/// Always at least one, and exactly one when there is no debt.  Saturates at `i64::MAX`.
/// `rotation_max` must be positive.
pub fn behindness_factor(debt: Minutes, rotation_max: Minutes) -> i64 {
    let max = i128::from(rotation_max.get());
    let owed = i128::from(debt.get().unsigned_abs());
    i64::try_from((max + owed + max - 1) / max).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor() {
        let max = Minutes::from_hours(40);
        assert_eq!(behindness_factor(Minutes::ZERO, max), 1);
        assert_eq!(behindness_factor(Minutes::new(-1), max), 2);
        assert_eq!(behindness_factor(Minutes::new(-120), max), 2);
        assert_eq!(behindness_factor(Minutes::new(-2400), max), 2);
        assert_eq!(behindness_factor(Minutes::new(-2401), max), 3);
    }

    #[test]
    fn factor_at_the_edges() {
        assert_eq!(
            behindness_factor(Minutes::new(i64::MIN), Minutes::new(1)),
            i64::MAX
        );
        assert_eq!(
            behindness_factor(Minutes::new(-i64::MAX), Minutes::new(i64::MAX)),
            2
        );
    }

    #[test]
    fn adjust() {
        let mut entry = Entry::builder()
            .date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
            .amount(100)
            .build();
        entry.adjust_for_behindness(Minutes::new(-120), Minutes::from_hours(40));
        assert_eq!(entry.amount, Minutes::new(200));
        assert!(entry.is_credit());
        assert!(entry.flags.is_empty());
    }
}
