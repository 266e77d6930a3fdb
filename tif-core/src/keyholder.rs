use std::collections::VecDeque;

use chrono::NaiveDate;

use super::date::{Activity, DateRange};
use super::entry::Entry;
use super::error::{Error, Result};
use super::minutes::Minutes;

/// A participant's bank of work credit.
///
/// Credits are kept oldest-first; penalties consume them from the front.  Debits hold debt
/// entries (negative) as well as the repayments made against them (positive).
///
/// Invariants upheld by every mutating method:
///
/// * `credit_total` is the sum of `credits` and never negative.
/// * `debit_total` is the sum of `debits`.
/// * `credits` is ordered by date.
/// * Both totals stay within [`Minutes::LIMIT`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Keyholder {
    pub(crate) id: String,
    pub(crate) activity: Activity,
    pub(crate) vacations: Vec<DateRange>,
    pub(crate) credits: VecDeque<Entry>,
    pub(crate) debits: Vec<Entry>,
    pub(crate) credit_total: Minutes,
    pub(crate) debit_total: Minutes,
}

impl Keyholder {
    pub fn new<S: Into<String>>(id: S, activity: Activity) -> Self {
        Keyholder {
            id: id.into(),
            activity,
            vacations: Vec::new(),
            credits: VecDeque::new(),
            debits: Vec::new(),
            credit_total: Minutes::ZERO,
            debit_total: Minutes::ZERO,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn vacations(&self) -> &[DateRange] {
        &self.vacations
    }

    pub fn credits(&self) -> &VecDeque<Entry> {
        &self.credits
    }

    pub fn debits(&self) -> &[Entry] {
        &self.debits
    }

    pub fn credit_total(&self) -> Minutes {
        self.credit_total
    }

    pub fn debit_total(&self) -> Minutes {
        self.debit_total
    }

    /// Credit and debt netted against each other.  May be negative.
    pub fn balance(&self) -> Minutes {
        self.credit_total + self.debit_total
    }

    pub fn active_on(&self, date: NaiveDate) -> bool {
        self.activity.contains(date)
    }

    /// Whether a median advance on `date` earns this keyholder vacation credit.
    pub fn gets_vacation(&self, date: NaiveDate) -> bool {
        self.vacations.iter().any(|range| range.contains(date))
    }

    pub fn add_vacation(&mut self, range: DateRange) {
        self.vacations.push(range);
    }

    /// Appends a persisted credit.  Credits must be positive and arrive in date order.
    pub fn load_credit(&mut self, entry: Entry) -> Result<()> {
        if !entry.is_credit() {
            return Err(Error::MalformedRecord(format!(
                "credit {}={} of {} is not positive",
                entry.date,
                entry.amount.get(),
                self.id
            )));
        }
        self.push_credit(entry)
    }

    /// Appends a persisted debit or repayment.
    pub fn load_debit(&mut self, entry: Entry) -> Result<()> {
        self.debit_total = self.checked_total(self.debit_total, &entry)?;
        self.debits.push(entry);
        Ok(())
    }

    /// Date of the oldest banked credit.
    pub fn earliest_credit_date(&self) -> Option<NaiveDate> {
        self.credits.iter().map(|e| e.date).min()
    }

    /// Latest date found anywhere in this keyholder's ledger.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.credits
            .iter()
            .chain(self.debits.iter())
            .map(|e| e.date)
            .max()
    }

    /// Fails if a credit dated `date` would land before the newest banked credit.
    pub(crate) fn check_credit_date(&self, date: NaiveDate) -> Result<()> {
        match self.credits.back() {
            Some(last) if date < last.date => Err(Error::OutOfOrderDate {
                date,
                latest: last.date,
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn checked_total(&self, total: Minutes, entry: &Entry) -> Result<Minutes> {
        total.checked_add(entry.amount).ok_or_else(|| {
            Error::MalformedRecord(format!(
                "{}={} takes the total of {} out of range",
                entry.date,
                entry.amount.get(),
                self.id
            ))
        })
    }

    pub(crate) fn push_credit(&mut self, entry: Entry) -> Result<()> {
        self.check_credit_date(entry.date)?;
        self.credit_total = self.checked_total(self.credit_total, &entry)?;
        self.credits.push_back(entry);
        Ok(())
    }

    /// Starts a new keyholder even with the collective by copying the median's bank.
    pub(crate) fn enroll(&mut self, median: &Keyholder) {
        self.credits = median.credits.clone();
        self.credit_total = median.credit_total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    #[test]
    fn loaded_totals() {
        let mut k = Keyholder::new("AB", Activity::always());
        k.load_credit(Entry::new(d(1), Minutes::new(60), Flags::new()))
            .unwrap();
        k.load_credit(Entry::new(d(2), Minutes::new(30), Flags::auto()))
            .unwrap();
        k.load_debit(Entry::new(d(3), Minutes::new(-120), Flags::auto()))
            .unwrap();
        k.load_debit(Entry::new(d(4), Minutes::new(20), Flags::new()))
            .unwrap();

        assert_eq!(k.credit_total(), Minutes::new(90));
        assert_eq!(k.debit_total(), Minutes::new(-100));
        assert_eq!(k.balance(), Minutes::new(-10));
        assert_eq!(k.earliest_credit_date(), Some(d(1)));
        assert_eq!(k.latest_date(), Some(d(4)));
    }

    #[test]
    fn credits_must_be_ordered_and_positive() {
        let mut k = Keyholder::new("AB", Activity::always());
        k.load_credit(Entry::new(d(5), Minutes::new(60), Flags::new()))
            .unwrap();
        assert_eq!(
            k.load_credit(Entry::new(d(4), Minutes::new(60), Flags::new())),
            Err(Error::OutOfOrderDate {
                date: d(4),
                latest: d(5)
            })
        );
        assert!(matches!(
            k.load_credit(Entry::new(d(6), Minutes::new(-60), Flags::new())),
            Err(Error::MalformedRecord(_))
        ));
        assert_eq!(k.credits().len(), 1);
        assert_eq!(k.credit_total(), Minutes::new(60));
    }

    #[test]
    fn totals_out_of_range_are_rejected() {
        let mut k = Keyholder::new("AB", Activity::always());
        assert!(matches!(
            k.load_debit(Entry::new(d(1), Minutes::new(-i64::MAX), Flags::auto())),
            Err(Error::MalformedRecord(_))
        ));
        k.load_debit(Entry::new(d(1), -Minutes::LIMIT, Flags::auto()))
            .unwrap();
        assert!(k
            .load_debit(Entry::new(d(2), Minutes::new(-1), Flags::auto()))
            .is_err());
        assert_eq!(k.debit_total(), -Minutes::LIMIT);
        assert_eq!(k.debits().len(), 1);

        assert!(k
            .load_credit(Entry::new(d(1), Minutes::new(i64::MAX), Flags::new()))
            .is_err());
        assert!(k.credits().is_empty());
    }

    #[test]
    fn vacation_is_inclusive() {
        let mut k = Keyholder::new("AB", Activity::always());
        k.add_vacation(DateRange::new(d(10), d(12)));
        assert!(!k.gets_vacation(d(9)));
        assert!(k.gets_vacation(d(10)));
        assert!(k.gets_vacation(d(12)));
        assert!(!k.gets_vacation(d(13)));
    }
}
