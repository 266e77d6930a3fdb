use std::collections::{BTreeMap, VecDeque};

use chrono::NaiveDate;

use super::date::{Activity, DateRange};
use super::entry::Entry;
use super::error::{Error, Result};
use super::keyholder::Keyholder;
use super::minutes::Minutes;
use super::rules::Rules;

/// The complete chart: every keyholder's bank plus the median account.
///
/// The ledger owns all accounts and is passed explicitly to everything that reads or changes
/// them.  Dates only ever move forward; see [`Ledger::process_day`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    pub(crate) rules: Rules,
    pub(crate) keyholders: BTreeMap<String, Keyholder>,
    pub(crate) median: Keyholder,
    pub(crate) last_processed: Option<NaiveDate>,
}

/// A borrowed view of one account, as handed to writers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountView<'a> {
    pub id: &'a str,
    pub credits: &'a VecDeque<Entry>,
    pub debits: &'a [Entry],
}

impl Ledger {
    pub fn new(rules: Rules) -> Result<Self> {
        rules.validate()?;
        let median = Keyholder::new(rules.median_id.clone(), Activity::always());
        Ok(Ledger {
            rules,
            keyholders: BTreeMap::new(),
            median,
            last_processed: None,
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Adds a keyholder to the roster.  Ids are unique and the median's id is reserved.
    pub fn add_keyholder(&mut self, keyholder: Keyholder) -> Result<()> {
        if keyholder.id == self.median.id || self.keyholders.contains_key(&keyholder.id) {
            return Err(Error::DuplicateKeyholder(keyholder.id));
        }
        self.keyholders.insert(keyholder.id.clone(), keyholder);
        Ok(())
    }

    pub fn add_vacation(&mut self, id: &str, range: DateRange) -> Result<()> {
        if id == self.median.id {
            return Err(Error::MalformedRecord(format!(
                "the median account {} cannot take vacation",
                id
            )));
        }
        self.keyholder_mut(id)?.add_vacation(range);
        Ok(())
    }

    pub fn keyholder(&self, id: &str) -> Result<&Keyholder> {
        self.keyholders
            .get(id)
            .ok_or_else(|| Error::UnknownKeyholder(id.to_string()))
    }

    pub fn keyholder_mut(&mut self, id: &str) -> Result<&mut Keyholder> {
        self.keyholders
            .get_mut(id)
            .ok_or_else(|| Error::UnknownKeyholder(id.to_string()))
    }

    /// Any account by id, the median included.
    pub fn account_mut(&mut self, id: &str) -> Result<&mut Keyholder> {
        if id == self.median.id {
            Ok(&mut self.median)
        } else {
            self.keyholder_mut(id)
        }
    }

    pub fn keyholders(&self) -> impl Iterator<Item = &Keyholder> {
        self.keyholders.values()
    }

    pub fn median(&self) -> &Keyholder {
        &self.median
    }

    /// The collective target every rule is measured against.
    pub fn current_median(&self) -> Minutes {
        self.median.credit_total
    }

    /// Accounts taking part in the chart on `date`.  The median account is always one of them
    /// and comes last.
    pub fn active_accounts(&self, date: NaiveDate) -> impl Iterator<Item = &Keyholder> {
        self.keyholders
            .values()
            .filter(move |k| k.active_on(date))
            .chain(std::iter::once(&self.median))
    }

    /// Date of the oldest credit still held by the median.
    pub fn median_start(&self) -> Option<NaiveDate> {
        self.median.earliest_credit_date()
    }

    /// The last date already reflected in the ledger.  New days must come strictly after it.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.keyholders
            .values()
            .chain(std::iter::once(&self.median))
            .filter_map(Keyholder::latest_date)
            .chain(self.last_processed)
            .max()
    }

    /// All accounts, the median included, ordered by id.
    pub fn serialize(&self) -> Vec<AccountView<'_>> {
        let mut accounts: Vec<_> = self
            .keyholders
            .values()
            .chain(std::iter::once(&self.median))
            .map(|k| AccountView {
                id: &k.id,
                credits: &k.credits,
                debits: &k.debits,
            })
            .collect();
        accounts.sort_by(|a, b| a.id.cmp(b.id));
        accounts
    }
}

/// The smoothed median of a set of totals: the mean of the values at one third, one half and
/// two thirds of the sorted list.  `None` when there is nothing to take the median of.
pub fn median3(totals: &mut [Minutes]) -> Option<Minutes> {
    if totals.is_empty() {
        return None;
    }
    totals.sort();
    let n = totals.len();
    let sum = totals[n / 3] + totals[n / 2] + totals[2 * n / 3];
    Some(Minutes::new(sum.get().div_euclid(3)))
}
