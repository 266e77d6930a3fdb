//! The accounting rules applied to a single keyholder's bank.
//!
//! Every operation mutates one [`Keyholder`] and nothing else.  The current median is passed in
//! by the caller, which keeps the engine free of any shared registry.

use std::convert::TryFrom;

use chrono::NaiveDate;
use tracing::debug;

use super::entry::{behindness_factor, Entry};
use super::error::{Error, Result};
use super::flags::Flags;
use super::keyholder::Keyholder;
use super::minutes::Minutes;
use super::rules::Rules;

impl Keyholder {
    /// Registers one work record of either sign.
    ///
    /// Debits are recorded as they are.  Credits first pay back outstanding debt (amplified by
    /// the behindness factor while the debt cannot be cleared), then taper off as the bank pulls
    /// ahead of `median`, and are finally clamped to the hard limit.
    ///
    /// On error the keyholder is left as it was.
    pub fn register_work(&mut self, mut entry: Entry, median: Minutes, rules: &Rules) -> Result<()> {
        if entry.amount.is_zero() {
            return Ok(());
        }
        if !entry.amount.within_limit() {
            return Err(Error::MalformedRecord(format!(
                "{} minutes of work for {} on {} is out of range",
                entry.amount.get(),
                self.id,
                entry.date
            )));
        }

        if entry.amount.is_negative() {
            self.debit_total = self.checked_total(self.debit_total, &entry)?;
            self.debits.push(entry);
            return Ok(());
        }
        self.check_credit_date(entry.date)?;

        if (self.debit_total + entry.amount).is_negative() {
            let raw = entry.amount;
            let owed = -self.debit_total;
            let factor = behindness_factor(self.debit_total, rules.rotation_max);
            entry.adjust_for_behindness(self.debit_total, rules.rotation_max);
            if entry.amount <= owed {
                debug!(keyholder = %self.id, raw = %raw, applied = %entry.amount, factor, "repaying debt");
                self.debit_total += entry.amount;
                self.debits.push(entry);
                return Ok(());
            }

            // The amplified repayment overshoots the debt: clear it exactly and bank whatever
            // raw work was not needed to do so.
            let spent = Minutes::new((owed.get() + factor - 1) / factor);
            debug!(keyholder = %self.id, raw = %raw, spent = %spent, factor, "debt cleared by amplified repayment");
            self.debits
                .push(Entry::new(entry.date, owed, entry.flags.clone()));
            self.debit_total = Minutes::ZERO;
            entry.amount = raw - spent;
            if !entry.amount.is_positive() {
                return Ok(());
            }
        } else if self.debit_total.is_negative() {
            let owed = -self.debit_total;
            debug!(keyholder = %self.id, owed = %owed, "debt cleared");
            self.debits
                .push(Entry::new(entry.date, owed, entry.flags.clone()));
            entry.amount -= owed;
            self.debit_total = Minutes::ZERO;
            if !entry.amount.is_positive() {
                return Ok(());
            }
        }

        self.bank(entry, median, rules)
    }

    /// Surplus taper, hard cap, then append to the credit list.
    fn bank(&mut self, mut entry: Entry, median: Minutes, rules: &Rules) -> Result<()> {
        let lead = self.credit_total - median;
        if lead > rules.full_surplus {
            let excess = lead - rules.full_surplus;
            let span = rules.surplus_limit - rules.full_surplus;
            let tapered = if excess < span {
                let scaled = i128::from(entry.amount.get()) * i128::from((span - excess).get())
                    / i128::from(span.get());
                Minutes::new(i64::try_from(scaled).map_err(|_| {
                    Error::MalformedRecord(format!("tapered credit for {} is out of range", self.id))
                })?)
            } else {
                Minutes::ZERO
            };
            debug!(keyholder = %self.id, lead = %lead, from = %entry.amount, to = %tapered, "surplus taper");
            entry.amount = tapered;
        }

        if self.credit_total + entry.amount > rules.hard_limit_top {
            entry.amount = rules.hard_limit_top - self.credit_total;
            debug!(keyholder = %self.id, amount = %entry.amount, "clamped to hard limit");
        }

        if !entry.amount.is_positive() {
            debug!(keyholder = %self.id, date = %entry.date, "credit discarded");
            return Ok(());
        }
        self.push_credit(entry)
    }

    /// Removes `penalty` minutes from the bank, consuming the oldest credits first.  Whatever
    /// cannot be covered by credit becomes an automatic debit.
    pub fn register_penalty(&mut self, date: NaiveDate, penalty: Minutes) {
        let mut remaining = penalty;
        while remaining.is_positive() {
            let oldest = match self.credits.front_mut() {
                Some(oldest) => oldest,
                None => {
                    debug!(keyholder = %self.id, amount = %remaining, "penalty exceeds banked credit");
                    self.debits.push(Entry::new(date, -remaining, Flags::auto()));
                    self.debit_total -= remaining;
                    break;
                }
            };
            if oldest.amount > remaining {
                oldest.amount -= remaining;
                self.credit_total -= remaining;
                break;
            }
            let consumed = oldest.amount;
            self.credits.pop_front();
            self.credit_total -= consumed;
            remaining -= consumed;
        }
    }

    /// Cancels debt recorded before `cutoff` against the repayments in the debit list.
    ///
    /// Debt on or after `cutoff` is never touched and `debit_total` does not change.  The
    /// resulting list is the recent debt, then the surviving mature debt, then the surviving
    /// repayments, each group in its original order.
    pub fn compact_penalties(&mut self, cutoff: NaiveDate) {
        let mut repayments = Vec::new();
        let mut mature = Vec::new();
        let mut kept = Vec::new();
        for entry in self.debits.drain(..) {
            if !entry.amount.is_negative() {
                repayments.push(entry);
            } else if entry.date < cutoff {
                mature.push(entry);
            } else {
                kept.push(entry);
            }
        }

        let pool: Minutes = repayments.iter().map(|e| e.amount).sum();
        let mut remaining = pool;
        for mut entry in mature {
            if !remaining.is_positive() {
                kept.push(entry);
            } else if -entry.amount <= remaining {
                remaining += entry.amount;
            } else {
                entry.amount += remaining;
                remaining = Minutes::ZERO;
                kept.push(entry);
            }
        }

        let cancelled = pool - remaining;
        let mut budget = cancelled;
        for mut entry in repayments {
            if budget.is_positive() && entry.amount.is_positive() {
                if entry.amount <= budget {
                    budget -= entry.amount;
                    continue;
                }
                entry.amount -= budget;
                budget = Minutes::ZERO;
            }
            kept.push(entry);
        }

        if cancelled.is_positive() {
            debug!(keyholder = %self.id, cancelled = %cancelled, %cutoff, "compacted debit ledger");
        }
        self.debits = kept;
    }
}
