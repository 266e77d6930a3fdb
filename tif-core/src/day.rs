//! Applying one day of work to the whole chart.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use super::entry::Entry;
use super::error::{Error, Result};
use super::flags::Flags;
use super::ledger::{median3, Ledger};
use super::minutes::Minutes;

/// One raw line item of worked time, before any accounting rules are applied.
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct WorkRecord {
    #[builder(setter(into))]
    pub keyholder: String,

    #[builder(setter(into))]
    pub amount: Minutes,

    #[builder(default, setter(into))]
    pub flags: Flags,
}

/// Work records grouped by the day they were done.
pub type Days = BTreeMap<NaiveDate, Vec<WorkRecord>>;

/// What happened to the chart while processing a single day.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DayReport {
    pub date: Option<NaiveDate>,
    /// Keyholders whose membership started on this day.
    pub enrolled: Vec<String>,
    /// Number of work records applied.
    pub applied: usize,
    /// Number of increments the median advanced by.
    pub median_advances: u32,
    /// Vacation credit granted, per keyholder, as the net change to their balance.
    pub vacation_grants: BTreeMap<String, Minutes>,
    /// Number of chart rotations.
    pub rotations: u32,
    /// The median once the day is done.
    pub median: Minutes,
}

impl Ledger {
    /// Applies one day's work records, then advances the median and rotates the chart as needed.
    ///
    /// `date` must come strictly after every date already in the ledger.  Every record is checked
    /// before anything is applied, and the day is committed only if all of it succeeds.
    pub fn process_day(&mut self, date: NaiveDate, records: &[WorkRecord]) -> Result<DayReport> {
        self.check_date(date)?;
        self.check_records(date, records)?;

        let mut staged = self.clone();
        let report = staged.apply_day(date, records)?;
        *self = staged;
        Ok(report)
    }

    /// Processes a batch of days in date order.  Either every day is committed or none is.
    pub fn process_days(&mut self, days: &Days) -> Result<Vec<DayReport>> {
        let mut staged = self.clone();
        let mut reports = Vec::with_capacity(days.len());
        for (date, records) in days {
            reports.push(staged.process_day(*date, records)?);
        }
        *self = staged;
        Ok(reports)
    }

    fn check_date(&self, date: NaiveDate) -> Result<()> {
        match self.latest_date() {
            Some(latest) if date <= latest => Err(Error::OutOfOrderDate { date, latest }),
            _ => Ok(()),
        }
    }

    fn check_records(&self, date: NaiveDate, records: &[WorkRecord]) -> Result<()> {
        for record in records {
            let keyholder = self.keyholder(&record.keyholder)?;
            if !keyholder.active_on(date) {
                return Err(Error::InactiveKeyholder {
                    id: record.keyholder.clone(),
                    date,
                });
            }
        }
        Ok(())
    }

    fn apply_day(&mut self, date: NaiveDate, records: &[WorkRecord]) -> Result<DayReport> {
        let mut report = DayReport {
            date: Some(date),
            ..DayReport::default()
        };

        self.enroll(date, &mut report);
        self.apply_work(date, records, &mut report)?;
        self.advance_median(date, &mut report)?;
        self.rotate(date, &mut report);

        self.last_processed = Some(date);
        report.median = self.current_median();
        Ok(report)
    }

    /// New keyholders start even with the median.
    fn enroll(&mut self, date: NaiveDate, report: &mut DayReport) {
        let median = &self.median;
        for keyholder in self.keyholders.values_mut() {
            if !keyholder.activity.starts_on(date) {
                continue;
            }
            if !keyholder.credits.is_empty() {
                warn!(keyholder = %keyholder.id, total = %keyholder.credit_total, "enrollment replaces existing credits");
            }
            keyholder.enroll(median);
            info!(keyholder = %keyholder.id, %date, median = %median.credit_total, "boosted to the median");
            report.enrolled.push(keyholder.id.clone());
        }
    }

    fn apply_work(
        &mut self,
        date: NaiveDate,
        records: &[WorkRecord],
        report: &mut DayReport,
    ) -> Result<()> {
        for record in records {
            if record.amount.is_zero() {
                debug!(keyholder = %record.keyholder, %date, "skipping empty work record");
                continue;
            }
            let median = self.median.credit_total;
            let keyholder = self
                .keyholders
                .get_mut(&record.keyholder)
                .ok_or_else(|| Error::UnknownKeyholder(record.keyholder.clone()))?;
            let entry = Entry::new(date, record.amount, record.flags.clone());
            keyholder.register_work(entry, median, &self.rules)?;
            debug!(keyholder = %record.keyholder, %date, amount = %record.amount, "work applied");
            report.applied += 1;
        }
        Ok(())
    }

    /// Moves the median up in fixed increments towards the smoothed median of the active
    /// accounts, granting vacation credit with every increment.
    fn advance_median(&mut self, date: NaiveDate, report: &mut DayReport) -> Result<()> {
        let mut totals: Vec<Minutes> = self
            .active_accounts(date)
            .map(|k| k.credit_total)
            .collect();
        let estimate = match median3(&mut totals) {
            Some(estimate) => estimate,
            None => return Ok(()),
        };

        let increment = self.rules.median_increment;
        let mut old = self.median.credit_total;
        while estimate - old >= increment {
            let entry = Entry::new(date, increment, Flags::new());
            self.median.register_work(entry, old, &self.rules)?;
            if self.median.credit_total == old {
                warn!(%date, median = %old, "median cannot advance past the hard limit");
                break;
            }
            old = self.median.credit_total;
            report.median_advances += 1;
            info!(%date, median = %old, "median advances");

            for keyholder in self.keyholders.values_mut() {
                if keyholder.active_on(date) && keyholder.gets_vacation(date) {
                    let before = keyholder.balance();
                    let grant = Entry::new(date, increment, Flags::auto());
                    keyholder.register_work(grant, old, &self.rules)?;
                    let granted = keyholder.balance() - before;
                    info!(keyholder = %keyholder.id, %date, minutes = granted.get(), "vacation credit");
                    *report
                        .vacation_grants
                        .entry(keyholder.id.clone())
                        .or_insert(Minutes::ZERO) += granted;
                }
            }
        }
        Ok(())
    }

    /// Rotates the chart while the median sits at or above the rotation ceiling.
    ///
    /// The median is an active account, so it is stepped back once on its own and once more
    /// along with every active keyholder.
    fn rotate(&mut self, date: NaiveDate, report: &mut DayReport) {
        let step = self.rules.rotation_step();
        while self.median.credit_total >= self.rules.rotation_max {
            self.median.register_penalty(date, step);
            let cutoff = self.median.earliest_credit_date().unwrap_or(date);
            for keyholder in self.keyholders.values_mut() {
                if keyholder.active_on(date) {
                    keyholder.register_penalty(date, step);
                    keyholder.compact_penalties(cutoff);
                }
            }
            self.median.register_penalty(date, step);
            self.median.compact_penalties(cutoff);
            report.rotations += 1;
            info!(%date, median = %self.median.credit_total, "chart rotates, median moves back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::{Activity, DateRange};
    use crate::keyholder::Keyholder;
    use crate::rules::Rules;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 4, day).unwrap()
    }

    fn hours(id: &str, h: i64) -> WorkRecord {
        WorkRecord::builder()
            .keyholder(id)
            .amount(Minutes::from_hours(h))
            .build()
    }

    fn ledger_with(rules: Rules, ids: &[&str]) -> Ledger {
        let mut ledger = Ledger::new(rules).unwrap();
        for id in ids {
            ledger
                .add_keyholder(Keyholder::new(*id, Activity::always()))
                .unwrap();
        }
        ledger
    }

    #[test]
    fn median_advances_and_grants_vacation() {
        let mut ledger = ledger_with(Rules::default(), &["AA", "BB", "CC", "VV"]);
        ledger
            .add_vacation("VV", DateRange::new(d(1), d(5)))
            .unwrap();

        let report = ledger
            .process_day(d(1), &[hours("AA", 3), hours("BB", 3), hours("CC", 3)])
            .unwrap();

        // Totals 0, 0, 3h, 3h, 3h with the median and VV at zero.
        assert_eq!(report.applied, 3);
        assert_eq!(report.median_advances, 2);
        assert_eq!(report.rotations, 0);
        assert_eq!(ledger.current_median(), Minutes::from_hours(2));
        assert_eq!(report.median, Minutes::from_hours(2));
        assert_eq!(
            report.vacation_grants.get("VV"),
            Some(&Minutes::from_hours(2))
        );
        let vv = ledger.keyholder("VV").unwrap();
        assert_eq!(vv.credit_total(), Minutes::from_hours(2));
        assert!(vv.credits().iter().all(|e| e.flags.is_auto()));
    }

    #[test]
    fn median_counts_itself() {
        let mut ledger = ledger_with(Rules::default(), &["AA"]);
        let report = ledger.process_day(d(1), &[hours("AA", 3)]).unwrap();
        // (0 + 3h + 3h) / 3
        assert_eq!(report.median_advances, 2);
        assert_eq!(ledger.current_median(), Minutes::from_hours(2));
        assert_eq!(ledger.current_median().to_string(), "2:00");
    }

    #[test]
    fn vacation_grant_reports_what_was_banked() {
        let rules = Rules::builder()
            .hard_limit_top(Minutes::from_hours(2))
            .build();
        let mut ledger = ledger_with(rules, &["AA", "BB", "CC", "VV"]);
        ledger
            .keyholder_mut("VV")
            .unwrap()
            .load_credit(Entry::new(d(1), Minutes::new(90), Flags::new()))
            .unwrap();
        ledger
            .add_vacation("VV", DateRange::new(d(2), d(2)))
            .unwrap();

        let report = ledger
            .process_day(d(2), &[hours("AA", 1), hours("BB", 1), hours("CC", 1)])
            .unwrap();

        assert_eq!(report.median_advances, 1);
        // The hard limit leaves room for 30 of the 60 minutes.
        assert_eq!(report.vacation_grants.get("VV"), Some(&Minutes::new(30)));
        assert_eq!(
            ledger.keyholder("VV").unwrap().credit_total(),
            Minutes::from_hours(2)
        );
    }

    #[test]
    fn chart_rotation() {
        let rules = Rules::builder()
            .rotation_min(Minutes::from_hours(2))
            .rotation_max(Minutes::from_hours(3))
            .build();
        let mut ledger = ledger_with(rules, &["AA", "BB", "CC"]);

        let report = ledger
            .process_day(d(1), &[hours("AA", 3), hours("BB", 3), hours("CC", 3)])
            .unwrap();

        // The median reaches 3h, then steps back twice: once on its own, once as an active
        // account.
        assert_eq!(report.median_advances, 3);
        assert_eq!(report.rotations, 1);
        assert_eq!(ledger.current_median(), Minutes::from_hours(1));
        assert_eq!(report.median.to_string(), "1:00");
        for k in ledger.keyholders() {
            assert_eq!(k.credit_total(), Minutes::from_hours(2));
            assert_eq!(k.debit_total(), Minutes::ZERO);
        }
    }

    #[test]
    fn rotation_stops_below_the_ceiling() {
        let rules = Rules::builder()
            .rotation_min(Minutes::from_hours(2))
            .rotation_max(Minutes::from_hours(3))
            .build();
        let mut ledger = ledger_with(rules, &["AA", "BB", "CC"]);

        let report = ledger
            .process_day(d(1), &[hours("AA", 4), hours("BB", 4), hours("CC", 4)])
            .unwrap();

        assert_eq!(report.median_advances, 4);
        assert_eq!(report.rotations, 1);
        assert_eq!(ledger.current_median(), Minutes::from_hours(2));
        for k in ledger.keyholders() {
            assert_eq!(k.credit_total(), Minutes::from_hours(3));
        }
    }

    #[test]
    fn rotation_turns_missing_credit_into_debt() {
        let rules = Rules::builder()
            .rotation_min(Minutes::from_hours(2))
            .rotation_max(Minutes::from_hours(3))
            .build();
        let mut ledger = ledger_with(rules, &["AA", "BB", "CC", "LZ"]);

        let report = ledger
            .process_day(d(1), &[hours("AA", 6), hours("BB", 6), hours("CC", 6)])
            .unwrap();

        // Totals 0, 0, 6h, 6h, 6h put the median at 4h, so the chart rotates once.
        assert_eq!(report.rotations, 1);
        let lz = ledger.keyholder("LZ").unwrap();
        assert_eq!(lz.credit_total(), Minutes::ZERO);
        assert_eq!(lz.debit_total(), Minutes::from_hours(-1));
        assert_eq!(lz.balance(), Minutes::from_hours(-1));
        assert!(lz.debits().iter().all(|e| e.flags.is_auto()));
    }

    #[test]
    fn new_keyholder_starts_at_the_median() {
        let mut ledger = ledger_with(Rules::default(), &["AA", "BB", "CC"]);
        ledger
            .add_keyholder(Keyholder::new("NU", Activity::starting(d(2))))
            .unwrap();

        ledger
            .process_day(d(1), &[hours("AA", 3), hours("BB", 3), hours("CC", 3)])
            .unwrap();
        assert_eq!(ledger.keyholder("NU").unwrap().credit_total(), Minutes::ZERO);

        let report = ledger.process_day(d(2), &[hours("NU", 1)]).unwrap();
        assert_eq!(report.enrolled, vec!["NU".to_string()]);
        let nu = ledger.keyholder("NU").unwrap();
        assert_eq!(nu.credit_total(), Minutes::from_hours(4));
        assert_eq!(nu.credits().iter().map(|e| e.amount).sum::<Minutes>(), nu.credit_total());
    }

    #[test]
    fn same_date_twice() {
        let mut ledger = ledger_with(Rules::default(), &["AA"]);
        ledger.process_day(d(3), &[]).unwrap();
        assert_eq!(
            ledger.process_day(d(3), &[]).err(),
            Some(Error::OutOfOrderDate {
                date: d(3),
                latest: d(3)
            })
        );
        assert!(ledger.process_day(d(2), &[hours("AA", 1)]).is_err());
    }

    #[test]
    fn rejected_day_leaves_ledger_untouched() {
        let mut ledger = ledger_with(Rules::default(), &["AA"]);
        ledger
            .add_keyholder(Keyholder::new("OLD", Activity::between(d(1), d(2))))
            .unwrap();
        let before = ledger.clone();

        assert_eq!(
            ledger
                .process_day(d(4), &[hours("AA", 2), hours("ZZ", 1)])
                .err(),
            Some(Error::UnknownKeyholder("ZZ".into()))
        );
        assert_eq!(
            ledger
                .process_day(d(4), &[hours("AA", 2), hours("OLD", 1)])
                .err(),
            Some(Error::InactiveKeyholder {
                id: "OLD".into(),
                date: d(4)
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut ledger = ledger_with(Rules::default(), &["AA"]);
        let before = ledger.clone();

        let mut days = Days::new();
        days.insert(d(1), vec![hours("AA", 2)]);
        days.insert(d(2), vec![hours("XX", 2)]);
        assert!(ledger.process_days(&days).is_err());
        assert_eq!(ledger, before);

        days.remove(&d(2));
        days.insert(d(2), vec![hours("AA", -1)]);
        let reports = ledger.process_days(&days).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(ledger.latest_date(), Some(d(2)));
        assert_eq!(ledger.keyholder("AA").unwrap().balance(), Minutes::from_hours(1));
    }
}
