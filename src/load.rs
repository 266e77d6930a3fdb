use tif_core::{Keyholder, Ledger, Result, Rules};
use tif_parser::{LedgerLine, Vacation};
use tracing::warn;

/// Builds a ledger from already parsed files.
///
/// Lines for the median account go to the median.  Totals are recomputed from the loaded
/// entries, so loaded accounts satisfy the same invariants as processed ones.
pub fn load_accounts(
    rules: Rules,
    roster: Vec<Keyholder>,
    vacations: &[Vacation],
    credits: &[LedgerLine],
    debits: &[LedgerLine],
) -> Result<Ledger> {
    let mut ledger = Ledger::new(rules)?;
    for keyholder in roster {
        ledger.add_keyholder(keyholder)?;
    }
    for vacation in vacations {
        ledger.add_vacation(&vacation.keyholder, vacation.range)?;
    }
    for line in credits {
        let account = ledger.account_mut(&line.keyholder)?;
        for entry in &line.entries {
            account.load_credit(entry.clone())?;
        }
    }
    for line in debits {
        let account = ledger.account_mut(&line.keyholder)?;
        for entry in &line.entries {
            account.load_debit(entry.clone())?;
        }
        if account.debit_total().is_positive() {
            warn!(keyholder = %line.keyholder, total = %account.debit_total(), "debit ledger has a positive total");
        }
    }
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tif_core::{Error, Minutes, NaiveDate};
    use tif_parser::{parse_ledger, parse_roster, parse_vacations};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 2, day).unwrap()
    }

    #[test]
    fn loads_all_files() {
        let roster = parse_roster("AB\nCD 2014-02-10\n").unwrap();
        let vacations = parse_vacations("AB 2014-02-20 2014-02-27\n").unwrap();
        let credits = parse_ledger(indoc!(
            "
            AB 2014-02-03=60 2014-02-04=30a

            MED 2014-02-01=60
            "
        ))
        .unwrap();
        let debits = parse_ledger("CD 2014-02-05=-90a 2014-02-06=30\n").unwrap();

        let ledger = load_accounts(Rules::default(), roster, &vacations, &credits, &debits).unwrap();
        let ab = ledger.keyholder("AB").unwrap();
        assert_eq!(ab.credit_total(), Minutes::new(90));
        assert!(ab.gets_vacation(d(21)));
        assert_eq!(ledger.keyholder("CD").unwrap().debit_total(), Minutes::new(-60));
        assert_eq!(ledger.current_median(), Minutes::new(60));
        assert_eq!(ledger.median_start(), Some(d(1)));
        assert_eq!(ledger.latest_date(), Some(d(6)));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let roster = parse_roster("AB\n").unwrap();
        let vacations = parse_vacations("XY 2014-02-20 2014-02-27\n").unwrap();
        assert_eq!(
            load_accounts(Rules::default(), roster.clone(), &vacations, &[], &[]),
            Err(Error::UnknownKeyholder("XY".into()))
        );

        let credits = parse_ledger("ZZ 2014-02-03=60\n").unwrap();
        assert_eq!(
            load_accounts(Rules::default(), roster, &[], &credits, &[]),
            Err(Error::UnknownKeyholder("ZZ".into()))
        );
    }

    #[test]
    fn credits_are_validated() {
        let roster = parse_roster("AB\n").unwrap();
        let credits = parse_ledger("AB 2014-02-04=60 2014-02-03=60\n").unwrap();
        assert!(matches!(
            load_accounts(Rules::default(), roster.clone(), &[], &credits, &[]),
            Err(Error::OutOfOrderDate { .. })
        ));

        let credits = parse_ledger("AB 2014-02-04=-60\n").unwrap();
        assert!(matches!(
            load_accounts(Rules::default(), roster.clone(), &[], &credits, &[]),
            Err(Error::MalformedRecord(_))
        ));

        let debits = parse_ledger("AB 2014-02-03=-9223372036854775807\n").unwrap();
        assert!(matches!(
            load_accounts(Rules::default(), roster, &[], &[], &debits),
            Err(Error::MalformedRecord(_))
        ));
    }
}
