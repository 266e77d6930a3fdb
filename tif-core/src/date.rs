use chrono::NaiveDate;

/// The interval during which a keyholder takes part in the chart.
///
/// A missing bound is unbounded on that side.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Activity {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Activity {
    /// Active on every date.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn starting(from: NaiveDate) -> Self {
        Activity {
            from: Some(from),
            to: None,
        }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Activity {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| from <= date) && self.to.map_or(true, |to| date <= to)
    }

    pub fn starts_on(&self, date: NaiveDate) -> bool {
        self.from == Some(date)
    }
}

/// An inclusive range of calendar dates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
