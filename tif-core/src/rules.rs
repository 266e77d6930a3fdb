use typed_builder::TypedBuilder;

use super::error::{Error, Result};
use super::minutes::Minutes;

/// Tunable constants of the chart.
///
/// ```
/// use tif_core::{Minutes, Rules};
///
/// let rules = Rules::builder().hard_limit_top(Minutes::from_hours(80)).build();
/// assert_eq!(rules.rotation_max, Minutes::from_hours(40));
/// assert!(rules.validate().is_ok());
/// ```
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Rules {
    /// Reserved id of the median account.
    #[builder(default = String::from("MED"), setter(into))]
    pub median_id: String,

    /// Step by which the median advances.
    #[builder(default = Minutes::from_hours(1))]
    pub median_increment: Minutes,

    /// Where the median lands after a chart rotation.
    #[builder(default = Minutes::from_hours(39))]
    pub rotation_min: Minutes,

    /// Median value that triggers a chart rotation.
    #[builder(default = Minutes::from_hours(40))]
    pub rotation_max: Minutes,

    /// No bank may ever hold more credit than this.
    #[builder(default = Minutes::from_hours(104))]
    pub hard_limit_top: Minutes,

    /// Lead over the median up to which new work is credited in full.
    #[builder(default = Minutes::from_hours(39))]
    pub full_surplus: Minutes,

    /// Lead over the median at which new work stops being credited.
    #[builder(default = Minutes::from_hours(65))]
    pub surplus_limit: Minutes,
}

impl Default for Rules {
    fn default() -> Self {
        Rules::builder().build()
    }
}

impl Rules {
    /// Amount taken from every bank by one chart rotation.
    pub fn rotation_step(&self) -> Minutes {
        self.rotation_max - self.rotation_min
    }

    pub fn validate(&self) -> Result<()> {
        if self.median_id.is_empty() {
            return Err(Error::InvalidRules("median id must not be empty".into()));
        }
        if !self.median_increment.is_positive() {
            return Err(Error::InvalidRules(format!(
                "median increment must be positive, got {}",
                self.median_increment
            )));
        }
        if self.rotation_min.is_negative() || self.rotation_min >= self.rotation_max {
            return Err(Error::InvalidRules(format!(
                "rotation range {}..{} is empty",
                self.rotation_min, self.rotation_max
            )));
        }
        if self.full_surplus >= self.surplus_limit {
            return Err(Error::InvalidRules(format!(
                "full surplus {} must be below the surplus limit {}",
                self.full_surplus, self.surplus_limit
            )));
        }
        if !self.hard_limit_top.is_positive() {
            return Err(Error::InvalidRules(format!(
                "hard limit must be positive, got {}",
                self.hard_limit_top
            )));
        }
        let durations = [
            self.median_increment,
            self.rotation_min,
            self.rotation_max,
            self.hard_limit_top,
            self.full_surplus,
            self.surplus_limit,
        ];
        if let Some(value) = durations.iter().find(|m| !m.within_limit()) {
            return Err(Error::InvalidRules(format!("{} minutes is out of range", value.get())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let rules = Rules::default();
        assert_eq!(rules.median_id, "MED");
        assert_eq!(rules.rotation_step(), Minutes::from_hours(1));
        assert_eq!(rules.surplus_limit, Minutes::from_hours(65));
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn rejects_empty_ranges() {
        let rules = Rules::builder()
            .rotation_min(Minutes::from_hours(40))
            .build();
        assert!(matches!(rules.validate(), Err(Error::InvalidRules(_))));

        let rules = Rules::builder()
            .surplus_limit(Minutes::from_hours(10))
            .build();
        assert!(matches!(rules.validate(), Err(Error::InvalidRules(_))));

        let rules = Rules::builder().median_increment(Minutes::ZERO).build();
        assert!(rules.validate().is_err());

        let rules = Rules::builder()
            .rotation_max(Minutes::new(i64::MAX))
            .build();
        assert!(matches!(rules.validate(), Err(Error::InvalidRules(_))));
    }
}
