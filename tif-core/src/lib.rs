pub use chrono::NaiveDate;

pub use date::{Activity, DateRange};
pub use day::{DayReport, Days, WorkRecord};
pub use entry::{behindness_factor, Entry};
pub use error::{Error, Result};
pub use flags::{Flags, AUTO};
pub use keyholder::Keyholder;
pub use ledger::{median3, AccountView, Ledger};
pub use minutes::Minutes;
pub use rules::Rules;

pub mod date;
pub mod day;
mod engine;
pub mod entry;
pub mod error;
pub mod flags;
pub mod keyholder;
pub mod ledger;
pub mod minutes;
pub mod rules;
