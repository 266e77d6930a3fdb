//! Errors raised by the accounting engine and the daily orchestrator.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    #[error("date {date} falls into previous record range (latest recorded date is {latest})")]
    OutOfOrderDate { date: NaiveDate, latest: NaiveDate },

    #[error("keyholder {0} not found")]
    UnknownKeyholder(String),

    #[error("keyholder {id} is not active on {date}")]
    InactiveKeyholder { id: String, date: NaiveDate },

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("keyholder {0} is already on the roster")]
    DuplicateKeyholder(String),

    #[error("invalid rules: {0}")]
    InvalidRules(String),
}

pub type Result<T> = std::result::Result<T, Error>;
