//! Keyholder work-credit accounting against a rolling median.
//!
//! The accounting itself lives in [`tif_core`]; this crate ties it to the data files a chart is
//! kept in.
//!
//! ```no_run
//! use tifmaster::{read_hours, DataFiles, Database};
//! use tifmaster::tif_core::Rules;
//!
//! # fn main() -> tifmaster::Result<()> {
//! let mut db = Database::open(DataFiles::from_env(), Rules::default())?;
//! let days = read_hours(&["hours/2014-02-03.txt"])?;
//! db.process(&days)?;
//! db.save()?;
//! # Ok(())
//! # }
//! ```

pub use tif_core;
pub use tif_parser;
pub use tif_render;

pub use error::{Error, Result};
pub use load::load_accounts;
pub use store::{read_hours, DataFiles, Database, DATA_DIR_VAR};

pub mod error;
pub mod load;
pub mod store;
