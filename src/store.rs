//! The four data files of a chart and the load, process and save cycle over them.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tif_core::{DayReport, Days, Ledger, Rules};
use tif_parser::error::ParseResult;
use tif_parser::{parse_hours_into, parse_ledger, parse_roster, parse_vacations};
use tif_render::{render, Book};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::load::load_accounts;

/// Environment variable naming the directory the data files live in.
pub const DATA_DIR_VAR: &str = "TIF_DATA_DIR";

/// Locations of the persisted chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFiles {
    pub keyholders: PathBuf,
    pub vacations: PathBuf,
    pub credits: PathBuf,
    pub debits: PathBuf,
}

impl DataFiles {
    /// The conventional file names inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        DataFiles {
            keyholders: dir.join("TIF_keyholders.txt"),
            vacations: dir.join("TIF_vacations.txt"),
            credits: dir.join("TIF_credits.txt"),
            debits: dir.join("TIF_debits.txt"),
        }
    }

    /// Files in `$TIF_DATA_DIR`, or in the current directory when it is not set.
    pub fn from_env() -> Self {
        let dir = env::var_os(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(dir)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(io_error(path))
}

/// Like [`read`], but a missing file reads as empty.
fn read_optional(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no such file, starting empty");
            Ok(String::new())
        }
        result => result.map_err(io_error(path)),
    }
}

fn parsed<T>(path: &Path, result: ParseResult<T>) -> Result<T> {
    result.map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads daily hours files in order.  Records for the same date accumulate across files.
pub fn read_hours<P: AsRef<Path>>(paths: &[P]) -> Result<Days> {
    let mut days = Days::new();
    for path in paths {
        let path = path.as_ref();
        let input = read(path)?;
        parsed(path, parse_hours_into(&input, &mut days))?;
        debug!(path = %path.display(), days = days.len(), "read hours");
    }
    Ok(days)
}

/// A chart loaded from its data files.
#[derive(Debug)]
pub struct Database {
    files: DataFiles,
    ledger: Ledger,
}

impl Database {
    /// Loads the chart.  The roster must exist; missing vacation and ledger files count as empty.
    pub fn open(files: DataFiles, rules: Rules) -> Result<Self> {
        let roster = parsed(&files.keyholders, parse_roster(&read(&files.keyholders)?))?;
        let vacations = parsed(
            &files.vacations,
            parse_vacations(&read_optional(&files.vacations)?),
        )?;
        let credits = parsed(&files.credits, parse_ledger(&read_optional(&files.credits)?))?;
        let debits = parsed(&files.debits, parse_ledger(&read_optional(&files.debits)?))?;

        let ledger = load_accounts(rules, roster, &vacations, &credits, &debits)?;
        info!(
            keyholders = ledger.keyholders().count(),
            median = %ledger.current_median(),
            "ledger loaded"
        );
        Ok(Database { files, ledger })
    }

    pub fn files(&self) -> &DataFiles {
        &self.files
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Applies a batch of days.  On error nothing is applied.
    pub fn process(&mut self, days: &Days) -> Result<Vec<DayReport>> {
        Ok(self.ledger.process_days(days)?)
    }

    /// Writes the credits and debits files back.
    pub fn save(&self) -> Result<()> {
        self.write_book(&self.files.credits, Book::Credits)?;
        self.write_book(&self.files.debits, Book::Debits)?;
        info!(median = %self.ledger.current_median(), "ledger saved");
        Ok(())
    }

    fn write_book(&self, path: &Path, book: Book) -> Result<()> {
        let mut out = Vec::new();
        render(&mut out, &self.ledger, book)?;
        fs::write(path, out).map_err(io_error(path))
    }
}
