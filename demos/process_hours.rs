//! Applies daily hours files to the chart in `$TIF_DATA_DIR` and writes the ledgers back.
//!
//! cargo run --example process_hours -- hours/2014-02-03.txt hours/2014-02-10.txt

use tifmaster::tif_core::Rules;
use tifmaster::{read_hours, DataFiles, Database};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: process_hours <hours-file>...");
        std::process::exit(1);
    }

    let mut db = Database::open(DataFiles::from_env(), Rules::default())?;
    if let Some(start) = db.ledger().median_start() {
        println!("Median starts on {}", start);
    }
    if let Some(latest) = db.ledger().latest_date() {
        println!("Last recorded date is {}", latest);
    }

    let days = read_hours(&paths)?;
    for report in db.process(&days)? {
        if let Some(date) = report.date {
            info!(
                %date,
                applied = report.applied,
                advances = report.median_advances,
                rotations = report.rotations,
                median = %report.median,
                "day processed"
            );
        }
    }
    db.save()?;
    println!("Median is now {}", db.ledger().current_median());
    Ok(())
}
