//! CSV import of daily bars.
//!
//! Expected header: `date,open,high,low,close,volume`. Dates are
//! `YYYY-MM-DD`; volume may be empty.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use indilab_core::domain::PriceDefect;
use indilab_core::{DailyBar, Instrument, InstrumentId};

use crate::store::{SqliteBarStore, StoreError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {reason}")]
    InvalidBar { line: u64, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub instrument: Instrument,
    pub read: usize,
    pub inserted: usize,
}

/// Parse bars for one instrument. Rows come back in file order.
pub fn read_bars<R: Read>(reader: R, instrument: InstrumentId) -> Result<Vec<DailyBar>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for record in rdr.deserialize::<CsvBar>() {
        let row = record?;
        let bar = DailyBar {
            instrument_id: instrument,
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        };
        match bar.price_defect() {
            None => {}
            Some(PriceDefect::Missing) => {
                // header is line 1
                return Err(ImportError::InvalidBar {
                    line: bars.len() as u64 + 2,
                    reason: format!("NaN price on {}", bar.date),
                });
            }
            Some(defect) => {
                tracing::warn!(instrument = %instrument, date = %bar.date, ?defect, "suspicious bar kept");
            }
        }
        bars.push(bar);
    }
    Ok(bars)
}

/// Import a CSV file under `code`, creating the instrument if needed.
/// Bars already stored for a date are left untouched.
pub fn import_csv(
    store: &mut SqliteBarStore,
    path: &Path,
    code: &str,
    name: &str,
) -> Result<ImportReport, ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let instrument = store.upsert_instrument(code, name)?;
    let bars = read_bars(file, instrument.id)?;
    let inserted = store.insert_bars(&bars)?;
    tracing::info!(
        instrument = %instrument,
        rows = bars.len(),
        inserted,
        "imported {}",
        path.display()
    );
    Ok(ImportReport {
        instrument,
        read: bars.len(),
        inserted,
    })
}
