//! Bar stores: where bars come from and where indicator rows go.
//!
//! A [`StorePool`] hands out one [`BarStore`] handle per task. Handles are
//! scoped: they go back to the pool (and roll back any open batch) when
//! dropped, whatever the task's outcome.

pub mod memory;
pub mod sql;
pub mod sqlite;

use thiserror::Error;

use indilab_core::{DailyBar, IndicatorRow, Instrument, InstrumentId};

pub use memory::{MemoryPool, MemoryStore};
pub use sqlite::{SqliteBarStore, SqlitePool};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("schema: {0}")]
    Schema(String),

    #[error("{0}: no batch is open")]
    NoBatch(&'static str),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// One isolated handle onto a bar store.
///
/// `update_indicators` is update-only: it returns `false` when no bar row
/// exists for the key and never inserts one. Writes between `begin_batch`
/// and `commit_batch` become visible together.
pub trait BarStore {
    /// Every instrument in the store, ordered by id.
    fn instruments(&mut self) -> Result<Vec<Instrument>, StoreError>;

    /// The instrument's bars in ascending date order. Empty when it has none.
    fn load_bars(&mut self, instrument: InstrumentId) -> Result<Vec<DailyBar>, StoreError>;

    fn begin_batch(&mut self) -> Result<(), StoreError>;

    fn update_indicators(&mut self, row: &IndicatorRow) -> Result<bool, StoreError>;

    fn commit_batch(&mut self) -> Result<(), StoreError>;
}

/// Source of store handles shared across workers.
pub trait StorePool: Send + Sync {
    type Handle: BarStore;

    fn acquire(&self) -> Result<Self::Handle, StoreError>;
}

/// Restrict `all` to the given codes, keeping store order. Empty `codes`
/// keeps everything. Codes match case-insensitively.
pub fn select_instruments(all: Vec<Instrument>, codes: &[String]) -> Vec<Instrument> {
    if codes.is_empty() {
        return all;
    }
    all.into_iter()
        .filter(|i| codes.iter().any(|c| c.eq_ignore_ascii_case(&i.code)))
        .collect()
}
