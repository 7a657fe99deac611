//! Indilab Runner: stores, write-back, bounded dispatch.
//!
//! This crate builds on `indilab-core` to provide:
//! - TOML pipeline configuration
//! - The `BarStore` / `StorePool` seam with SQLite and in-memory stores
//! - CSV import of daily bars
//! - `UpsertCoordinator`, the update-only write-back of indicator rows
//! - The per-instrument pipeline and the rayon `Dispatcher`
//! - `RunSummary` for display and JSON output

pub mod config;
pub mod dispatcher;
pub mod import;
pub mod pipeline;
pub mod store;
pub mod summary;
pub mod upsert;

pub use config::{ConfigError, DispatchConfig, PipelineConfig, StoreConfig, DEFAULT_WORKERS};
pub use dispatcher::{DispatchError, Dispatcher};
pub use import::{import_csv, read_bars, ImportError, ImportReport};
pub use pipeline::{process_instrument, InstrumentOutcome, InstrumentResult, PipelineError};
pub use store::{
    BarStore, MemoryPool, MemoryStore, SqliteBarStore, SqlitePool, StoreError, StorePool,
};
pub use summary::{RowTotals, RunSummary};
pub use upsert::{UpsertCoordinator, WriteReport};
