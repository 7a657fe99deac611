//! Indilab Core: domain types, schema description, indicators, adaptive average, engine.
//!
//! This crate holds everything that is pure computation:
//! - Domain types (instruments, daily bars, indicator rows)
//! - The static schema description every SQL statement is built from
//! - The `Indicator` trait and the concrete indicator battery
//! - KAMA with its ordered fallback chain
//! - `IndicatorEngine`, which turns one instrument's bars into an `IndicatorFrame`
//! - BLAKE3 row digests

pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicator;
pub mod indicators;
pub mod kama;
pub mod schema;

pub use domain::{DailyBar, IndicatorRow, Instrument, InstrumentId};
pub use engine::{EngineConfig, EngineError, IndicatorEngine, IndicatorFrame, VolumeStatus};
pub use fingerprint::RowsDigest;
pub use indicator::{Indicator, IndicatorError};
pub use kama::{AdaptiveAverage, KamaCalculator, KamaParams, KamaTier};
pub use schema::IndicatorColumn;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a worker thread touches is Send + Sync.
    ///
    /// The engine is shared by reference across the dispatcher's pool.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::DailyBar>();
        require_sync::<domain::DailyBar>();
        require_send::<domain::Instrument>();
        require_sync::<domain::Instrument>();
        require_send::<domain::IndicatorRow>();
        require_sync::<domain::IndicatorRow>();

        // Engine types
        require_send::<engine::IndicatorEngine>();
        require_sync::<engine::IndicatorEngine>();
        require_send::<engine::IndicatorFrame>();
        require_sync::<engine::IndicatorFrame>();
        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();

        // KAMA
        require_send::<kama::KamaCalculator>();
        require_sync::<kama::KamaCalculator>();

        // Errors cross thread boundaries inside outcomes
        require_send::<indicator::IndicatorError>();
        require_sync::<indicator::IndicatorError>();
        require_send::<engine::EngineError>();
        require_sync::<engine::EngineError>();

        require_send::<fingerprint::RowsDigest>();
        require_sync::<fingerprint::RowsDigest>();
    }

    /// The persisted column order is part of the storage contract.
    #[test]
    fn column_order_is_stable() {
        let names: Vec<&str> = IndicatorColumn::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.first(), Some(&"sma_8"));
        assert_eq!(names[14..20], ["high_21", "low_21", "high_55", "low_55", "high_100", "low_100"]);
        assert_eq!(names.last(), Some(&"mfi"));
    }
}
