//! Write-back of computed indicator rows onto existing bar rows.

use serde::Serialize;

use indilab_core::fingerprint::RowsDigestBuilder;
use indilab_core::{IndicatorRow, InstrumentId, RowsDigest};

use crate::store::{BarStore, StoreError};

/// Counts for one instrument's write-back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: usize,
    /// Rows with no minimal-presence field defined.
    pub skipped: usize,
    /// Rows whose key no longer exists in the store.
    pub missing: usize,
    pub failed: usize,
    /// Digest over the rows actually written.
    pub digest: RowsDigest,
}

impl WriteReport {
    fn empty() -> Self {
        Self {
            written: 0,
            skipped: 0,
            missing: 0,
            failed: 0,
            digest: RowsDigest::empty(),
        }
    }
}

/// Applies the write guard and the update-only discipline for one instrument
/// inside a single batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpsertCoordinator;

impl UpsertCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Write every row that passes the minimal-presence guard.
    ///
    /// Per-date failures are counted and skipped. Failing to open or commit
    /// the batch is returned as an error and nothing is persisted.
    pub fn write<S: BarStore>(
        &self,
        store: &mut S,
        instrument: InstrumentId,
        rows: &[IndicatorRow],
    ) -> Result<WriteReport, StoreError> {
        let mut report = WriteReport::empty();
        let eligible: Vec<&IndicatorRow> = rows
            .iter()
            .filter(|r| r.has_minimal_presence())
            .collect();
        report.skipped = rows.len() - eligible.len();
        if eligible.is_empty() {
            tracing::debug!(instrument = %instrument, skipped = report.skipped, "nothing to write");
            return Ok(report);
        }

        let mut digest = RowsDigestBuilder::new();
        store.begin_batch()?;
        for row in eligible {
            match store.update_indicators(row) {
                Ok(true) => {
                    digest.push(row);
                    report.written += 1;
                }
                Ok(false) => {
                    tracing::warn!(instrument = %instrument, date = %row.date, "no bar row for key, not written");
                    report.missing += 1;
                }
                Err(e) => {
                    tracing::error!(instrument = %instrument, date = %row.date, "write failed: {e}");
                    report.failed += 1;
                }
            }
        }
        store.commit_batch()?;

        report.digest = digest.finish();
        tracing::debug!(
            instrument = %instrument,
            rows = report.written,
            skipped = report.skipped,
            digest = report.digest.short(),
            "committed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryPool, StorePool};
    use chrono::NaiveDate;
    use indilab_core::{DailyBar, IndicatorColumn};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn seeded_pool(days: &[u32]) -> MemoryPool {
        let pool = MemoryPool::new();
        let bars: Vec<DailyBar> = days
            .iter()
            .map(|&d| DailyBar {
                instrument_id: InstrumentId(1),
                date: date(d),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: Some(1),
            })
            .collect();
        pool.insert_bars(&bars).unwrap();
        pool
    }

    fn row(d: u32, column: Option<IndicatorColumn>) -> IndicatorRow {
        let mut r = IndicatorRow::empty(InstrumentId(1), date(d));
        r.set(IndicatorColumn::Atr, 0.5);
        if let Some(c) = column {
            r.set(c, 1.0);
        }
        r
    }

    /// Store that refuses one date and optionally the commit.
    struct Flaky {
        inner: crate::store::MemoryStore,
        bad_date: NaiveDate,
        fail_commit: bool,
    }

    impl BarStore for Flaky {
        fn instruments(&mut self) -> Result<Vec<indilab_core::Instrument>, StoreError> {
            self.inner.instruments()
        }
        fn load_bars(&mut self, id: InstrumentId) -> Result<Vec<DailyBar>, StoreError> {
            self.inner.load_bars(id)
        }
        fn begin_batch(&mut self) -> Result<(), StoreError> {
            self.inner.begin_batch()
        }
        fn update_indicators(&mut self, row: &IndicatorRow) -> Result<bool, StoreError> {
            if row.date == self.bad_date {
                return Err(StoreError::Corrupt("refused".into()));
            }
            self.inner.update_indicators(row)
        }
        fn commit_batch(&mut self) -> Result<(), StoreError> {
            if self.fail_commit {
                return Err(StoreError::Corrupt("commit refused".into()));
            }
            self.inner.commit_batch()
        }
    }

    #[test]
    fn guard_and_missing_keys_are_counted() {
        let pool = seeded_pool(&[1, 2, 3]);
        let mut store = pool.acquire().unwrap();
        let rows = vec![
            row(1, None),
            row(2, Some(IndicatorColumn::Ema21)),
            row(3, Some(IndicatorColumn::Adx)),
            row(4, Some(IndicatorColumn::Rsi)),
        ];
        let report = UpsertCoordinator::new()
            .write(&mut store, InstrumentId(1), &rows)
            .unwrap();
        assert_eq!(report.written, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.missing, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.digest, RowsDigest::of(&rows[1..3]));

        let stored = pool.indicator_rows(InstrumentId(1)).unwrap();
        assert_eq!(stored[0].defined_count(), 0);
        assert_eq!(stored[1], rows[1]);
        assert_eq!(pool.row_count().unwrap(), 3);
    }

    #[test]
    fn per_date_failure_does_not_stop_the_rest() {
        let pool = seeded_pool(&[1, 2, 3]);
        let mut store = Flaky {
            inner: pool.acquire().unwrap(),
            bad_date: date(2),
            fail_commit: false,
        };
        let rows: Vec<IndicatorRow> = (1..=3).map(|d| row(d, Some(IndicatorColumn::Kama))).collect();
        let report = UpsertCoordinator::new()
            .write(&mut store, InstrumentId(1), &rows)
            .unwrap();
        assert_eq!((report.written, report.failed), (2, 1));
        assert_eq!(pool.indicator_rows(InstrumentId(1)).unwrap()[2], rows[2]);
    }

    #[test]
    fn commit_failure_fails_the_instrument() {
        let pool = seeded_pool(&[1]);
        let mut store = Flaky {
            inner: pool.acquire().unwrap(),
            bad_date: date(30),
            fail_commit: true,
        };
        let rows = vec![row(1, Some(IndicatorColumn::Sma21))];
        assert!(UpsertCoordinator::new()
            .write(&mut store, InstrumentId(1), &rows)
            .is_err());
        drop(store);
        assert_eq!(pool.indicator_rows(InstrumentId(1)).unwrap()[0].defined_count(), 0);
    }

    #[test]
    fn all_guarded_rows_skip_the_batch() {
        let pool = seeded_pool(&[1, 2]);
        let mut store = pool.acquire().unwrap();
        let rows = vec![row(1, None), row(2, None)];
        let report = UpsertCoordinator::new()
            .write(&mut store, InstrumentId(1), &rows)
            .unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.written, 0);
        assert_eq!(report.digest, RowsDigest::empty());
    }
}
