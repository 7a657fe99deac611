//! Read, compute, write for a single instrument.

use serde::Serialize;
use thiserror::Error;

use indilab_core::engine::IndicatorGroup;
use indilab_core::{EngineError, IndicatorEngine, Instrument, KamaTier, VolumeStatus};

use crate::store::{BarStore, StoreError, StorePool};
use crate::upsert::{UpsertCoordinator, WriteReport};

/// Why an instrument failed, by stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("acquire store handle: {0}")]
    Acquire(#[source] StoreError),

    #[error("load bars: {0}")]
    Fetch(#[source] StoreError),

    #[error(transparent)]
    Compute(#[from] EngineError),

    #[error("persist: {0}")]
    Persist(#[source] StoreError),
}

/// Terminal state of one instrument in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstrumentOutcome {
    Written {
        bars: usize,
        report: WriteReport,
        /// `None` when every KAMA tier failed and the EMA substitute was used.
        kama_tier: Option<KamaTier>,
        volume: VolumeStatus,
        failed_groups: Vec<IndicatorGroup>,
    },
    /// The store had no bars for the instrument.
    Skipped,
    Failed {
        error: String,
    },
    Cancelled,
}

impl InstrumentOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            InstrumentOutcome::Written { .. } => "written",
            InstrumentOutcome::Skipped => "skipped",
            InstrumentOutcome::Failed { .. } => "failed",
            InstrumentOutcome::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentResult {
    pub instrument: Instrument,
    #[serde(flatten)]
    pub outcome: InstrumentOutcome,
}

/// Run one instrument end to end on its own store handle.
///
/// The handle is dropped on every path, which returns it to the pool and
/// rolls back an uncommitted batch.
pub fn process_instrument<P: StorePool>(
    pool: &P,
    engine: &IndicatorEngine,
    coordinator: &UpsertCoordinator,
    instrument: &Instrument,
) -> InstrumentOutcome {
    match run(pool, engine, coordinator, instrument) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(instrument = %instrument, "failed: {e}");
            InstrumentOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

fn run<P: StorePool>(
    pool: &P,
    engine: &IndicatorEngine,
    coordinator: &UpsertCoordinator,
    instrument: &Instrument,
) -> Result<InstrumentOutcome, PipelineError> {
    let mut store = pool.acquire().map_err(PipelineError::Acquire)?;

    let bars = store.load_bars(instrument.id).map_err(PipelineError::Fetch)?;
    if bars.is_empty() {
        tracing::info!(instrument = %instrument, "no bars, skipping");
        return Ok(InstrumentOutcome::Skipped);
    }

    let frame = engine.compute(&bars)?;
    for failure in frame.failures() {
        tracing::warn!(
            instrument = %instrument,
            group = failure.group.name(),
            "indicator group undefined: {}",
            failure.error
        );
    }
    let rows = frame.to_rows(&bars);

    let report = coordinator
        .write(&mut store, instrument.id, &rows)
        .map_err(PipelineError::Persist)?;

    let tier = frame.kama_tier().map_or("ema_substitute".to_string(), |t| t.to_string());
    tracing::info!(
        instrument = %instrument,
        rows = report.written,
        skipped = report.skipped,
        tier = %tier,
        "instrument done"
    );

    Ok(InstrumentOutcome::Written {
        bars: bars.len(),
        report,
        kama_tier: frame.kama_tier(),
        volume: frame.volume_status(),
        failed_groups: frame.failures().iter().map(|f| f.group).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPool;
    use chrono::NaiveDate;
    use indilab_core::{DailyBar, EngineConfig, InstrumentId};

    fn bars(id: i64, n: usize) -> Vec<DailyBar> {
        let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.05;
                DailyBar {
                    instrument_id: InstrumentId(id),
                    date: base + chrono::Duration::days(i as i64),
                    open: close - 0.2,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: Some(10_000 + i as u64),
                }
            })
            .collect()
    }

    fn engine() -> IndicatorEngine {
        IndicatorEngine::new(EngineConfig::default(), None).unwrap()
    }

    #[test]
    fn empty_history_is_skipped() {
        let pool = MemoryPool::new();
        let inst = Instrument::new(1, "EMPTY", "Nothing");
        pool.add_instrument(inst.clone()).unwrap();
        let outcome = process_instrument(&pool, &engine(), &UpsertCoordinator::new(), &inst);
        assert_eq!(outcome, InstrumentOutcome::Skipped);
    }

    #[test]
    fn writes_every_row_past_warmup() {
        let pool = MemoryPool::new();
        let inst = Instrument::new(2, "WAVE", "Wave");
        pool.add_instrument(inst.clone()).unwrap();
        pool.insert_bars(&bars(2, 60)).unwrap();

        let outcome = process_instrument(&pool, &engine(), &UpsertCoordinator::new(), &inst);
        let InstrumentOutcome::Written { bars, report, kama_tier, volume, failed_groups } = outcome
        else {
            panic!("expected written, got {outcome:?}");
        };
        assert_eq!(bars, 60);
        // kama is the first guard field defined, at index 10
        assert_eq!(report.skipped, 10);
        assert_eq!(report.written, 50);
        assert_eq!(kama_tier, Some(KamaTier::Manual));
        assert_eq!(volume, VolumeStatus::Usable);
        assert!(failed_groups.is_empty());
    }

    #[test]
    fn unordered_bars_fail_the_instrument() {
        struct Reversed(MemoryPool);
        impl StorePool for Reversed {
            type Handle = ReversedStore;
            fn acquire(&self) -> Result<ReversedStore, StoreError> {
                Ok(ReversedStore(self.0.acquire()?))
            }
        }
        struct ReversedStore(crate::store::MemoryStore);
        impl BarStore for ReversedStore {
            fn instruments(&mut self) -> Result<Vec<Instrument>, StoreError> {
                self.0.instruments()
            }
            fn load_bars(&mut self, id: InstrumentId) -> Result<Vec<DailyBar>, StoreError> {
                let mut bars = self.0.load_bars(id)?;
                bars.reverse();
                Ok(bars)
            }
            fn begin_batch(&mut self) -> Result<(), StoreError> {
                self.0.begin_batch()
            }
            fn update_indicators(
                &mut self,
                row: &indilab_core::IndicatorRow,
            ) -> Result<bool, StoreError> {
                self.0.update_indicators(row)
            }
            fn commit_batch(&mut self) -> Result<(), StoreError> {
                self.0.commit_batch()
            }
        }

        let inner = MemoryPool::new();
        let inst = Instrument::new(3, "REV", "Reversed");
        inner.insert_bars(&bars(3, 5)).unwrap();
        let outcome = process_instrument(
            &Reversed(inner.clone()),
            &engine(),
            &UpsertCoordinator::new(),
            &inst,
        );
        assert_eq!(outcome.label(), "failed");
        assert_eq!(inner.indicator_rows(InstrumentId(3)).unwrap()[0].defined_count(), 0);
    }
}
