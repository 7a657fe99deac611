//! Bounded parallel run over the instrument working set.
//!
//! One rayon task per instrument, each on its own store handle. Instruments
//! share nothing but the pool and the engine, so a failure or panic in one
//! task never reaches another.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use thiserror::Error;

use indilab_core::{IndicatorEngine, Instrument};

use crate::config::{DispatchConfig, DEFAULT_WORKERS};
use crate::pipeline::{process_instrument, InstrumentOutcome, InstrumentResult};
use crate::store::{select_instruments, BarStore, StoreError, StorePool};
use crate::summary::RunSummary;
use crate::upsert::UpsertCoordinator;

/// Errors that abort a whole run. Per-instrument failures never do.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("enumerate instruments: {0}")]
    Enumerate(#[source] StoreError),
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    workers: usize,
    codes: Vec<String>,
    coordinator: UpsertCoordinator,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Dispatcher {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            codes: Vec::new(),
            coordinator: UpsertCoordinator::new(),
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.workers).with_codes(config.codes.clone())
    }

    /// Only process instruments with these codes. Empty means all.
    pub fn with_codes(mut self, codes: Vec<String>) -> Self {
        self.codes = codes;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Enumerate the working set, then run every instrument.
    pub fn run<P: StorePool>(
        &self,
        pool: &P,
        engine: &IndicatorEngine,
        cancel: Option<&AtomicBool>,
    ) -> Result<RunSummary, DispatchError> {
        let all = pool
            .acquire()
            .and_then(|mut store| store.instruments())
            .map_err(DispatchError::Enumerate)?;
        let selected = select_instruments(all, &self.codes);
        self.run_instruments(pool, engine, selected, cancel)
    }

    /// Run an explicit working set. Duplicate ids are dropped, first wins.
    pub fn run_instruments<P: StorePool>(
        &self,
        pool: &P,
        engine: &IndicatorEngine,
        instruments: Vec<Instrument>,
        cancel: Option<&AtomicBool>,
    ) -> Result<RunSummary, DispatchError> {
        let working_set = dedupe(instruments);
        let tp = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("indilab-worker-{i}"))
            .build()?;

        tracing::info!(
            instruments = working_set.len(),
            workers = self.workers,
            "dispatch started"
        );

        let results: Vec<InstrumentResult> = tp.install(|| {
            working_set
                .par_iter()
                .map(|instrument| {
                    let outcome = if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                        InstrumentOutcome::Cancelled
                    } else {
                        self.guarded(pool, engine, instrument)
                    };
                    InstrumentResult {
                        instrument: instrument.clone(),
                        outcome,
                    }
                })
                .collect()
        });

        let summary = RunSummary::from_results(results);
        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            rows = summary.rows.written,
            "dispatch finished"
        );
        Ok(summary)
    }

    fn guarded<P: StorePool>(
        &self,
        pool: &P,
        engine: &IndicatorEngine,
        instrument: &Instrument,
    ) -> InstrumentOutcome {
        catch_unwind(AssertUnwindSafe(|| {
            process_instrument(pool, engine, &self.coordinator, instrument)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(instrument = %instrument, "task panicked: {message}");
            InstrumentOutcome::Failed {
                error: format!("panic: {message}"),
            }
        })
    }
}

fn dedupe(instruments: Vec<Instrument>) -> Vec<Instrument> {
    let mut seen = HashSet::new();
    instruments
        .into_iter()
        .filter(|i| {
            let first = seen.insert(i.id);
            if !first {
                tracing::warn!(instrument = %i, "duplicate in working set, dropped");
            }
            first
        })
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
