//! Property tests for write-back over the in-memory store.

use chrono::NaiveDate;
use indilab_core::{DailyBar, EngineConfig, IndicatorEngine, Instrument, InstrumentId};
use indilab_runner::{Dispatcher, InstrumentOutcome, MemoryPool};
use proptest::prelude::*;

fn bars_from(id: InstrumentId, steps: &[(f64, Option<u64>)]) -> Vec<DailyBar> {
    let base = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
    let mut close = 40.0;
    steps
        .iter()
        .enumerate()
        .map(|(i, &(step, volume))| {
            let open = close;
            close = (close * (1.0 + step)).max(0.5);
            DailyBar {
                instrument_id: id,
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume,
            }
        })
        .collect()
}

fn history() -> impl Strategy<Value = Vec<(f64, Option<u64>)>> {
    prop::collection::vec((-0.05f64..0.05, prop::option::of(0u64..50_000)), 0..90)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn second_run_changes_nothing(a in history(), b in history()) {
        let pool = MemoryPool::new();
        for (id, steps) in [(1, &a), (2, &b)] {
            pool.add_instrument(Instrument::new(id, format!("P{id}"), "p")).unwrap();
            pool.insert_bars(&bars_from(InstrumentId(id), steps)).unwrap();
        }
        let engine = IndicatorEngine::new(EngineConfig::default(), None).unwrap();
        let dispatcher = Dispatcher::new(2);

        let first = dispatcher.run(&pool, &engine, None).unwrap();
        let after_first = (
            pool.indicator_rows(InstrumentId(1)).unwrap(),
            pool.indicator_rows(InstrumentId(2)).unwrap(),
        );
        let second = dispatcher.run(&pool, &engine, None).unwrap();

        prop_assert_eq!(&first.instruments, &second.instruments);
        prop_assert_eq!(pool.indicator_rows(InstrumentId(1)).unwrap(), after_first.0);
        prop_assert_eq!(pool.indicator_rows(InstrumentId(2)).unwrap(), after_first.1);
        prop_assert_eq!(pool.row_count().unwrap(), a.len() + b.len());
        prop_assert_eq!(first.failed, 0);
    }

    #[test]
    fn stored_rows_always_pass_the_guard_or_are_empty(steps in history()) {
        let pool = MemoryPool::new();
        pool.add_instrument(Instrument::new(5, "G", "g")).unwrap();
        pool.insert_bars(&bars_from(InstrumentId(5), &steps)).unwrap();
        let engine = IndicatorEngine::new(EngineConfig::default(), None).unwrap();

        let summary = Dispatcher::new(1).run(&pool, &engine, None).unwrap();
        let rows = pool.indicator_rows(InstrumentId(5)).unwrap();
        for row in &rows {
            prop_assert!(row.defined_count() == 0 || row.has_minimal_presence());
        }
        let written = rows.iter().filter(|r| r.defined_count() > 0).count();
        match &summary.instruments[0].outcome {
            InstrumentOutcome::Written { report, .. } => {
                prop_assert_eq!(report.written, written);
                prop_assert_eq!(report.written + report.skipped, steps.len());
            }
            InstrumentOutcome::Skipped => prop_assert!(steps.is_empty()),
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }
}
