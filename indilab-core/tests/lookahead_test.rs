//! Look-ahead contamination tests for every indicator column.
//!
//! No indicator value at bar t may depend on price data from bar t+1 or later.
//!
//! Method: compute on truncated series (bars 0..100) and full series (bars 0..200).
//! Assert bars 0..100 are identical between both runs. Any difference means the
//! indicator is leaking future data into past values.

use chrono::NaiveDate;
use indilab_core::domain::{DailyBar, InstrumentId};
use indilab_core::indicator::Indicator;
use indilab_core::indicators::*;
use indilab_core::{EngineConfig, IndicatorColumn, IndicatorEngine};

/// Generate N bars of synthetic OHLCV data with realistic variation.
fn make_test_bars(n: usize) -> Vec<DailyBar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(DailyBar {
            instrument_id: InstrumentId(1),
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: Some(1000 + (i as u64 * 100)),
        });
    }

    bars
}

fn assert_prefix_equal(name: &str, truncated: &[f64], full: &[f64]) {
    for (i, (&t, &f)) in truncated.iter().zip(full).enumerate() {
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[DailyBar], truncated_len: usize) {
    let full = indicator.compute(full_bars).unwrap();
    let truncated = indicator.compute(&full_bars[..truncated_len]).unwrap();
    assert_eq!(truncated.len(), truncated_len, "{}", indicator.name());
    assert_eq!(full.len(), full_bars.len(), "{}", indicator.name());
    assert_prefix_equal(indicator.name(), &truncated, &full);
}

#[test]
fn lookahead_moving_averages() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Sma::new(21).unwrap(), &bars, 100);
    assert_no_lookahead(&Ema::new(21).unwrap(), &bars, 100);
}

#[test]
fn lookahead_channels() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Donchian::upper(20).unwrap(), &bars, 100);
    assert_no_lookahead(&Donchian::lower(20).unwrap(), &bars, 100);
    assert_no_lookahead(&RollingExtreme::high(55).unwrap(), &bars, 100);
    assert_no_lookahead(&Bollinger::upper(20, 2.0).unwrap(), &bars, 100);
}

#[test]
fn lookahead_oscillators() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14).unwrap(), &bars, 100);
    assert_no_lookahead(&Cci::new(20).unwrap(), &bars, 100);
    assert_no_lookahead(&Mfi::new(14).unwrap(), &bars, 100);
    assert_no_lookahead(&Atr::new(14).unwrap(), &bars, 100);
    assert_no_lookahead(&Vwap::new(14).unwrap(), &bars, 100);
    assert_no_lookahead(&Adx::new(14, DirectionalLine::Adx).unwrap(), &bars, 100);
}

#[test]
fn lookahead_full_engine() {
    let bars = make_test_bars(200);
    let engine = IndicatorEngine::new(EngineConfig::default(), None).unwrap();
    let full = engine.compute(&bars).unwrap();
    let truncated = engine.compute(&bars[..100]).unwrap();

    assert_eq!(full.kama_tier(), truncated.kama_tier());
    for column in IndicatorColumn::ALL {
        assert_prefix_equal(column.name(), truncated.series(column), full.series(column));
    }
}
