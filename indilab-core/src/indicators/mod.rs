//! Concrete indicator implementations.
//!
//! Every indicator implements the [`Indicator`](crate::indicator::Indicator)
//! trait. Multi-series indicators (Donchian, Bollinger, directional movement)
//! are exposed as separate named instances per line, keeping the
//! single-series trait unchanged. The `*_of_series` helpers work on raw
//! `f64` slices and are shared by composed indicators.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod donchian;
pub mod ema;
pub mod mfi;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod vwap;

pub use adx::{directional_movement, Adx, DirectionalLine, DirectionalSeries};
pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use cci::Cci;
pub use donchian::{Donchian, DonchianBand};
pub use ema::Ema;
pub use mfi::Mfi;
pub use rolling::{RollingExtreme, RollingSide};
pub use rsi::Rsi;
pub use sma::Sma;
pub use vwap::Vwap;

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::DailyBar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Create bars from explicit (open, high, low, close) tuples, volume = 1000.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::DailyBar> {
    use crate::domain::{DailyBar, InstrumentId};
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| DailyBar {
            instrument_id: InstrumentId(1),
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: Some(1000),
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
