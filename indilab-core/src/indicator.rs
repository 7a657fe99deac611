//! Indicator trait and the typed failure every indicator may return.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! Insufficient history is not an error, it is `f64::NAN` in the output.
//! An `Err` means the computation itself broke down on this input.

use thiserror::Error;

use crate::domain::DailyBar;

/// A computation fault inside one indicator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("{indicator}: non-finite value at bar {index}")]
    NonFinite { indicator: String, index: usize },

    #[error("{indicator}: period must be >= 1")]
    InvalidPeriod { indicator: String },

    #[error("{indicator}: produced {actual} values for {expected} bars")]
    LengthMismatch {
        indicator: String,
        expected: usize,
        actual: usize,
    },

    #[error("{indicator}: no strategy produced a defined value")]
    Exhausted { indicator: String },
}

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_21", "atr_14").
    fn name(&self) -> &str;

    /// Index of the first bar that can carry a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError>;
}

/// Reject a series containing an infinity.
///
/// NaN is the undefined marker and passes; ±inf only comes out of a
/// division by zero or an overflow, which is a fault.
pub fn ensure_finite(indicator: &str, values: Vec<f64>) -> Result<Vec<f64>, IndicatorError> {
    match values.iter().position(|v| v.is_infinite()) {
        Some(index) => Err(IndicatorError::NonFinite {
            indicator: indicator.to_string(),
            index,
        }),
        None => Ok(values),
    }
}

pub(crate) fn check_period(indicator: &str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod {
            indicator: indicator.to_string(),
        });
    }
    Ok(())
}

/// Close prices of a bar slice.
pub fn closes(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Typical prices of a bar slice.
pub fn typical_prices(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.typical_price()).collect()
}
