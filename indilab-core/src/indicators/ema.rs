//! Exponential moving average of closes, alpha = 2 / (period + 1).
//!
//! The recurrence starts from the first value and the first `period - 1`
//! outputs are masked, so the first defined index is `period - 1`. Also used
//! as the KAMA substitute.

use crate::domain::DailyBar;
use crate::indicator::{check_period, closes, ensure_finite, Indicator, IndicatorError};

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        let name = format!("ema_{period}");
        check_period(&name, period)?;
        Ok(Self { period, name })
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        ensure_finite(&self.name, ema_of_series(&closes(bars), self.period))
    }
}

/// EMA over a raw series.
///
/// A NaN ends the recurrence there, so a NaN among the first `period` values
/// leaves the output entirely NaN.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut ema = values[0];
    let mut reached = 0;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            break;
        }
        if i > 0 {
            ema += alpha * (v - ema);
        }
        reached = i + 1;
        out[i] = ema;
    }

    if reached < period {
        out.fill(f64::NAN);
    } else {
        out[..period - 1].fill(f64::NAN);
    }
    out
}
