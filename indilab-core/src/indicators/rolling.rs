//! Rolling window primitives and the rolling close extremes (high_w / low_w).
//!
//! Every helper returns a series the length of its input with NaN for the
//! first `window - 1` entries and for any window that contains a NaN.

use crate::domain::DailyBar;
use crate::indicator::{check_period, closes, ensure_finite, Indicator, IndicatorError};

/// Which extreme of the trailing window to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingSide {
    High,
    Low,
}

/// Highest or lowest close over a trailing window.
#[derive(Debug, Clone)]
pub struct RollingExtreme {
    window: usize,
    side: RollingSide,
    name: String,
}

impl RollingExtreme {
    pub fn high(window: usize) -> Result<Self, IndicatorError> {
        Self::new(window, RollingSide::High)
    }

    pub fn low(window: usize) -> Result<Self, IndicatorError> {
        Self::new(window, RollingSide::Low)
    }

    fn new(window: usize, side: RollingSide) -> Result<Self, IndicatorError> {
        let name = match side {
            RollingSide::High => format!("high_{window}"),
            RollingSide::Low => format!("low_{window}"),
        };
        check_period(&name, window)?;
        Ok(Self { window, side, name })
    }

    pub fn side(&self) -> RollingSide {
        self.side
    }
}

impl Indicator for RollingExtreme {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        let closes = closes(bars);
        let values = match self.side {
            RollingSide::High => rolling_max(&closes, self.window),
            RollingSide::Low => rolling_min(&closes, self.window),
        };
        ensure_finite(&self.name, values)
    }
}

fn rolling_fold(values: &[f64], window: usize, fold: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < window || window == 0 {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = fold(slice);
    }

    result
}

/// Trailing maximum.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_fold(values, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Trailing minimum.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_fold(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Trailing standard deviation with `ddof` delta degrees of freedom
/// (0 = population, 1 = sample). Undefined when `window <= ddof`.
pub fn rolling_std(values: &[f64], window: usize, ddof: usize) -> Vec<f64> {
    if window <= ddof {
        return vec![f64::NAN; values.len()];
    }
    rolling_fold(values, window, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let ss: f64 = w.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (w.len() - ddof) as f64).sqrt()
    })
}

/// Trailing mean absolute deviation around the window mean.
pub fn rolling_mad(values: &[f64], window: usize) -> Vec<f64> {
    rolling_fold(values, window, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        w.iter().map(|v| (v - mean).abs()).sum::<f64>() / w.len() as f64
    })
}

/// Trailing sum.
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    rolling_fold(values, window, |w| w.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rolling_high_low_on_close() {
        let bars = make_bars(&[10.0, 14.0, 12.0, 9.0, 11.0]);
        let high = RollingExtreme::high(3).unwrap().compute(&bars).unwrap();
        let low = RollingExtreme::low(3).unwrap().compute(&bars).unwrap();

        assert!(high[0].is_nan() && high[1].is_nan());
        assert_approx(high[2], 14.0, DEFAULT_EPSILON);
        assert_approx(high[3], 14.0, DEFAULT_EPSILON);
        assert_approx(high[4], 12.0, DEFAULT_EPSILON);
        assert_approx(low[2], 10.0, DEFAULT_EPSILON);
        assert_approx(low[3], 9.0, DEFAULT_EPSILON);
        assert_approx(low[4], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_names_match_columns() {
        assert_eq!(RollingExtreme::high(55).unwrap().name(), "high_55");
        assert_eq!(RollingExtreme::low(100).unwrap().name(), "low_100");
        assert_eq!(RollingExtreme::low(100).unwrap().lookback(), 99);
    }

    #[test]
    fn rolling_nan_in_window() {
        let values = [1.0, f64::NAN, 3.0, 4.0, 5.0];
        let result = rolling_max(&values, 2);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_std_sample_and_population() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let pop = rolling_std(&values, 8, 0);
        let sample = rolling_std(&values, 8, 1);
        assert_approx(pop[7], 2.0, DEFAULT_EPSILON);
        assert_approx(sample[7], (32.0_f64 / 7.0).sqrt(), DEFAULT_EPSILON);
        assert!(rolling_std(&values, 1, 1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_mad_known() {
        // mean 2, deviations 1, 0, 1
        let result = rolling_mad(&[1.0, 2.0, 3.0], 3);
        assert_approx(result[2], 2.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_zero_window_rejected() {
        assert!(RollingExtreme::high(0).is_err());
    }
}
