//! Relative Strength Index on closes, Wilder-smoothed.
//!
//! Gains and losses are smoothed separately with [`wilder_smooth`]. The first
//! bar counts as a zero move, so the seed window is bars `0..period` and the
//! first value lands at index `period - 1`.

use super::atr::wilder_smooth;
use crate::domain::DailyBar;
use crate::indicator::{check_period, closes, ensure_finite, Indicator, IndicatorError};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("rsi", period)?;
        Ok(Self { period })
    }
}

/// Per-bar (gain, loss) of the close; both zero on the first bar.
fn split_changes(closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut gains = vec![f64::NAN; closes.len()];
    let mut losses = vec![f64::NAN; closes.len()];
    if closes.first().is_some_and(|c| !c.is_nan()) {
        gains[0] = 0.0;
        losses[0] = 0.0;
    }
    for (i, pair) in closes.windows(2).enumerate() {
        let change = pair[1] - pair[0];
        if change.is_nan() {
            continue;
        }
        gains[i + 1] = change.max(0.0);
        losses[i + 1] = (-change).max(0.0);
    }
    (gains, losses)
}

fn strength(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        // flat window
        (true, true) => 50.0,
        (false, true) => 100.0,
        (true, false) => 0.0,
        (false, false) => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        let (gains, losses) = split_changes(&closes(bars));
        let avg_gain = wilder_smooth(&gains, self.period);
        let avg_loss = wilder_smooth(&losses, self.period);
        let series = avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| {
                if g.is_nan() || l.is_nan() {
                    f64::NAN
                } else {
                    strength(g, l)
                }
            })
            .collect();
        ensure_finite(self.name(), series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    fn rsi3(closes: &[f64]) -> Vec<f64> {
        Rsi::new(3).unwrap().compute(&make_bars(closes)).unwrap()
    }

    #[test]
    fn monotone_closes_hit_the_bounds() {
        assert_approx(rsi3(&[100.0, 101.0, 102.0, 103.0, 104.0])[2], 100.0, 1e-9);
        assert_approx(rsi3(&[105.0, 104.0, 103.0, 102.0, 101.0])[2], 0.0, 1e-9);
    }

    #[test]
    fn seed_then_wilder_step() {
        // moves: 0 (first bar), +0.34, -0.25, -0.48, +0.72
        let result = rsi3(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        assert!(result[..2].iter().all(|v| v.is_nan()));
        assert_approx(result[2], 100.0 - 100.0 / (1.0 + 0.34 / 0.25), 1e-9);

        let gain = (0.34 / 3.0) * (2.0 / 3.0);
        let loss = (0.25 / 3.0) * (2.0 / 3.0) + 0.48 / 3.0;
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + gain / loss), 1e-9);

        let gain = gain * (2.0 / 3.0) + 0.72 / 3.0;
        let loss = loss * (2.0 / 3.0);
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + gain / loss), 1e-9);
    }

    #[test]
    fn flat_prices_read_fifty() {
        let result = rsi3(&[50.0; 6]);
        assert_approx(result[2], 50.0, 1e-9);
        assert_approx(result[5], 50.0, 1e-9);
    }

    #[test]
    fn stays_within_bounds() {
        let result = rsi3(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        for (i, v) in result.iter().enumerate().filter(|(_, v)| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v), "rsi out of bounds at bar {i}: {v}");
        }
    }

    #[test]
    fn nan_close_breaks_every_seed_window() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        bars[2].close = f64::NAN;
        let result = Rsi::new(3).unwrap().compute(&bars).unwrap();
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn first_value_one_bar_before_period() {
        assert_eq!(Rsi::new(14).unwrap().lookback(), 13);
        assert!(Rsi::new(0).is_err());
    }
}
