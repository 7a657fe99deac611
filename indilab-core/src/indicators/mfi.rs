//! Money Flow Index (MFI).
//!
//! Raw money flow = tp · volume, signed by the direction of the typical
//! price against the previous bar (unchanged tp contributes nothing).
//! MFI = 100 - 100 / (1 + positive_flow / negative_flow) over `period` bars.
//!
//! Edge cases: negative flow 0 with positive flow → 100; no flow at all →
//! undefined.
//! The first bar has no direction and contributes zero flow to both sides.
//! Lookback: period - 1.

use crate::domain::DailyBar;
use crate::indicator::{check_period, ensure_finite, typical_prices, Indicator, IndicatorError};
use crate::indicators::rolling::rolling_sum;

#[derive(Debug, Clone)]
pub struct Mfi {
    period: usize,
}

impl Mfi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("mfi", period)?;
        Ok(Self { period })
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &str {
        "mfi"
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        let n = bars.len();
        let tp = typical_prices(bars);

        let mut positive = vec![f64::NAN; n];
        let mut negative = vec![f64::NAN; n];
        if let Some(first) = bars.first() {
            if !(tp[0] * first.volume_f64()).is_nan() {
                positive[0] = 0.0;
                negative[0] = 0.0;
            }
        }
        for i in 1..n {
            let flow = tp[i] * bars[i].volume_f64();
            if flow.is_nan() || tp[i - 1].is_nan() {
                continue;
            }
            let (p, m) = if tp[i] > tp[i - 1] {
                (flow, 0.0)
            } else if tp[i] < tp[i - 1] {
                (0.0, flow)
            } else {
                (0.0, 0.0)
            };
            positive[i] = p;
            negative[i] = m;
        }

        let pos = rolling_sum(&positive, self.period);
        let neg = rolling_sum(&negative, self.period);

        let mfi = pos
            .iter()
            .zip(&neg)
            .map(|(&p, &m)| {
                if p.is_nan() || m.is_nan() || (p == 0.0 && m == 0.0) {
                    f64::NAN
                } else if m == 0.0 {
                    100.0
                } else {
                    100.0 - 100.0 / (1.0 + p / m)
                }
            })
            .collect();
        ensure_finite("mfi", mfi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn mfi_rising_is_hundred() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Mfi::new(3).unwrap().compute(&bars).unwrap();
        assert!(result[..2].iter().all(|v| v.is_nan()));
        assert_approx(result[2], 100.0, DEFAULT_EPSILON);
        assert_approx(result[3], 100.0, DEFAULT_EPSILON);
        assert_approx(result[4], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn mfi_known_split() {
        // tp: 10, 20, 10 with equal volume → +20000, -10000
        let bars = make_ohlc_bars(&[
            (10.0, 10.0, 10.0, 10.0),
            (20.0, 20.0, 20.0, 20.0),
            (10.0, 10.0, 10.0, 10.0),
        ]);
        let result = Mfi::new(2).unwrap().compute(&bars).unwrap();
        // window 0..2 holds only the up move
        assert_approx(result[1], 100.0, 1e-9);
        assert_approx(result[2], 100.0 - 100.0 / 3.0, 1e-9);
    }

    #[test]
    fn first_value_one_bar_before_period() {
        assert_eq!(Mfi::new(14).unwrap().lookback(), 13);
        let bars = make_bars(&[10.0, 11.0, 10.5, 12.0]);
        let result = Mfi::new(3).unwrap().compute(&bars).unwrap();
        assert!(!result[2].is_nan());
    }

    #[test]
    fn mfi_flat_prices_undefined() {
        let bars = make_ohlc_bars(&[(5.0, 5.0, 5.0, 5.0); 5]);
        let result = Mfi::new(2).unwrap().compute(&bars).unwrap();
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn mfi_bounded() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Mfi::new(3).unwrap().compute(&bars).unwrap();
        for v in result.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }
}
