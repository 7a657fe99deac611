//! Rolling Volume-Weighted Average Price.
//!
//! VWAP[t] = Σ(tp · volume) / Σ volume over the trailing `period` bars,
//! tp = (high + low + close) / 3. A bar without volume makes every window
//! containing it undefined, and so does a zero volume sum.
//! Lookback: period - 1.

use crate::domain::DailyBar;
use crate::indicator::{check_period, ensure_finite, Indicator, IndicatorError};
use crate::indicators::rolling::rolling_sum;

#[derive(Debug, Clone)]
pub struct Vwap {
    period: usize,
}

impl Vwap {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("vwap", period)?;
        Ok(Self { period })
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        let volume: Vec<f64> = bars.iter().map(DailyBar::volume_f64).collect();
        let weighted: Vec<f64> = bars
            .iter()
            .zip(&volume)
            .map(|(b, v)| b.typical_price() * v)
            .collect();

        let num = rolling_sum(&weighted, self.period);
        let den = rolling_sum(&volume, self.period);

        let vwap = num
            .iter()
            .zip(&den)
            .map(|(&n, &d)| if d == 0.0 { f64::NAN } else { n / d })
            .collect();
        ensure_finite("vwap", vwap)
    }
}
