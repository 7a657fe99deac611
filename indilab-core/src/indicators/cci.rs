//! Commodity Channel Index (CCI).
//!
//! tp = (high + low + close) / 3
//! CCI = (tp - SMA(tp, period)) / (0.015 * MAD(tp, period))
//! A zero mean absolute deviation leaves that bar undefined.
//! Lookback: period - 1.

use crate::domain::DailyBar;
use crate::indicator::{check_period, ensure_finite, typical_prices, Indicator, IndicatorError};
use crate::indicators::rolling::rolling_mad;
use crate::indicators::sma::sma_of_series;

/// Lambert's scaling constant.
pub const CCI_CONSTANT: f64 = 0.015;

#[derive(Debug, Clone)]
pub struct Cci {
    period: usize,
}

impl Cci {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("cci", period)?;
        Ok(Self { period })
    }
}

impl Indicator for Cci {
    fn name(&self) -> &str {
        "cci"
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        let tp = typical_prices(bars);
        let mean = sma_of_series(&tp, self.period);
        let mad = rolling_mad(&tp, self.period);

        let cci = tp
            .iter()
            .zip(mean.iter().zip(&mad))
            .map(|(&t, (&m, &d))| {
                if d == 0.0 {
                    f64::NAN
                } else {
                    (t - m) / (CCI_CONSTANT * d)
                }
            })
            .collect();
        ensure_finite("cci", cci)
    }
}
