//! Donchian Channel: highest high / lowest low over a lookback window.
//!
//! Produces two series (exposed as separate Indicator instances):
//! - Upper: max(high[t-period+1..=t])
//! - Lower: min(low[t-period+1..=t])
//!
//! Lookback: period - 1.

use crate::domain::DailyBar;
use crate::indicator::{check_period, ensure_finite, Indicator, IndicatorError};
use crate::indicators::rolling::{rolling_max, rolling_min};

/// Which band of the Donchian channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: &'static str,
}

impl Donchian {
    pub fn upper(period: usize) -> Result<Self, IndicatorError> {
        Self::new(period, DonchianBand::Upper, "dc_upper")
    }

    pub fn lower(period: usize) -> Result<Self, IndicatorError> {
        Self::new(period, DonchianBand::Lower, "dc_lower")
    }

    fn new(period: usize, band: DonchianBand, name: &'static str) -> Result<Self, IndicatorError> {
        check_period(name, period)?;
        Ok(Self { period, band, name })
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        let values = match self.band {
            DonchianBand::Upper => {
                let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
                rolling_max(&highs, self.period)
            }
            DonchianBand::Lower => {
                let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
                rolling_min(&lows, self.period)
            }
        };
        ensure_finite(self.name, values)
    }
}
