//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use crate::domain::DailyBar;
use crate::indicator::{check_period, closes, ensure_finite, Indicator, IndicatorError};
use crate::indicators::rolling::rolling_std;
use crate::indicators::sma::sma_of_series;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: &'static str,
}

impl Bollinger {
    pub fn upper(period: usize, multiplier: f64) -> Result<Self, IndicatorError> {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Result<Self, IndicatorError> {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Result<Self, IndicatorError> {
        Self::new(period, multiplier, BollingerBand::Lower)
    }

    fn new(period: usize, multiplier: f64, band: BollingerBand) -> Result<Self, IndicatorError> {
        let name = match band {
            BollingerBand::Upper => "bb_upper",
            BollingerBand::Middle => "bb_middle",
            BollingerBand::Lower => "bb_lower",
        };
        check_period(name, period)?;
        Ok(Self {
            period,
            multiplier,
            band,
            name,
        })
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        let closes = closes(bars);
        let middle = sma_of_series(&closes, self.period);

        let sign = match self.band {
            BollingerBand::Middle => return ensure_finite(self.name, middle),
            BollingerBand::Upper => 1.0,
            BollingerBand::Lower => -1.0,
        };

        let stddev = rolling_std(&closes, self.period, 0);
        let band = middle
            .iter()
            .zip(&stddev)
            .map(|(m, s)| m + sign * self.multiplier * s)
            .collect();
        ensure_finite(self.name, band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bollinger_middle_is_sma() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Bollinger::middle(3, 2.0).unwrap().compute(&bars).unwrap();

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_known_width() {
        // Window [10, 11, 12]: population variance = 2/3
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let upper = Bollinger::upper(3, 2.0).unwrap().compute(&bars).unwrap();
        assert_approx(upper[2], 11.0 + 2.0 * (2.0_f64 / 3.0).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_bands_symmetric() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let upper = Bollinger::upper(3, 2.0).unwrap().compute(&bars).unwrap();
        let middle = Bollinger::middle(3, 2.0).unwrap().compute(&bars).unwrap();
        let lower = Bollinger::lower(3, 2.0).unwrap().compute(&bars).unwrap();

        for i in 2..5 {
            let half_width = upper[i] - middle[i];
            assert_approx(middle[i] - lower[i], half_width, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bollinger_constant_price_zero_width() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let upper = Bollinger::upper(3, 2.0).unwrap().compute(&bars).unwrap();
        let lower = Bollinger::lower(3, 2.0).unwrap().compute(&bars).unwrap();

        assert_approx(upper[2], 100.0, DEFAULT_EPSILON);
        assert_approx(lower[2], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_nan_propagation() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        bars[2].close = f64::NAN;
        let result = Bollinger::upper(3, 2.0).unwrap().compute(&bars).unwrap();
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn bollinger_lookback() {
        assert_eq!(Bollinger::upper(20, 2.0).unwrap().lookback(), 19);
    }
}
