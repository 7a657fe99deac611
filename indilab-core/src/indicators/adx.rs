//! Directional movement: +DI, -DI and ADX (Wilder).
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Smooth +DM, -DM, and TR using Wilder smoothing (alpha = 1/period)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = Wilder-smoothed DX
//!
//! The three lines share every intermediate, so [`directional_movement`]
//! computes them together. [`Adx`] exposes one line through the
//! `Indicator` trait.
//!
//! Lookback: period for the DI lines, 2 * period - 1 for ADX.

use crate::domain::DailyBar;
use crate::indicator::{check_period, ensure_finite, Indicator, IndicatorError};
use crate::indicators::atr::{true_range, wilder_smooth};

/// One output line of the directional movement system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionalLine {
    PlusDi,
    MinusDi,
    Adx,
}

impl DirectionalLine {
    pub fn name(self) -> &'static str {
        match self {
            DirectionalLine::PlusDi => "plus_di",
            DirectionalLine::MinusDi => "minus_di",
            DirectionalLine::Adx => "adx",
        }
    }
}

/// All three directional lines, aligned to the input bars.
#[derive(Debug, Clone)]
pub struct DirectionalSeries {
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub adx: Vec<f64>,
}

impl DirectionalSeries {
    pub fn line(&self, line: DirectionalLine) -> &[f64] {
        match line {
            DirectionalLine::PlusDi => &self.plus_di,
            DirectionalLine::MinusDi => &self.minus_di,
            DirectionalLine::Adx => &self.adx,
        }
    }
}

/// Compute +DI, -DI and ADX in one pass.
///
/// A zero smoothed true range leaves DI undefined at that bar.
pub fn directional_movement(
    bars: &[DailyBar],
    period: usize,
) -> Result<DirectionalSeries, IndicatorError> {
    check_period("adx", period)?;
    let n = bars.len();

    // Step 1: +DM and -DM
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for i in 1..n {
        let high_diff = bars[i].high - bars[i - 1].high;
        let low_diff = bars[i - 1].low - bars[i].low;

        if high_diff.is_nan() || low_diff.is_nan() {
            continue;
        }

        plus_dm[i] = if high_diff > low_diff && high_diff > 0.0 {
            high_diff
        } else {
            0.0
        };
        minus_dm[i] = if low_diff > high_diff && low_diff > 0.0 {
            low_diff
        } else {
            0.0
        };
    }

    // Step 2: Wilder smooth +DM, -DM, and TR. TR is aligned with the DM
    // series, which start at bar 1.
    let mut tr = true_range(bars);
    if let Some(first) = tr.first_mut() {
        *first = f64::NAN;
    }
    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus_dm = wilder_smooth(&plus_dm, period);
    let smooth_minus_dm = wilder_smooth(&minus_dm, period);

    // Steps 3-5: DI lines and DX
    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if smooth_tr[i].is_nan()
            || smooth_plus_dm[i].is_nan()
            || smooth_minus_dm[i].is_nan()
            || smooth_tr[i] == 0.0
        {
            continue;
        }

        let p = 100.0 * smooth_plus_dm[i] / smooth_tr[i];
        let m = 100.0 * smooth_minus_dm[i] / smooth_tr[i];
        plus_di[i] = p;
        minus_di[i] = m;

        let di_sum = p + m;
        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (p - m).abs() / di_sum
        };
    }

    // Step 6: Wilder smooth DX to get ADX
    let adx = wilder_smooth(&dx, period);

    Ok(DirectionalSeries {
        plus_di: ensure_finite("plus_di", plus_di)?,
        minus_di: ensure_finite("minus_di", minus_di)?,
        adx: ensure_finite("adx", adx)?,
    })
}

/// A single directional line as a standalone indicator.
#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    line: DirectionalLine,
}

impl Adx {
    pub fn new(period: usize, line: DirectionalLine) -> Result<Self, IndicatorError> {
        check_period(line.name(), period)?;
        Ok(Self { period, line })
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        self.line.name()
    }

    fn lookback(&self) -> usize {
        match self.line {
            DirectionalLine::PlusDi | DirectionalLine::MinusDi => self.period,
            DirectionalLine::Adx => 2 * self.period - 1,
        }
    }

    fn compute(&self, bars: &[DailyBar]) -> Result<Vec<f64>, IndicatorError> {
        let series = directional_movement(bars, self.period)?;
        Ok(series.line(self.line).to_vec())
    }
}
