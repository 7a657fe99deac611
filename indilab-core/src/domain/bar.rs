//! DailyBar: one trading day of OHLCV data for one instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::instrument::InstrumentId;

/// OHLCV bar keyed by `(instrument_id, date)`.
///
/// Prices may be NaN when the store holds NULL. Volume is optional because
/// some providers (indices, FX) never report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub instrument_id: InstrumentId,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

/// What is wrong with a bar's prices, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDefect {
    Missing,
    NonPositive,
    /// high below low, or open/close outside [low, high]
    OutOfRange,
}

impl DailyBar {
    pub fn price_defect(&self) -> Option<PriceDefect> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| p.is_nan()) {
            return Some(PriceDefect::Missing);
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Some(PriceDefect::NonPositive);
        }
        let range = self.low..=self.high;
        if self.high < self.low || !range.contains(&self.open) || !range.contains(&self.close) {
            return Some(PriceDefect::OutOfRange);
        }
        None
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Volume as f64, NaN when not reported.
    pub fn volume_f64(&self) -> f64 {
        self.volume.map_or(f64::NAN, |v| v as f64)
    }
}

/// Index of the first bar whose date is not strictly after its predecessor.
///
/// `None` means the sequence is strictly ascending, the precondition for
/// every recurrence in the indicator engine.
pub fn first_unordered(bars: &[DailyBar]) -> Option<usize> {
    bars.windows(2)
        .position(|w| w[1].date <= w[0].date)
        .map(|i| i + 1)
}
