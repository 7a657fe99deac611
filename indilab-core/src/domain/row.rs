//! IndicatorRow: the computed fields for one `(instrument_id, date)` key.

use chrono::NaiveDate;

use super::instrument::InstrumentId;
use crate::schema::{IndicatorColumn, INDICATOR_COLUMN_COUNT};

/// Sparse augmentation of a [`DailyBar`](super::DailyBar) with the same key.
///
/// `None` means undefined and is stored as NULL. Non-finite values never
/// make it into a row.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub instrument_id: InstrumentId,
    pub date: NaiveDate,
    values: [Option<f64>; INDICATOR_COLUMN_COUNT],
}

impl IndicatorRow {
    /// A row with every field undefined.
    pub fn empty(instrument_id: InstrumentId, date: NaiveDate) -> Self {
        Self {
            instrument_id,
            date,
            values: [None; INDICATOR_COLUMN_COUNT],
        }
    }

    pub fn get(&self, column: IndicatorColumn) -> Option<f64> {
        self.values[column.index()]
    }

    /// Set a field from a raw series value; NaN and infinities become `None`.
    pub fn set(&mut self, column: IndicatorColumn, value: f64) {
        self.values[column.index()] = value.is_finite().then_some(value);
    }

    /// Field values in [`IndicatorColumn::ALL`] order.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// At least one of sma_21, ema_21, rsi, kama, adx is defined.
    pub fn has_minimal_presence(&self) -> bool {
        IndicatorColumn::MINIMAL_PRESENCE
            .iter()
            .any(|c| self.get(*c).is_some())
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}
