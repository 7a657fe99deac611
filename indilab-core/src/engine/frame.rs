//! Computed indicator series for one instrument.

use serde::{Deserialize, Serialize};

use crate::domain::{DailyBar, IndicatorRow};
use crate::indicator::IndicatorError;
use crate::kama::KamaTier;
use crate::schema::{IndicatorColumn, INDICATOR_COLUMN_COUNT};

/// A set of columns that are computed together and fail together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorGroup {
    RollingExtremes,
    MovingAverages,
    Directional,
    Cci,
    Rsi,
    Kama,
    Donchian,
    Vwap,
    Atr,
    Bollinger,
    Mfi,
}

impl IndicatorGroup {
    pub fn name(self) -> &'static str {
        match self {
            IndicatorGroup::RollingExtremes => "rolling_extremes",
            IndicatorGroup::MovingAverages => "moving_averages",
            IndicatorGroup::Directional => "directional",
            IndicatorGroup::Cci => "cci",
            IndicatorGroup::Rsi => "rsi",
            IndicatorGroup::Kama => "kama",
            IndicatorGroup::Donchian => "donchian",
            IndicatorGroup::Vwap => "vwap",
            IndicatorGroup::Atr => "atr",
            IndicatorGroup::Bollinger => "bollinger",
            IndicatorGroup::Mfi => "mfi",
        }
    }
}

/// A group whose computation returned an error. Its columns are undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub group: IndicatorGroup,
    pub error: IndicatorError,
}

/// Whether the instrument's volume could feed vwap and mfi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStatus {
    Usable,
    /// No bar carries a positive volume; vwap and mfi stay undefined.
    Unusable,
}

/// Aligned indicator series for one instrument's bar history.
///
/// Every series has the same length as the input bars. NaN is undefined.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    len: usize,
    series: Vec<Vec<f64>>,
    failures: Vec<GroupFailure>,
    volume_status: VolumeStatus,
    kama_tier: Option<KamaTier>,
}

impl IndicatorFrame {
    /// A frame of `len` bars with every column undefined.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            series: vec![vec![f64::NAN; len]; INDICATOR_COLUMN_COUNT],
            failures: Vec::new(),
            volume_status: VolumeStatus::Usable,
            kama_tier: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn insert(&mut self, column: IndicatorColumn, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.len, "{column} length mismatch");
        self.series[column.index()] = values;
    }

    pub(crate) fn record_failure(&mut self, group: IndicatorGroup, error: IndicatorError) {
        self.failures.push(GroupFailure { group, error });
    }

    pub(crate) fn set_volume_status(&mut self, status: VolumeStatus) {
        self.volume_status = status;
    }

    pub(crate) fn set_kama_tier(&mut self, tier: Option<KamaTier>) {
        self.kama_tier = tier;
    }

    pub fn series(&self, column: IndicatorColumn) -> &[f64] {
        &self.series[column.index()]
    }

    /// Value at a bar index; `None` when out of bounds.
    pub fn get(&self, column: IndicatorColumn, bar_index: usize) -> Option<f64> {
        self.series[column.index()].get(bar_index).copied()
    }

    pub fn failures(&self) -> &[GroupFailure] {
        &self.failures
    }

    pub fn volume_status(&self) -> VolumeStatus {
        self.volume_status
    }

    /// The KAMA strategy that produced the kama column; `None` when the
    /// EMA substitute was used.
    pub fn kama_tier(&self) -> Option<KamaTier> {
        self.kama_tier
    }

    /// One row per bar, keyed by the bar's (instrument, date).
    pub fn to_rows(&self, bars: &[DailyBar]) -> Vec<IndicatorRow> {
        debug_assert_eq!(bars.len(), self.len);
        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                let mut row = IndicatorRow::empty(bar.instrument_id, bar.date);
                for column in IndicatorColumn::ALL {
                    row.set(column, self.series[column.index()][i]);
                }
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn new_frame_is_undefined() {
        let frame = IndicatorFrame::new(3);
        assert_eq!(frame.len(), 3);
        for column in IndicatorColumn::ALL {
            assert!(frame.series(column).iter().all(|v| v.is_nan()));
        }
        assert_eq!(frame.get(IndicatorColumn::Rsi, 3), None);
    }

    #[test]
    fn to_rows_maps_nan_to_none() {
        let bars = make_bars(&[1.0, 2.0]);
        let mut frame = IndicatorFrame::new(2);
        frame.insert(IndicatorColumn::Sma8, vec![f64::NAN, 1.5]);
        let rows = frame.to_rows(&bars);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(IndicatorColumn::Sma8), None);
        assert_eq!(rows[1].get(IndicatorColumn::Sma8), Some(1.5));
        assert_eq!(rows[1].date, bars[1].date);
        assert_eq!(rows[1].instrument_id, bars[1].instrument_id);
    }
}
