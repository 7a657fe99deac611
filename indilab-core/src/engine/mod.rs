//! Indicator engine: one instrument's ordered bars in, a full
//! [`IndicatorFrame`] out.
//!
//! Groups are computed independently. A group that returns an error leaves
//! its columns undefined and is recorded on the frame; the others are not
//! affected. Insufficient history is never an error.

pub mod config;
pub mod frame;

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{first_unordered, DailyBar, InstrumentId};
use crate::indicator::{closes, Indicator, IndicatorError};
use crate::indicators::{
    directional_movement, Atr, Bollinger, Cci, Donchian, Ema, Mfi, RollingExtreme, Rsi, Sma, Vwap,
};
use crate::indicators::ema::ema_of_series;
use crate::kama::{AdaptiveAverage, KamaCalculator, KamaTier};
use crate::schema::{IndicatorColumn, EXTREME_WINDOWS, MA_PERIODS};

pub use config::EngineConfig;
pub use frame::{GroupFailure, IndicatorFrame, IndicatorGroup, VolumeStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("instrument {instrument}: bar {index} dated {date} is not after its predecessor")]
    UnorderedBars {
        instrument: InstrumentId,
        index: usize,
        date: NaiveDate,
    },

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

impl From<IndicatorError> for EngineError {
    fn from(err: IndicatorError) -> Self {
        EngineError::InvalidConfig(err.to_string())
    }
}

type Columns = Vec<(IndicatorColumn, Vec<f64>)>;

/// Computes the full indicator battery for an instrument.
///
/// Built once per run and shared across workers.
#[derive(Debug)]
pub struct IndicatorEngine {
    config: EngineConfig,
    extremes: Vec<(IndicatorColumn, RollingExtreme)>,
    sma: Vec<(IndicatorColumn, Sma)>,
    ema: Vec<(IndicatorColumn, Ema)>,
    cci: Cci,
    rsi: Rsi,
    dc_upper: Donchian,
    dc_lower: Donchian,
    vwap: Vwap,
    atr: Atr,
    bb_middle: Bollinger,
    bb_upper: Bollinger,
    bb_lower: Bollinger,
    mfi: Mfi,
    kama: KamaCalculator,
}

impl IndicatorEngine {
    pub fn new(
        config: EngineConfig,
        external_kama: Option<Arc<dyn AdaptiveAverage>>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let mut extremes = Vec::with_capacity(EXTREME_WINDOWS.len() * 2);
        for w in EXTREME_WINDOWS {
            extremes.push((column(IndicatorColumn::rolling_high(w))?, RollingExtreme::high(w)?));
            extremes.push((column(IndicatorColumn::rolling_low(w))?, RollingExtreme::low(w)?));
        }

        let mut sma = Vec::with_capacity(MA_PERIODS.len());
        let mut ema = Vec::with_capacity(MA_PERIODS.len());
        for p in MA_PERIODS {
            sma.push((column(IndicatorColumn::sma(p))?, Sma::new(p)?));
            ema.push((column(IndicatorColumn::ema(p))?, Ema::new(p)?));
        }

        let bb = config.bollinger_period;
        let mult = config.bollinger_mult;

        Ok(Self {
            extremes,
            sma,
            ema,
            cci: Cci::new(config.cci_period)?,
            rsi: Rsi::new(config.rsi_period)?,
            dc_upper: Donchian::upper(config.donchian_period)?,
            dc_lower: Donchian::lower(config.donchian_period)?,
            vwap: Vwap::new(config.vwap_period)?,
            atr: Atr::new(config.atr_period)?,
            bb_middle: Bollinger::middle(bb, mult)?,
            bb_upper: Bollinger::upper(bb, mult)?,
            bb_lower: Bollinger::lower(bb, mult)?,
            mfi: Mfi::new(config.mfi_period)?,
            kama: KamaCalculator::new(config.kama, external_kama)?,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn kama_tiers(&self) -> Vec<KamaTier> {
        self.kama.tiers()
    }

    /// Index of the first bar that can carry a defined value for `column`.
    pub fn lookback(&self, column: IndicatorColumn) -> usize {
        if let Some((_, ind)) = self.extremes.iter().find(|(c, _)| *c == column) {
            return ind.lookback();
        }
        if let Some((_, ind)) = self.sma.iter().find(|(c, _)| *c == column) {
            return ind.lookback();
        }
        if let Some((_, ind)) = self.ema.iter().find(|(c, _)| *c == column) {
            return ind.lookback();
        }
        match column {
            IndicatorColumn::PlusDi | IndicatorColumn::MinusDi => self.config.adx_period,
            IndicatorColumn::Adx => 2 * self.config.adx_period - 1,
            IndicatorColumn::Cci => self.cci.lookback(),
            IndicatorColumn::Rsi => self.rsi.lookback(),
            IndicatorColumn::Kama => self.config.kama.window,
            IndicatorColumn::DcUpper | IndicatorColumn::DcLower => self.dc_upper.lookback(),
            IndicatorColumn::Vwap => self.vwap.lookback(),
            IndicatorColumn::Atr => self.atr.lookback(),
            IndicatorColumn::BbMiddle | IndicatorColumn::BbUpper | IndicatorColumn::BbLower => {
                self.bb_middle.lookback()
            }
            IndicatorColumn::Mfi => self.mfi.lookback(),
            _ => 0,
        }
    }

    /// Compute every indicator column for one instrument.
    ///
    /// `bars` must be strictly ascending by date.
    pub fn compute(&self, bars: &[DailyBar]) -> Result<IndicatorFrame, EngineError> {
        if let Some(index) = first_unordered(bars) {
            return Err(EngineError::UnorderedBars {
                instrument: bars[index].instrument_id,
                index,
                date: bars[index].date,
            });
        }

        let mut frame = IndicatorFrame::new(bars.len());
        if bars.is_empty() {
            return Ok(frame);
        }
        let instrument = bars[0].instrument_id;
        let closes = closes(bars);

        self.run_group(&mut frame, instrument, IndicatorGroup::RollingExtremes, || {
            single_series(bars, &self.extremes)
        });
        self.run_group(&mut frame, instrument, IndicatorGroup::MovingAverages, || {
            let mut out = single_series(bars, &self.sma)?;
            out.extend(single_series(bars, &self.ema)?);
            Ok(out)
        });
        self.run_group(&mut frame, instrument, IndicatorGroup::Directional, || {
            let dm = directional_movement(bars, self.config.adx_period)?;
            Ok(vec![
                (IndicatorColumn::PlusDi, dm.plus_di),
                (IndicatorColumn::MinusDi, dm.minus_di),
                (IndicatorColumn::Adx, dm.adx),
            ])
        });
        self.run_group(&mut frame, instrument, IndicatorGroup::Cci, || {
            Ok(vec![(IndicatorColumn::Cci, self.cci.compute(bars)?)])
        });
        self.run_group(&mut frame, instrument, IndicatorGroup::Rsi, || {
            Ok(vec![(IndicatorColumn::Rsi, self.rsi.compute(bars)?)])
        });
        self.compute_kama(&mut frame, instrument, &closes);
        self.run_group(&mut frame, instrument, IndicatorGroup::Donchian, || {
            Ok(vec![
                (IndicatorColumn::DcUpper, self.dc_upper.compute(bars)?),
                (IndicatorColumn::DcLower, self.dc_lower.compute(bars)?),
            ])
        });
        self.run_group(&mut frame, instrument, IndicatorGroup::Atr, || {
            Ok(vec![(IndicatorColumn::Atr, self.atr.compute(bars)?)])
        });
        self.run_group(&mut frame, instrument, IndicatorGroup::Bollinger, || {
            Ok(vec![
                (IndicatorColumn::BbMiddle, self.bb_middle.compute(bars)?),
                (IndicatorColumn::BbUpper, self.bb_upper.compute(bars)?),
                (IndicatorColumn::BbLower, self.bb_lower.compute(bars)?),
            ])
        });

        if has_usable_volume(bars) {
            self.run_group(&mut frame, instrument, IndicatorGroup::Vwap, || {
                Ok(vec![(IndicatorColumn::Vwap, self.vwap.compute(bars)?)])
            });
            self.run_group(&mut frame, instrument, IndicatorGroup::Mfi, || {
                Ok(vec![(IndicatorColumn::Mfi, self.mfi.compute(bars)?)])
            });
        } else {
            debug!(%instrument, "no usable volume, skipping vwap and mfi");
            frame.set_volume_status(VolumeStatus::Unusable);
        }

        debug!(
            %instrument,
            bars = bars.len(),
            failures = frame.failures().len(),
            "indicators computed"
        );
        Ok(frame)
    }

    fn compute_kama(&self, frame: &mut IndicatorFrame, instrument: InstrumentId, closes: &[f64]) {
        match self.kama.compute(closes) {
            Ok(outcome) => {
                frame.insert(IndicatorColumn::Kama, outcome.values);
                frame.set_kama_tier(Some(outcome.tier));
            }
            Err(err) => {
                warn!(
                    %instrument,
                    error = %err,
                    period = self.config.kama_substitute_period,
                    "kama unavailable, using ema substitute"
                );
                self.run_group(frame, instrument, IndicatorGroup::Kama, || {
                    let ema = ema_of_series(closes, self.config.kama_substitute_period);
                    let ema = crate::indicator::ensure_finite("kama", ema)?;
                    Ok(vec![(IndicatorColumn::Kama, ema)])
                });
            }
        }
    }

    fn run_group(
        &self,
        frame: &mut IndicatorFrame,
        instrument: InstrumentId,
        group: IndicatorGroup,
        compute: impl FnOnce() -> Result<Columns, IndicatorError>,
    ) {
        let result = compute().and_then(|columns| {
            match columns.iter().find(|(_, s)| s.len() != frame.len()) {
                Some((column, s)) => Err(IndicatorError::LengthMismatch {
                    indicator: column.name().to_string(),
                    expected: frame.len(),
                    actual: s.len(),
                }),
                None => Ok(columns),
            }
        });
        match result {
            Ok(columns) => {
                for (column, values) in columns {
                    frame.insert(column, values);
                }
            }
            Err(err) => {
                warn!(%instrument, group = group.name(), error = %err, "indicator group failed");
                frame.record_failure(group, err);
            }
        }
    }
}

fn column(col: Option<IndicatorColumn>) -> Result<IndicatorColumn, EngineError> {
    col.ok_or_else(|| EngineError::InvalidConfig("period has no schema column".to_string()))
}

fn single_series<I: Indicator>(
    bars: &[DailyBar],
    indicators: &[(IndicatorColumn, I)],
) -> Result<Columns, IndicatorError> {
    indicators
        .iter()
        .map(|(column, ind)| Ok((*column, ind.compute(bars)?)))
        .collect()
}

/// At least one bar reports a positive volume.
pub fn has_usable_volume(bars: &[DailyBar]) -> bool {
    bars.iter().any(|b| b.volume.is_some_and(|v| v > 0))
}
