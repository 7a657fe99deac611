//! Engine configuration: window lengths for every configurable group.
//!
//! The MA periods and rolling-extreme windows are fixed by the schema
//! ([`MA_PERIODS`](crate::schema::MA_PERIODS),
//! [`EXTREME_WINDOWS`](crate::schema::EXTREME_WINDOWS)) and are not listed here.

use serde::{Deserialize, Serialize};

use super::EngineError;
use crate::kama::KamaParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub adx_period: usize,
    pub cci_period: usize,
    pub rsi_period: usize,
    pub donchian_period: usize,
    pub atr_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult: f64,
    pub vwap_period: usize,
    pub mfi_period: usize,
    /// EMA period used for kama when every KAMA strategy fails.
    pub kama_substitute_period: usize,
    pub kama: KamaParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adx_period: 14,
            cci_period: 20,
            rsi_period: 14,
            donchian_period: 20,
            atr_period: 14,
            bollinger_period: 20,
            bollinger_mult: 2.0,
            vwap_period: 14,
            mfi_period: 14,
            kama_substitute_period: 14,
            kama: KamaParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let periods = [
            ("adx_period", self.adx_period),
            ("cci_period", self.cci_period),
            ("rsi_period", self.rsi_period),
            ("donchian_period", self.donchian_period),
            ("atr_period", self.atr_period),
            ("bollinger_period", self.bollinger_period),
            ("vwap_period", self.vwap_period),
            ("mfi_period", self.mfi_period),
            ("kama_substitute_period", self.kama_substitute_period),
            ("kama.window", self.kama.window),
            ("kama.pow1", self.kama.pow1),
            ("kama.pow2", self.kama.pow2),
            ("kama.fallback_window", self.kama.fallback_window),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(EngineError::InvalidConfig(format!("{name} must be >= 1")));
        }
        if !self.bollinger_mult.is_finite() || self.bollinger_mult < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "bollinger_mult must be finite and non-negative, got {}",
                self.bollinger_mult
            )));
        }
        Ok(())
    }
}
