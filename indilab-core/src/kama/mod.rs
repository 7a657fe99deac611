//! Kaufman's Adaptive Moving Average with an ordered fallback chain.
//!
//! [`KamaCalculator`] is built once with its strategies already resolved:
//! an optional injected [`AdaptiveAverage`], then the manual recurrence,
//! then the volatility-scaled simplification. `compute` walks the list and
//! takes the first output that is `Ok` and has at least one defined value.
//! A partially defined output is accepted as-is.

pub mod manual;
pub mod simplified;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::indicator::IndicatorError;

pub use manual::manual_kama;
pub use simplified::simplified_kama;

/// KAMA parameters.
///
/// `window` drives the efficiency ratio, `pow1`/`pow2` are the fast and slow
/// EMA periods, `fallback_window` is the volatility window of the
/// simplified strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KamaParams {
    pub window: usize,
    pub pow1: usize,
    pub pow2: usize,
    pub fallback_window: usize,
}

impl Default for KamaParams {
    fn default() -> Self {
        Self {
            window: 10,
            pow1: 2,
            pow2: 30,
            fallback_window: 14,
        }
    }
}

impl KamaParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.window == 0 || self.pow1 == 0 || self.pow2 == 0 || self.fallback_window == 0 {
            return Err(IndicatorError::InvalidPeriod {
                indicator: "kama".to_string(),
            });
        }
        Ok(())
    }
}

/// An externally supplied adaptive-average implementation.
///
/// Returning `Err`, or a series with no defined value, hands the work to
/// the next strategy.
pub trait AdaptiveAverage: Send + Sync {
    fn name(&self) -> &str;

    fn compute(&self, prices: &[f64], params: &KamaParams) -> Result<Vec<f64>, IndicatorError>;
}

/// Which strategy produced a KAMA series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KamaTier {
    External,
    Manual,
    Simplified,
}

impl fmt::Display for KamaTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KamaTier::External => "external",
            KamaTier::Manual => "manual",
            KamaTier::Simplified => "simplified",
        };
        f.write_str(s)
    }
}

/// A KAMA series and the strategy that produced it.
#[derive(Debug, Clone)]
pub struct KamaOutcome {
    pub values: Vec<f64>,
    pub tier: KamaTier,
}

#[derive(Clone)]
enum Strategy {
    External(Arc<dyn AdaptiveAverage>),
    Manual,
    Simplified,
}

impl Strategy {
    fn tier(&self) -> KamaTier {
        match self {
            Strategy::External(_) => KamaTier::External,
            Strategy::Manual => KamaTier::Manual,
            Strategy::Simplified => KamaTier::Simplified,
        }
    }

    fn run(&self, prices: &[f64], params: &KamaParams) -> Result<Vec<f64>, IndicatorError> {
        let values = match self {
            Strategy::External(ext) => ext.compute(prices, params)?,
            Strategy::Manual => manual_kama(prices, params),
            Strategy::Simplified => simplified_kama(prices, params),
        };
        if values.len() != prices.len() {
            return Err(IndicatorError::LengthMismatch {
                indicator: format!("kama/{}", self.tier()),
                expected: prices.len(),
                actual: values.len(),
            });
        }
        crate::indicator::ensure_finite("kama", values)
    }
}

/// KAMA with its fallback chain resolved at construction.
///
/// The external tier exists only for callers that pass an
/// [`AdaptiveAverage`] to [`KamaCalculator::new`]. Nothing in the workspace
/// ships one: the `indilab` binary and the runner config pass `None`, so a
/// production run always starts at [`KamaTier::Manual`].
#[derive(Clone)]
pub struct KamaCalculator {
    params: KamaParams,
    strategies: Vec<Strategy>,
}

impl fmt::Debug for KamaCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KamaCalculator")
            .field("params", &self.params)
            .field("tiers", &self.tiers())
            .finish()
    }
}

impl KamaCalculator {
    pub fn new(
        params: KamaParams,
        external: Option<Arc<dyn AdaptiveAverage>>,
    ) -> Result<Self, IndicatorError> {
        params.validate()?;
        let mut strategies = Vec::with_capacity(3);
        if let Some(ext) = external {
            strategies.push(Strategy::External(ext));
        }
        strategies.push(Strategy::Manual);
        strategies.push(Strategy::Simplified);
        Ok(Self { params, strategies })
    }

    pub fn params(&self) -> &KamaParams {
        &self.params
    }

    /// Strategies in the order they are tried.
    pub fn tiers(&self) -> Vec<KamaTier> {
        self.strategies.iter().map(Strategy::tier).collect()
    }

    /// First strategy output that succeeded with at least one defined value.
    ///
    /// Returns [`IndicatorError::Exhausted`] when none did.
    pub fn compute(&self, prices: &[f64]) -> Result<KamaOutcome, IndicatorError> {
        for strategy in &self.strategies {
            let tier = strategy.tier();
            match strategy.run(prices, &self.params) {
                Ok(values) if values.iter().any(|v| !v.is_nan()) => {
                    debug!(%tier, bars = prices.len(), "kama computed");
                    return Ok(KamaOutcome { values, tier });
                }
                Ok(_) => {
                    debug!(%tier, bars = prices.len(), "kama strategy produced no defined value");
                }
                Err(err) => {
                    warn!(%tier, error = %err, "kama strategy failed");
                }
            }
        }
        Err(IndicatorError::Exhausted {
            indicator: "kama".to_string(),
        })
    }
}
