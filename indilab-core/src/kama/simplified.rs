//! Volatility-scaled exponential smoothing, the last KAMA strategy.
//!
//! alpha = 2/(w+1), σ = sample std over w, ratio = (σ - min50 σ) / (max50 σ - min50 σ)
//! with 0.5 wherever the ratio is undefined; the per-bar smoothing factor is
//! alpha * (0.1 + 0.9 * ratio). Defined from the first bar.

use super::KamaParams;
use crate::indicators::rolling::{rolling_max, rolling_min, rolling_std};

/// Trailing window for the volatility range.
pub const VOLATILITY_RANGE_WINDOW: usize = 50;

const NEUTRAL_RATIO: f64 = 0.5;

pub fn simplified_kama(prices: &[f64], params: &KamaParams) -> Vec<f64> {
    let n = prices.len();
    let mut kama = vec![f64::NAN; n];
    if n == 0 {
        return kama;
    }

    let alpha = 2.0 / (params.fallback_window as f64 + 1.0);
    let sigma = rolling_std(prices, params.fallback_window, 1);
    let max_sigma = rolling_max(&sigma, VOLATILITY_RANGE_WINDOW);
    let min_sigma = rolling_min(&sigma, VOLATILITY_RANGE_WINDOW);

    kama[0] = prices[0];
    for i in 1..n {
        let ratio = (sigma[i] - min_sigma[i]) / (max_sigma[i] - min_sigma[i]);
        let ratio = if ratio.is_finite() { ratio } else { NEUTRAL_RATIO };
        let adaptive = alpha * (0.1 + 0.9 * ratio);

        kama[i] = if prices[i].is_nan() {
            kama[i - 1]
        } else {
            adaptive * prices[i] + (1.0 - adaptive) * kama[i - 1]
        };
    }

    kama
}
