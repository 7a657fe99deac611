//! Kaufman's Adaptive Moving Average, computed directly.
//!
//! ER = |p[i] - p[i-window]| / Σ|p[j] - p[j-1]| over the window (0 when flat)
//! SC = (ER * (fast - slow) + slow)^2, fast = 2/(pow1+1), slow = 2/(pow2+1)
//! KAMA[window] = p[window]; KAMA[i] = KAMA[i-1] + SC * (p[i] - KAMA[i-1])
//!
//! An undefined previous value re-seeds from the current price.

use super::KamaParams;

pub fn manual_kama(prices: &[f64], params: &KamaParams) -> Vec<f64> {
    let n = prices.len();
    let window = params.window;
    let mut kama = vec![f64::NAN; n];

    if window == 0 || n < window + 1 {
        return kama;
    }

    let fast = 2.0 / (params.pow1 as f64 + 1.0);
    let slow = 2.0 / (params.pow2 as f64 + 1.0);

    kama[window] = prices[window];

    for i in (window + 1)..n {
        let change = (prices[i] - prices[i - window]).abs();
        let volatility: f64 = ((i + 1 - window)..=i)
            .map(|j| (prices[j] - prices[j - 1]).abs())
            .sum();
        let er = if volatility == 0.0 {
            0.0
        } else {
            change / volatility
        };
        let sc = (er * (fast - slow) + slow).powi(2);

        let prev = kama[i - 1];
        kama[i] = if prev.is_nan() {
            prices[i]
        } else {
            prev + sc * (prices[i] - prev)
        };
    }

    kama
}
