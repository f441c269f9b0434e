//! Stochastic oscillator (%K and %D).
//!
//! raw %K[t] = 100 * (close[t] - min(low)) / (max(high) - min(low)) over the
//! trailing `lookback` bars including t. A zero-width range leaves raw %K
//! undefined.
//! %K = SMA(raw %K, k_smoothing); %D = SMA(%K, d_smoothing).
//!
//! Lookback: (lookback - 1) + (k_smoothing - 1), plus (d_smoothing - 1) for %D.

use super::{rolling_mean, Indicator};
use crate::domain::Bar;

/// Which line of the oscillator to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    lookback: usize,
    k_smoothing: usize,
    d_smoothing: usize,
    line: StochasticLine,
    name: String,
}

impl Stochastic {
    pub fn k(lookback: usize, k_smoothing: usize) -> Self {
        Self::build(lookback, k_smoothing, 1, StochasticLine::K)
    }

    pub fn d(lookback: usize, k_smoothing: usize, d_smoothing: usize) -> Self {
        Self::build(lookback, k_smoothing, d_smoothing, StochasticLine::D)
    }

    fn build(lookback: usize, k_smoothing: usize, d_smoothing: usize, line: StochasticLine) -> Self {
        assert!(lookback >= 1, "stochastic lookback must be >= 1");
        assert!(k_smoothing >= 1, "stochastic %K smoothing must be >= 1");
        assert!(d_smoothing >= 1, "stochastic %D smoothing must be >= 1");
        let name = match line {
            StochasticLine::K => format!("stoch_k_{lookback}_{k_smoothing}"),
            StochasticLine::D => format!("stoch_d_{lookback}_{k_smoothing}_{d_smoothing}"),
        };
        Self {
            lookback,
            k_smoothing,
            d_smoothing,
            line,
            name,
        }
    }
}

/// Unsmoothed %K.
pub fn raw_k(bars: &[Bar], lookback: usize) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if lookback == 0 || n < lookback {
        return result;
    }

    for i in (lookback - 1)..n {
        let window = &bars[(i + 1 - lookback)..=i];
        let mut low_min = f64::INFINITY;
        let mut high_max = f64::NEG_INFINITY;
        let mut has_nan = false;
        for bar in window {
            if bar.low.is_nan() || bar.high.is_nan() {
                has_nan = true;
                break;
            }
            low_min = low_min.min(bar.low);
            high_max = high_max.max(bar.high);
        }

        let range = high_max - low_min;
        if has_nan || range == 0.0 {
            continue;
        }
        // NaN close propagates through the arithmetic.
        result[i] = 100.0 * (bars[i].close - low_min) / range;
    }
    result
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k = (self.lookback - 1) + (self.k_smoothing - 1);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => k + (self.d_smoothing - 1),
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let k = rolling_mean(&raw_k(bars, self.lookback), self.k_smoothing);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => rolling_mean(&k, self.d_smoothing),
        }
    }
}
