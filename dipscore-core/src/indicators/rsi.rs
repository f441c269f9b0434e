//! Short-window RSI with simple-mean smoothing.
//!
//! change[t] = close[t] - close[t-1]; gain/loss are its positive/negative parts.
//! avg_gain/avg_loss = SMA over `period` changes (no Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period.
//! Edge case: avg_loss == 0 leaves RSI undefined (NaN), including the
//! no-movement case.

use super::{rolling_mean, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct ShortRsi {
    period: usize,
    name: String,
}

impl ShortRsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for ShortRsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let change = bars[i].close - bars[i - 1].close;
            if change.is_nan() {
                continue;
            }
            gains[i] = change.max(0.0);
            losses[i] = (-change).max(0.0);
        }

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&gain, &loss)| compute_rsi(gain, loss))
            .collect()
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() || avg_loss == 0.0 {
        return f64::NAN;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_two_losses_is_zero() {
        let bars = make_bars(&[110.0, 108.0, 107.0]);
        let result = ShortRsi::new(2).compute(&bars);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 0.0, 1e-9);
    }

    #[test]
    fn rsi_all_gains_is_undefined() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0]);
        let result = ShortRsi::new(2).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_flat_is_undefined() {
        let bars = make_bars(&[100.0; 6]);
        let result = ShortRsi::new(2).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_mixed() {
        // changes: -1, +2 → avg_gain 1, avg_loss 0.5 → RS 2 → RSI 66.67
        let bars = make_bars(&[107.0, 106.0, 108.0]);
        let result = ShortRsi::new(2).compute(&bars);
        assert_approx(result[2], 100.0 - 100.0 / 3.0, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = ShortRsi::new(2).compute(&bars);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!(
                    (0.0..=100.0).contains(&v),
                    "RSI out of bounds at bar {i}: {v}"
                );
            }
        }
    }

    #[test]
    fn rsi_nan_close_propagates() {
        let mut bars = make_bars(&[100.0, 99.0, 98.0, 97.0, 96.0, 95.0]);
        bars[2].close = f64::NAN;
        let result = ShortRsi::new(2).compute(&bars);
        // changes at 2 and 3 touch the NaN close
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert_approx(result[5], 0.0, 1e-9);
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(ShortRsi::new(2).lookback(), 2);
    }
}
