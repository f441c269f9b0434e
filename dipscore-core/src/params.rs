//! Strategy parameters: indicator windows, entry thresholds, exit target, score weights.
//!
//! Defaults reproduce the stock rule set: stochastic(4, 3, 3), RSI(2),
//! SMA(200), entry below 20/20/15, 5% take-profit target.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{name} must be >= 1")]
    ZeroWindow { name: &'static str },

    #[error("target_factor must be finite and > 1.0, got {0}")]
    InvalidTargetFactor(f64),

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
}

/// Thresholds of the four-condition entry rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntryRule {
    /// %K must be strictly below this.
    pub k_max: f64,
    /// %D must be strictly below this.
    pub d_max: f64,
    /// Short RSI must be strictly below this.
    pub rsi_max: f64,
}

impl Default for EntryRule {
    fn default() -> Self {
        Self {
            k_max: 20.0,
            d_max: 20.0,
            rsi_max: 15.0,
        }
    }
}

/// Coefficients of the linear ranking score. Penalties are stored as positive
/// numbers and subtracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    pub within_5: f64,
    pub within_10: f64,
    pub within_20: f64,
    pub within_30: f64,
    pub over_30: f64,
    pub never_hit_penalty: f64,
    pub overlap_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            within_5: 0.50,
            within_10: 0.25,
            within_20: 0.125,
            within_30: 0.075,
            over_30: 0.05,
            never_hit_penalty: 0.075,
            overlap_penalty: 0.10,
        }
    }
}

impl ScoreWeights {
    fn fields(&self) -> [(&'static str, f64); 7] {
        [
            ("weights.within_5", self.within_5),
            ("weights.within_10", self.within_10),
            ("weights.within_20", self.within_20),
            ("weights.within_30", self.within_30),
            ("weights.over_30", self.over_30),
            ("weights.never_hit_penalty", self.never_hit_penalty),
            ("weights.overlap_penalty", self.overlap_penalty),
        ]
    }
}

/// Everything the per-symbol pipeline needs besides the bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    /// Trailing window for the stochastic high/low range.
    pub stoch_lookback: usize,
    /// SMA window applied to raw %K.
    pub k_smoothing: usize,
    /// SMA window applied to %K to produce %D.
    pub d_smoothing: usize,
    /// SMA window for average gain/loss in the short RSI.
    pub rsi_period: usize,
    /// SMA window for the long trend filter.
    pub long_ma_period: usize,
    /// Take-profit target as a multiple of the entry close.
    pub target_factor: f64,
    pub entry: EntryRule,
    pub weights: ScoreWeights,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            stoch_lookback: 4,
            k_smoothing: 3,
            d_smoothing: 3,
            rsi_period: 2,
            long_ma_period: 200,
            target_factor: 1.05,
            entry: EntryRule::default(),
            weights: ScoreWeights::default(),
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let windows = [
            ("stoch_lookback", self.stoch_lookback),
            ("k_smoothing", self.k_smoothing),
            ("d_smoothing", self.d_smoothing),
            ("rsi_period", self.rsi_period),
            ("long_ma_period", self.long_ma_period),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ParamsError::ZeroWindow { name });
            }
        }

        if !self.target_factor.is_finite() || self.target_factor <= 1.0 {
            return Err(ParamsError::InvalidTargetFactor(self.target_factor));
        }

        let thresholds = [
            ("entry.k_max", self.entry.k_max),
            ("entry.d_max", self.entry.d_max),
            ("entry.rsi_max", self.entry.rsi_max),
        ];
        for (name, value) in thresholds.into_iter().chain(self.weights.fields()) {
            if !value.is_finite() {
                return Err(ParamsError::NonFinite { name, value });
            }
        }
        Ok(())
    }

    /// Number of leading bars before every indicator can be defined.
    pub fn warmup_bars(&self) -> usize {
        let stochastic = self.stoch_lookback.saturating_sub(1)
            + self.k_smoothing.saturating_sub(1)
            + self.d_smoothing.saturating_sub(1);
        let rsi = self.rsi_period;
        let trend = self.long_ma_period.saturating_sub(1);
        stochastic.max(rsi).max(trend)
    }
}

/// Round to two decimal places (half away from zero). Never returns `-0.0`.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
