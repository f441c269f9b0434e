//! IndicatorFrame: a series with its four derived columns.
//!
//! Built once per symbol before signal detection; every column is aligned
//! one-to-one with the bars and uses NaN for "undefined".

use crate::domain::{Bar, Series};
use crate::indicators::{Indicator, ShortRsi, Sma, Stochastic};
use crate::params::StrategyParams;

#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    series: Series,
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub rsi: Vec<f64>,
    pub long_ma: Vec<f64>,
}

/// One bar of the frame with its derived values, for display and export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRow<'a> {
    pub index: usize,
    pub bar: &'a Bar,
    pub k: f64,
    pub d: f64,
    pub rsi: f64,
    pub long_ma: f64,
}

impl FrameRow<'_> {
    pub fn is_fully_defined(&self) -> bool {
        !(self.k.is_nan() || self.d.is_nan() || self.rsi.is_nan() || self.long_ma.is_nan())
    }
}

impl IndicatorFrame {
    /// Compute every indicator column for `series`.
    pub fn compute(series: &Series, params: &StrategyParams) -> Self {
        let bars = series.bars();
        let k = Stochastic::k(params.stoch_lookback, params.k_smoothing).compute(bars);
        let d = Stochastic::d(params.stoch_lookback, params.k_smoothing, params.d_smoothing)
            .compute(bars);
        let rsi = ShortRsi::new(params.rsi_period).compute(bars);
        let long_ma = Sma::new(params.long_ma_period).compute(bars);

        Self {
            series: series.clone(),
            k,
            d,
            rsi,
            long_ma,
        }
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn bars(&self) -> &[Bar] {
        self.series.bars()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<FrameRow<'_>> {
        let bar = self.bars().get(index)?;
        Some(FrameRow {
            index,
            bar,
            k: self.k[index],
            d: self.d[index],
            rsi: self.rsi[index],
            long_ma: self.long_ma[index],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = FrameRow<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// Number of bars where %K, %D, RSI and the long MA are all defined.
    pub fn fully_defined_count(&self) -> usize {
        self.rows().filter(|row| row.is_fully_defined()).count()
    }
}
