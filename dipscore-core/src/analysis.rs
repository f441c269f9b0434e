//! Per-symbol pipeline: indicators → entries → simulation → score.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Series, TradeOutcome};
use crate::frame::IndicatorFrame;
use crate::params::StrategyParams;
use crate::scoring::{score, BucketCounts, BucketPercentages};
use crate::signal::detect_entries;
use crate::simulator::simulate;

/// One ranked row: the aggregate result for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub total_trades: usize,
    /// Bucket shares in percent, rounded to two decimals.
    pub percentages: BucketPercentages,
    pub counts: BucketCounts,
    pub score: f64,
}

impl SymbolSummary {
    pub fn from_counts(symbol: impl Into<String>, counts: BucketCounts, params: &StrategyParams) -> Self {
        Self {
            symbol: symbol.into(),
            total_trades: counts.total(),
            percentages: counts.percentages().rounded(),
            counts,
            score: score(&counts, &params.weights),
        }
    }
}

/// Everything produced for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolAnalysis {
    pub summary: SymbolSummary,
    pub trades: Vec<TradeOutcome>,
    pub bar_count: usize,
    /// Bars with all four indicators defined.
    pub defined_bars: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub pending_since: Option<NaiveDate>,
}

impl SymbolAnalysis {
    pub fn symbol(&self) -> &str {
        &self.summary.symbol
    }

    pub fn score(&self) -> f64 {
        self.summary.score
    }
}

/// Run the full pipeline over one series.
///
/// Never fails: a series too short for the indicators simply yields no
/// entries and a zero summary.
pub fn analyze_series(series: &Series, params: &StrategyParams) -> SymbolAnalysis {
    let frame = IndicatorFrame::compute(series, params);
    let entries = detect_entries(&frame, &params.entry);
    let simulation = simulate(&frame, &entries, params);
    let summary = SymbolSummary::from_counts(series.symbol(), simulation.counts, params);

    debug!(
        symbol = series.symbol(),
        bars = series.len(),
        entries = entries.len(),
        score = summary.score,
        "analysed series"
    );

    SymbolAnalysis {
        summary,
        trades: simulation.outcomes,
        bar_count: series.len(),
        defined_bars: frame.fully_defined_count(),
        first_date: series.first_date(),
        last_date: series.last_date(),
        pending_since: simulation.pending_since,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    fn flat_series(n: usize) -> Series {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let bars = (0..n)
            .map(|i| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 0,
            })
            .collect();
        Series::new("FLAT", bars).unwrap()
    }

    #[test]
    fn flat_series_has_zero_summary() {
        let analysis = analyze_series(&flat_series(300), &StrategyParams::default());
        assert_eq!(analysis.summary.total_trades, 0);
        assert_eq!(analysis.summary.score, 0.0);
        assert_eq!(analysis.summary.percentages, BucketPercentages::default());
        assert!(analysis.trades.is_empty());
        assert_eq!(analysis.bar_count, 300);
        // flat closes leave the RSI undefined everywhere
        assert_eq!(analysis.defined_bars, 0);
    }

    #[test]
    fn empty_series_is_a_zero_summary() {
        let analysis = analyze_series(&Series::empty("NONE"), &StrategyParams::default());
        assert_eq!(analysis.symbol(), "NONE");
        assert_eq!(analysis.summary.total_trades, 0);
        assert_eq!(analysis.first_date, None);
    }

    #[test]
    fn summary_from_counts_rounds_percentages_not_score_inputs() {
        let counts = BucketCounts {
            within_5: 1,
            within_10: 2,
            ..BucketCounts::default()
        };
        let summary = SymbolSummary::from_counts("X", counts, &StrategyParams::default());
        assert_eq!(summary.total_trades, 3);
        assert_eq!(summary.percentages.within_5, 33.33);
        assert_eq!(summary.score, 33.33);
    }
}
