//! Property tests for analysis invariants.
//!
//! Uses proptest to verify:
//! 1. Bucket accounting: the six exclusive buckets sum to the trade count
//! 2. Entries only fire on fully defined bars
//! 3. Hit trades exit strictly after entry at or above the target
//! 4. Overlap is monotone: once a trade is flagged, every later one is too
//! 5. Score stays within its weight envelope

use chrono::NaiveDate;
use dipscore_core::domain::{Bar, OutcomeKind, Series};
use dipscore_core::frame::IndicatorFrame;
use dipscore_core::signal::detect_entries;
use dipscore_core::{analyze_series, StrategyParams};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Daily moves: a positive drift with sharp dips so entries actually occur.
fn arb_returns() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.06..0.07_f64, 260..420)
}

fn walk(returns: &[f64]) -> Series {
    let base = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let mut price = 100.0_f64;
    let bars = returns
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let open = price;
            price = (price * (1.0 + r)).max(1.0);
            let close = price;
            Bar {
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 0,
            }
        })
        .collect();
    Series::new("PROP", bars).unwrap()
}

proptest! {
    #[test]
    fn buckets_sum_to_trade_count(returns in arb_returns()) {
        let analysis = analyze_series(&walk(&returns), &StrategyParams::default());
        let c = analysis.summary.counts;
        let sum = c.within_5 + c.within_10 + c.within_20 + c.within_30 + c.over_30 + c.never_hit;
        prop_assert_eq!(sum, analysis.trades.len());
        prop_assert_eq!(analysis.summary.total_trades, analysis.trades.len());
        prop_assert!(c.overlapping <= c.total());
    }

    #[test]
    fn entries_fire_only_on_defined_bars(returns in arb_returns()) {
        let series = walk(&returns);
        let params = StrategyParams::default();
        let frame = IndicatorFrame::compute(&series, &params);
        let entries = detect_entries(&frame, &params.entry);
        prop_assert!(entries.len() <= frame.fully_defined_count());
        for entry in &entries {
            let row = frame.row(entry.index).unwrap();
            prop_assert!(row.is_fully_defined());
            prop_assert!(entry.index >= params.warmup_bars());
        }
    }

    #[test]
    fn hits_exit_after_entry_at_target(returns in arb_returns()) {
        let analysis = analyze_series(&walk(&returns), &StrategyParams::default());
        for trade in &analysis.trades {
            match trade.kind {
                OutcomeKind::TargetHit => {
                    let exit = trade.exit_date.unwrap();
                    prop_assert!(exit > trade.entry_date);
                    prop_assert!(trade.exit_price.unwrap() >= trade.target_price);
                    prop_assert_eq!(trade.holding_days, Some((exit - trade.entry_date).num_days()));
                }
                OutcomeKind::NeverHit => {
                    prop_assert!(trade.exit_date.is_none());
                    prop_assert!(trade.bucket.is_none());
                }
            }
        }
    }

    #[test]
    fn overlap_is_monotone(returns in arb_returns()) {
        let analysis = analyze_series(&walk(&returns), &StrategyParams::default());
        let first_flag = analysis.trades.iter().position(|t| t.overlapping);
        if let Some(first) = first_flag {
            prop_assert!(analysis.trades[first..].iter().all(|t| t.overlapping));
            prop_assert!(analysis.pending_since.is_some());
        }
        if analysis.pending_since.is_none() {
            prop_assert!(first_flag.is_none());
        }
    }

    #[test]
    fn score_within_weight_envelope(returns in arb_returns()) {
        let analysis = analyze_series(&walk(&returns), &StrategyParams::default());
        // best case: every trade within 5 days; worst: all never-hit and overlapping
        prop_assert!(analysis.summary.score <= 50.0);
        prop_assert!(analysis.summary.score >= -17.5);
        if analysis.trades.is_empty() {
            prop_assert_eq!(analysis.summary.score, 0.0);
        }
    }
}
