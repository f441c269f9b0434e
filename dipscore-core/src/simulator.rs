//! Take-profit trade simulation.
//!
//! Each entry is resolved independently by scanning forward for the first
//! bar whose high reaches the target. Overlap uses a single marker,
//! `pending_since`: the date of the first entry that never hit its target.
//! Once set it is never cleared or re-checked against later bars, and every
//! later entry is flagged as overlapping whatever its own outcome.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{Bar, HoldingBucket, OutcomeKind, TradeOutcome};
use crate::frame::IndicatorFrame;
use crate::params::StrategyParams;
use crate::scoring::BucketCounts;
use crate::signal::Entry;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub outcomes: Vec<TradeOutcome>,
    pub counts: BucketCounts,
    /// Date of the first entry left open at the end of the series.
    pub pending_since: Option<NaiveDate>,
}

/// First bar strictly after `entry_index` whose high reaches `target`.
pub fn find_target_hit(bars: &[Bar], entry_index: usize, target: f64) -> Option<(usize, &Bar)> {
    bars.iter()
        .enumerate()
        .skip(entry_index + 1)
        .find(|(_, bar)| bar.high >= target)
}

/// Simulate every entry in order. `entries` must come from `frame`.
pub fn simulate(frame: &IndicatorFrame, entries: &[Entry], params: &StrategyParams) -> Simulation {
    let bars = frame.bars();
    let symbol = frame.series().symbol();
    let mut counts = BucketCounts::default();
    let mut outcomes = Vec::with_capacity(entries.len());
    let mut pending_since: Option<NaiveDate> = None;

    for entry in entries {
        let target = entry.target_price(params.target_factor);

        let overlapping = matches!(pending_since, Some(since) if entry.date > since);
        if overlapping {
            counts.record_overlap();
        }

        let outcome = match find_target_hit(bars, entry.index, target) {
            Some((_, exit)) => {
                let holding_days = (exit.date - entry.date).num_days();
                let bucket = HoldingBucket::classify(holding_days);
                counts.record_hit(bucket);
                TradeOutcome {
                    symbol: symbol.to_string(),
                    entry_date: entry.date,
                    entry_price: entry.close,
                    target_price: target,
                    kind: OutcomeKind::TargetHit,
                    exit_date: Some(exit.date),
                    exit_price: Some(exit.high),
                    holding_days: Some(holding_days),
                    bucket: Some(bucket),
                    overlapping,
                }
            }
            None => {
                counts.record_never_hit();
                if pending_since.is_none() {
                    pending_since = Some(entry.date);
                }
                TradeOutcome {
                    symbol: symbol.to_string(),
                    entry_date: entry.date,
                    entry_price: entry.close,
                    target_price: target,
                    kind: OutcomeKind::NeverHit,
                    exit_date: None,
                    exit_price: None,
                    holding_days: None,
                    bucket: None,
                    overlapping,
                }
            }
        };
        trace!(
            symbol,
            entry = %entry.date,
            kind = %outcome.kind,
            overlapping,
            "resolved entry"
        );
        outcomes.push(outcome);
    }

    Simulation {
        outcomes,
        counts,
        pending_since,
    }
}
