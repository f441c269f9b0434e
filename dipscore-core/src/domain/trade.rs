//! TradeOutcome: the simulated result of one entry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Holding-period bucket for a trade whose target was hit.
///
/// Edges are inclusive on the upper side: 5 days is `UpTo5`, 6 days is `UpTo10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldingBucket {
    #[serde(rename = "up_to_5")]
    UpTo5,
    #[serde(rename = "up_to_10")]
    UpTo10,
    #[serde(rename = "up_to_20")]
    UpTo20,
    #[serde(rename = "up_to_30")]
    UpTo30,
    #[serde(rename = "over_30")]
    Over30,
}

impl HoldingBucket {
    pub const ALL: [HoldingBucket; 5] = [
        HoldingBucket::UpTo5,
        HoldingBucket::UpTo10,
        HoldingBucket::UpTo20,
        HoldingBucket::UpTo30,
        HoldingBucket::Over30,
    ];

    /// Classify a holding period given in calendar days.
    pub fn classify(holding_days: i64) -> Self {
        match holding_days {
            d if d <= 5 => HoldingBucket::UpTo5,
            d if d <= 10 => HoldingBucket::UpTo10,
            d if d <= 20 => HoldingBucket::UpTo20,
            d if d <= 30 => HoldingBucket::UpTo30,
            _ => HoldingBucket::Over30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HoldingBucket::UpTo5 => "<=5 days",
            HoldingBucket::UpTo10 => "5-10 days",
            HoldingBucket::UpTo20 => "10-20 days",
            HoldingBucket::UpTo30 => "20-30 days",
            HoldingBucket::Over30 => ">30 days",
        }
    }
}

impl fmt::Display for HoldingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    TargetHit,
    /// No later bar reached the target; the trade is still open at the end
    /// of the series.
    NeverHit,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::TargetHit => f.write_str("Target Hit"),
            OutcomeKind::NeverHit => f.write_str("Open Trade"),
        }
    }
}

/// One row of the trade log.
///
/// `exit_date`, `exit_price`, `holding_days` and `bucket` are present iff
/// `kind == TargetHit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub target_price: f64,
    pub kind: OutcomeKind,
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    pub holding_days: Option<i64>,
    pub bucket: Option<HoldingBucket>,
    pub overlapping: bool,
}

impl TradeOutcome {
    pub fn is_hit(&self) -> bool {
        self.kind == OutcomeKind::TargetHit
    }
}
