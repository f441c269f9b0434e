//! Outcome buckets and the weighted ranking score.
//!
//! Every trade lands in exactly one of six buckets: five holding-period
//! buckets for hits plus `never_hit`. `overlapping` is counted separately and
//! overlaps the other six.

use serde::{Deserialize, Serialize};

use crate::domain::HoldingBucket;
use crate::params::{round2, ScoreWeights};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub within_5: usize,
    pub within_10: usize,
    pub within_20: usize,
    pub within_30: usize,
    pub over_30: usize,
    pub never_hit: usize,
    pub overlapping: usize,
}

impl BucketCounts {
    pub fn record_hit(&mut self, bucket: HoldingBucket) {
        match bucket {
            HoldingBucket::UpTo5 => self.within_5 += 1,
            HoldingBucket::UpTo10 => self.within_10 += 1,
            HoldingBucket::UpTo20 => self.within_20 += 1,
            HoldingBucket::UpTo30 => self.within_30 += 1,
            HoldingBucket::Over30 => self.over_30 += 1,
        }
    }

    pub fn record_never_hit(&mut self) {
        self.never_hit += 1;
    }

    pub fn record_overlap(&mut self) {
        self.overlapping += 1;
    }

    pub fn hits(&self) -> usize {
        self.within_5 + self.within_10 + self.within_20 + self.within_30 + self.over_30
    }

    /// Total number of trades (sum of the six exclusive buckets).
    pub fn total(&self) -> usize {
        self.hits() + self.never_hit
    }

    /// Share of trades per bucket, in percent. All zero when there are no trades.
    pub fn percentages(&self) -> BucketPercentages {
        let total = self.total();
        if total == 0 {
            return BucketPercentages::default();
        }
        let pct = |count: usize| count as f64 * 100.0 / total as f64;
        BucketPercentages {
            within_5: pct(self.within_5),
            within_10: pct(self.within_10),
            within_20: pct(self.within_20),
            within_30: pct(self.within_30),
            over_30: pct(self.over_30),
            never_hit: pct(self.never_hit),
            overlapping: pct(self.overlapping),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketPercentages {
    pub within_5: f64,
    pub within_10: f64,
    pub within_20: f64,
    pub within_30: f64,
    pub over_30: f64,
    pub never_hit: f64,
    pub overlapping: f64,
}

impl BucketPercentages {
    pub fn rounded(&self) -> Self {
        Self {
            within_5: round2(self.within_5),
            within_10: round2(self.within_10),
            within_20: round2(self.within_20),
            within_30: round2(self.within_30),
            over_30: round2(self.over_30),
            never_hit: round2(self.never_hit),
            overlapping: round2(self.overlapping),
        }
    }
}

/// Weighted score from bucket counts, rounded to two decimals.
///
/// Exactly 0.0 with no trades. Not bounded below: heavy never-hit and
/// overlap shares produce negative scores.
pub fn score(counts: &BucketCounts, weights: &ScoreWeights) -> f64 {
    if counts.total() == 0 {
        return 0.0;
    }
    let p = counts.percentages();
    let raw = weights.within_5 * p.within_5
        + weights.within_10 * p.within_10
        + weights.within_20 * p.within_20
        + weights.within_30 * p.within_30
        + weights.over_30 * p.over_30
        - weights.never_hit_penalty * p.never_hit
        - weights.overlap_penalty * p.overlapping;
    round2(raw)
}
