//! Entry signal: oversold stochastic and RSI inside a long-term uptrend.
//!
//! A bar is an entry when %K < k_max, %D < d_max, RSI < rsi_max and
//! close > long MA. Any undefined operand fails its comparison, so bars in
//! the warmup window can never fire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frame::{FrameRow, IndicatorFrame};
use crate::params::{round2, EntryRule};

/// A bar selected as a simulated trade opening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Position of the bar in the frame.
    pub index: usize,
    pub date: NaiveDate,
    pub close: f64,
}

impl Entry {
    /// Take-profit price: close * factor, rounded to cents.
    pub fn target_price(&self, factor: f64) -> f64 {
        round2(self.close * factor)
    }
}

impl EntryRule {
    pub fn matches(&self, row: &FrameRow<'_>) -> bool {
        row.k < self.k_max
            && row.d < self.d_max
            && row.rsi < self.rsi_max
            && row.bar.close > row.long_ma
    }
}

/// Filter the frame down to the bars satisfying `rule`, in bar order.
pub fn detect_entries(frame: &IndicatorFrame, rule: &EntryRule) -> Vec<Entry> {
    frame
        .rows()
        .filter(|row| rule.matches(row))
        .map(|row| Entry {
            index: row.index,
            date: row.bar.date,
            close: row.bar.close,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    fn bar(close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 0,
        }
    }

    fn row(bar: &Bar, k: f64, d: f64, rsi: f64, long_ma: f64) -> FrameRow<'_> {
        FrameRow {
            index: 0,
            bar,
            k,
            d,
            rsi,
            long_ma,
        }
    }

    #[test]
    fn all_four_conditions_pass() {
        let b = bar(106.0);
        assert!(EntryRule::default().matches(&row(&b, 10.0, 15.0, 5.0, 100.0)));
    }

    #[test]
    fn thresholds_are_strict() {
        let b = bar(106.0);
        let rule = EntryRule::default();
        assert!(!rule.matches(&row(&b, 20.0, 10.0, 5.0, 100.0)));
        assert!(!rule.matches(&row(&b, 10.0, 20.0, 5.0, 100.0)));
        assert!(!rule.matches(&row(&b, 10.0, 10.0, 15.0, 100.0)));
        assert!(!rule.matches(&row(&b, 10.0, 10.0, 5.0, 106.0)));
    }

    #[test]
    fn any_undefined_operand_fails() {
        let b = bar(106.0);
        let rule = EntryRule::default();
        assert!(!rule.matches(&row(&b, f64::NAN, 10.0, 5.0, 100.0)));
        assert!(!rule.matches(&row(&b, 10.0, f64::NAN, 5.0, 100.0)));
        assert!(!rule.matches(&row(&b, 10.0, 10.0, f64::NAN, 100.0)));
        assert!(!rule.matches(&row(&b, 10.0, 10.0, 5.0, f64::NAN)));
    }

    #[test]
    fn target_price_rounds_to_cents() {
        let entry = Entry {
            index: 0,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            close: 106.0,
        };
        assert_eq!(entry.target_price(1.05), 111.3);

        let odd = Entry {
            close: 123.45,
            ..entry
        };
        // 129.6225 → 129.62
        assert_eq!(odd.target_price(1.05), 129.62);
    }
}
