//! Series: the ordered bar history of a single symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("bar {index} is dated {current}, not after the previous bar ({previous})")]
    NonMonotonic {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

/// Bars for one symbol in strictly increasing date order.
///
/// The ordering invariant is checked on construction; the bars are
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    /// Build a series, rejecting bars whose dates are not strictly increasing.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::NonMonotonic {
                    index: index + 1,
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Build a series from provider output in arbitrary order.
    ///
    /// Sorts by date; when a date repeats, the bar that came last wins.
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        // Stable sort keeps duplicates in arrival order, so keeping the last
        // element of each run keeps the latest arrival.
        bars.sort_by_key(|b| b.date);
        let mut canonical: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match canonical.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => canonical.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: canonical,
        }
    }

    /// An empty series (provider returned no data).
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Keep only the most recent `count` bars.
    pub fn keep_last(mut self, count: usize) -> Self {
        if self.bars.len() > count {
            let excess = self.bars.len() - count;
            self.bars.drain(..excess);
        }
        self
    }
}
