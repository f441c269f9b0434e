//! Deterministic synthetic bars for offline runs and tests.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataSource, FetchError, HistoryRequest, MarketDataProvider};
use super::session::Session;
use crate::domain::{Bar, Series};

/// Random-walk provider seeded by symbol and exchange.
///
/// The same request and end date always produce the same bars.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    end_date: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(end_date: NaiveDate) -> Self {
        Self { end_date }
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The last `count` weekdays up to and including `end`, oldest first.
fn business_days_ending(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut current = end;
    while days.len() < count {
        if !is_weekend(current) {
            days.push(current);
        }
        match current.pred_opt() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    days.reverse();
    days
}

pub fn generate_bars(seed_key: &str, end: NaiveDate, count: usize) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(seed_key.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut price = 100.0_f64;
    business_days_ending(end, count)
        .into_iter()
        .map(|date| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);
            price = close;
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(&self, _session: &Session, request: &HistoryRequest) -> Result<Series, FetchError> {
        request.check_bar_count()?;
        let key = format!("{}:{}", request.exchange.code(), request.symbol);
        let bars = generate_bars(&key, self.end_date, request.bar_count);
        Ok(Series::new(request.symbol.clone(), bars)?)
    }
}
