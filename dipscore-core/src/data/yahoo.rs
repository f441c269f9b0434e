//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. NSE and BSE listings
//! are addressed with the `.NS` / `.BO` suffixes. Handles rate limiting,
//! retries with exponential backoff, response parsing, and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. The CSV directory provider is the fallback when Yahoo is
//! unavailable.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataSource, FetchError, HistoryRequest, MarketDataProvider};
use super::session::Session;
use crate::domain::{Bar, Series};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bar dates are exchange-local.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FetchError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn ticker(request: &HistoryRequest) -> String {
        format!("{}{}", request.symbol, request.exchange.yahoo_suffix())
    }

    /// Calendar window that comfortably covers `bar_count` trading days
    /// (weekends plus roughly 15 holidays a year).
    pub fn lookback_days(bar_count: usize) -> i64 {
        let trading_days = i64::try_from(bar_count).unwrap_or(i64::MAX);
        (trading_days.saturating_mul(7) / 5)
            .saturating_add(trading_days / 12)
            .saturating_add(10)
    }

    /// First calendar day of the window that should hold `bar_count` bars ending at `end`.
    fn window_start(end: NaiveDate, bar_count: usize) -> Result<NaiveDate, FetchError> {
        chrono::Duration::try_days(Self::lookback_days(bar_count))
            .and_then(|lookback| end.checked_sub_signed(lookback))
            .ok_or_else(|| {
                FetchError::Other(format!("no representable date range for {bar_count} bars"))
            })
    }

    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?period1={start_ts}&period2={end_ts}&interval=1d&events=history"
        )
    }

    /// Parse a chart response. `Ok(None)` means Yahoo does not know the ticker.
    fn parse_response(resp: ChartResponse) -> Result<Option<Vec<Bar>>, FetchError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => return Ok(None),
            (None, Some(err)) => {
                return Err(FetchError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(FetchError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(None);
        };
        // A listed ticker with no trading history has no timestamp array.
        let Some(timestamps) = data.timestamp else {
            return Ok(Some(Vec::new()));
        };
        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    FetchError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let field = |column: &[Option<f64>]| column.get(i).copied().flatten();
            // Holidays and halted sessions come back as nulls.
            let (Some(open), Some(high), Some(low), Some(close)) = (
                field(&quote.open),
                field(&quote.high),
                field(&quote.low),
                field(&quote.close),
            ) else {
                continue;
            };

            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }
        Ok(Some(bars))
    }

    fn fetch_with_retry(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Option<Vec<Bar>>, FetchError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(FetchError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(ticker, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(ticker, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(FetchError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(FetchError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(FetchError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(FetchError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!(ticker, retry_after_secs, "rate limited");
                last_error = Some(FetchError::RateLimited { retry_after_secs });
                continue;
            }
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(FetchError::Unauthorized(format!("HTTP 401 for {ticker}")));
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                // Yahoo answers unknown tickers with 404 plus a "Not Found" body.
                return Ok(None);
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(FetchError::Other(format!("HTTP {status} for {ticker}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                FetchError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
            })?;
            let bars = Self::parse_response(chart)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| FetchError::Other("max retries exceeded".into())))
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn fetch(&self, _session: &Session, request: &HistoryRequest) -> Result<Series, FetchError> {
        request.check_bar_count()?;
        let ticker = Self::ticker(request);
        let end = Utc::now().date_naive();
        let start = Self::window_start(end, request.bar_count)?;

        match self.fetch_with_retry(&ticker, start, end)? {
            Some(bars) => {
                let series = Series::from_unsorted(request.symbol.clone(), bars);
                debug!(ticker, bars = series.len(), "fetched chart");
                Ok(series.keep_last(request.bar_count))
            }
            None => {
                debug!(ticker, "ticker not found");
                Ok(Series::empty(request.symbol.clone()))
            }
        }
    }
}
