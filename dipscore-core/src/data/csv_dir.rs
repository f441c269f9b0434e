//! Offline provider reading `<root>/<EXCHANGE>/<SYMBOL>.csv`.
//!
//! Expected header: `date,open,high,low,close[,volume]`. Dates are
//! `YYYY-MM-DD`. Rows with a blank price field are dropped.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::{DataSource, FetchError, HistoryRequest, MarketDataProvider};
use super::session::Session;
use crate::domain::{is_file_safe_symbol, Bar, Series};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    #[serde(default)]
    volume: Option<u64>,
}

impl CsvRow {
    fn into_bar(self) -> Option<Bar> {
        Some(Bar {
            date: self.date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume.unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CsvDirProvider {
    root: PathBuf,
}

impl CsvDirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, request: &HistoryRequest) -> PathBuf {
        self.root
            .join(request.exchange.code())
            .join(format!("{}.csv", request.symbol))
    }
}

pub fn read_bars(path: &Path) -> Result<Vec<Bar>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| FetchError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row.map_err(|source| FetchError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(bar) = row.into_bar().filter(|b| !b.is_void()) {
            bars.push(bar);
        }
    }
    Ok(bars)
}

impl MarketDataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_directory"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvDirectory
    }

    fn fetch(&self, _session: &Session, request: &HistoryRequest) -> Result<Series, FetchError> {
        if !is_file_safe_symbol(&request.symbol) {
            return Err(FetchError::InvalidSymbol(request.symbol.clone()));
        }
        let path = self.path_for(request);
        if !path.is_file() {
            debug!(path = %path.display(), "no CSV for symbol");
            return Ok(Series::empty(request.symbol.clone()));
        }
        let bars = read_bars(&path)?;
        Ok(Series::from_unsorted(request.symbol.clone(), bars).keep_last(request.bar_count))
    }
}
