//! Batch aggregator: analyse many symbols and rank them by score.
//!
//! A per-symbol problem never aborts the batch: an empty series becomes
//! `SymbolOutcome::Skipped`, a fetch error becomes `SymbolOutcome::Failed`,
//! and processing moves on to the next symbol. Only a missing or expired
//! session and invalid parameters stop a run before it starts.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use dipscore_core::data::{
    HistoryRequest, MarketDataProvider, Session, DEFAULT_BAR_COUNT, MAX_BAR_COUNT,
};
use dipscore_core::domain::{Exchange, TradeOutcome};
use dipscore_core::{analyze_series, ParamsError, StrategyParams, SymbolAnalysis, SymbolSummary};

use crate::progress::AnalysisProgress;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("not logged in: analysis requires a session")]
    NotAuthenticated,

    #[error("session expired at {expired_at}")]
    SessionExpired { expired_at: DateTime<Utc> },

    #[error("invalid strategy parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("bar_count must be at least 1")]
    ZeroBarCount,

    #[error("bar_count {0} exceeds the maximum of {max}", max = MAX_BAR_COUNT)]
    BarCountTooLarge(usize),
}

/// Symbols to analyse and how to fetch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub symbols: Vec<String>,
    pub exchange: Exchange,
    pub bar_count: usize,
    pub parallel: bool,
}

impl BatchRequest {
    pub fn new(symbols: Vec<String>, exchange: Exchange) -> Self {
        Self {
            symbols,
            exchange,
            bar_count: DEFAULT_BAR_COUNT,
            parallel: false,
        }
    }

    /// Trimmed, non-blank symbols with duplicates removed (first occurrence wins).
    pub fn unique_symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.symbols
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// Result for one requested symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Analyzed(SymbolAnalysis),
    Skipped { symbol: String, reason: String },
    Failed { symbol: String, error: String },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Analyzed(analysis) => analysis.symbol(),
            SymbolOutcome::Skipped { symbol, .. } | SymbolOutcome::Failed { symbol, .. } => symbol,
        }
    }

    pub fn analysis(&self) -> Option<&SymbolAnalysis> {
        match self {
            SymbolOutcome::Analyzed(analysis) => Some(analysis),
            _ => None,
        }
    }
}

/// Everything a batch produced, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub user: Option<String>,
    pub exchange: Exchange,
    pub bar_count: usize,
    pub params: StrategyParams,
    pub outcomes: Vec<SymbolOutcome>,
}

impl BatchReport {
    pub fn analyses(&self) -> impl Iterator<Item = &SymbolAnalysis> + '_ {
        self.outcomes.iter().filter_map(SymbolOutcome::analysis)
    }

    /// Summaries by score, highest first. Equal scores keep processing order.
    pub fn ranked(&self) -> Vec<&SymbolSummary> {
        let mut summaries: Vec<&SymbolSummary> = self.analyses().map(|a| &a.summary).collect();
        // sort_by is stable; adding 0.0 folds -0.0 into 0.0 so they tie
        summaries.sort_by(|a, b| (b.score + 0.0).total_cmp(&(a.score + 0.0)));
        summaries
    }

    /// Every trade row, grouped by symbol in processing order.
    pub fn trades(&self) -> Vec<&TradeOutcome> {
        self.analyses().flat_map(|a| a.trades.iter()).collect()
    }

    /// `(symbol, reason)` for every soft skip.
    pub fn skipped(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                SymbolOutcome::Skipped { symbol, reason } => Some((symbol.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// `(symbol, error)` for every failed fetch.
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                SymbolOutcome::Failed { symbol, error } => Some((symbol.as_str(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn analysis_for(&self, symbol: &str) -> Option<&SymbolAnalysis> {
        self.analyses().find(|a| a.symbol() == symbol)
    }
}

/// Refuse to run without a live session.
pub fn check_session(session: Option<&Session>) -> Result<&Session, RunError> {
    let session = session.ok_or(RunError::NotAuthenticated)?;
    if !session.is_valid() {
        return Err(RunError::SessionExpired {
            expired_at: session.expires_at().unwrap_or_else(Utc::now),
        });
    }
    Ok(session)
}

fn analyze_symbol(
    session: &Session,
    provider: &dyn MarketDataProvider,
    request: &BatchRequest,
    params: &StrategyParams,
    symbol: &str,
) -> SymbolOutcome {
    let history = HistoryRequest::daily(symbol, request.exchange, request.bar_count);
    match provider.fetch(session, &history) {
        Ok(series) if series.is_empty() => {
            warn!(symbol, provider = provider.name(), "no data returned, skipping");
            SymbolOutcome::Skipped {
                symbol: symbol.to_string(),
                reason: "no data returned".into(),
            }
        }
        Ok(series) => {
            debug!(symbol, bars = series.len(), "fetched series");
            SymbolOutcome::Analyzed(analyze_series(&series, params))
        }
        Err(e) => {
            warn!(symbol, provider = provider.name(), error = %e, "fetch failed");
            SymbolOutcome::Failed {
                symbol: symbol.to_string(),
                error: e.to_string(),
            }
        }
    }
}

/// Analyse every symbol in `request` and collect the outcomes.
///
/// Outcomes are returned in request order whether or not the batch runs in
/// parallel, so `BatchReport::ranked` breaks ties the same way either way.
pub fn run_batch(
    session: Option<&Session>,
    provider: &dyn MarketDataProvider,
    request: &BatchRequest,
    params: &StrategyParams,
    progress: Option<&dyn AnalysisProgress>,
) -> Result<BatchReport, RunError> {
    let session = check_session(session)?;
    params.validate()?;
    if request.bar_count == 0 {
        return Err(RunError::ZeroBarCount);
    }
    if request.bar_count > MAX_BAR_COUNT {
        return Err(RunError::BarCountTooLarge(request.bar_count));
    }

    let symbols = request.unique_symbols();
    let total = symbols.len();
    info!(
        symbols = total,
        exchange = %request.exchange,
        provider = provider.name(),
        parallel = request.parallel,
        "starting batch"
    );

    let run_one = |index: usize, symbol: &String| {
        if let Some(p) = progress {
            p.on_start(symbol, index, total);
        }
        let outcome = analyze_symbol(session, provider, request, params, symbol);
        if let Some(p) = progress {
            p.on_complete(index, total, &outcome);
        }
        outcome
    };

    let outcomes: Vec<SymbolOutcome> = if request.parallel {
        let started = AtomicUsize::new(0);
        symbols
            .par_iter()
            .map(|symbol| run_one(started.fetch_add(1, Ordering::Relaxed), symbol))
            .collect()
    } else {
        symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| run_one(index, symbol))
            .collect()
    };

    let report = BatchReport {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        provider: provider.name().to_string(),
        user: session.user().map(str::to_string),
        exchange: request.exchange,
        bar_count: request.bar_count,
        params: params.clone(),
        outcomes,
    };

    info!(
        analysed = report.analyses().count(),
        skipped = report.skipped().len(),
        failed = report.failed().len(),
        "batch complete"
    );
    if let Some(p) = progress {
        p.on_batch_complete(&report);
    }
    Ok(report)
}
