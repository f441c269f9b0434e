//! Progress reporting for batch runs.

use std::sync::Mutex;

use crate::batch::{BatchReport, SymbolOutcome};

/// Progress callback for batch analysis.
///
/// With a parallel batch the calls arrive from rayon workers, in completion
/// order rather than request order.
pub trait AnalysisProgress: Send + Sync {
    /// Called before a symbol is fetched.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol has been analysed, skipped or has failed.
    fn on_complete(&self, index: usize, total: usize, outcome: &SymbolOutcome);

    /// Called once after every symbol is done.
    fn on_batch_complete(&self, report: &BatchReport);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl AnalysisProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Analysing {symbol}...", index + 1, total);
    }

    fn on_complete(&self, _index: usize, _total: usize, outcome: &SymbolOutcome) {
        match outcome {
            SymbolOutcome::Analyzed(analysis) => println!(
                "  OK: {} ({} trades, score {:.2})",
                analysis.symbol(),
                analysis.summary.total_trades,
                analysis.score()
            ),
            SymbolOutcome::Skipped { symbol, reason } => println!("  SKIP: {symbol}: {reason}"),
            SymbolOutcome::Failed { symbol, error } => println!("  FAIL: {symbol}: {error}"),
        }
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        println!(
            "\nAnalysis complete: {} analysed, {} skipped, {} failed",
            report.analyses().count(),
            report.skipped().len(),
            report.failed().len()
        );
    }
}

/// Records every event; used by tests and embedding callers.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn push(&self, event: String) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl AnalysisProgress for RecordingProgress {
    fn on_start(&self, symbol: &str, _index: usize, _total: usize) {
        self.push(format!("start:{symbol}"));
    }

    fn on_complete(&self, _index: usize, _total: usize, outcome: &SymbolOutcome) {
        let status = match outcome {
            SymbolOutcome::Analyzed(_) => "analyzed",
            SymbolOutcome::Skipped { .. } => "skipped",
            SymbolOutcome::Failed { .. } => "failed",
        };
        self.push(format!("{status}:{}", outcome.symbol()));
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        self.push(format!("done:{}", report.outcomes.len()));
    }
}
