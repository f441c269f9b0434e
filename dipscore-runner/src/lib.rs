//! Dipscore Runner: batch analysis, ranking, and report export.
//!
//! This crate builds on `dipscore-core` to provide:
//! - TOML configuration for runs, strategy parameters, auth and output
//! - The batch aggregator: fetch, analyse, and rank many symbols
//! - Progress reporting
//! - CSV, JSON and Markdown artifacts

pub mod batch;
pub mod config;
pub mod export;
pub mod progress;

pub use batch::{run_batch, BatchReport, BatchRequest, RunError, SymbolOutcome, SCHEMA_VERSION};
pub use config::{AnalysisConfig, ConfigError, ProviderKind};
pub use export::{generate_report, load_artifacts, save_artifacts};
pub use progress::{AnalysisProgress, RecordingProgress, StdoutProgress};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<BatchRequest>();
        assert_sync::<BatchRequest>();
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
        assert_send::<SymbolOutcome>();
        assert_sync::<SymbolOutcome>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<AnalysisConfig>();
        assert_sync::<AnalysisConfig>();
    }

    #[test]
    fn progress_reporters_are_send_sync() {
        assert_send::<StdoutProgress>();
        assert_sync::<StdoutProgress>();
        assert_send::<RecordingProgress>();
        assert_sync::<RecordingProgress>();
    }
}
