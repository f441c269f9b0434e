//! Dipscore Core: indicators, entry detection, trade simulation, scoring.
//!
//! Everything needed to analyse one symbol lives here:
//! - Domain types (bars, series, exchanges, trade outcomes)
//! - Look-ahead-free indicators (stochastic %K/%D, short RSI, SMA)
//! - The oversold-dip entry rule and the forward target-hit simulator
//! - Holding-period buckets and the weighted score
//! - Market-data providers behind a session handle

pub mod analysis;
pub mod data;
pub mod domain;
pub mod frame;
pub mod indicators;
pub mod params;
pub mod scoring;
pub mod signal;
pub mod simulator;

pub use analysis::{analyze_series, SymbolAnalysis, SymbolSummary};
pub use params::{EntryRule, ParamsError, ScoreWeights, StrategyParams};
