//! Batch runs end to end: provider → analysis → ranking → artifacts.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;

use dipscore_core::data::{
    Authenticator, DataSource, FetchError, HistoryRequest, LocalAuthenticator, MarketDataProvider,
    Session,
};
use dipscore_core::domain::{Bar, Exchange, Series};
use dipscore_core::scoring::BucketCounts;
use dipscore_core::{StrategyParams, SymbolAnalysis, SymbolSummary};
use dipscore_runner::{
    load_artifacts, run_batch, save_artifacts, BatchReport, BatchRequest, RecordingProgress,
    SymbolOutcome, SCHEMA_VERSION,
};

/// Flat base, step up, three-day dip, recovery through the 5% target.
fn dip_bars() -> Vec<(f64, f64, f64)> {
    let mut rows = Vec::with_capacity(300);
    rows.extend(std::iter::repeat((101.0, 99.0, 100.0)).take(240));
    rows.extend(std::iter::repeat((111.0, 109.0, 110.0)).take(5));
    rows.extend([
        (110.0, 108.0, 108.0),
        (108.5, 107.0, 107.0),
        (107.5, 106.0, 106.0),
        (109.0, 106.5, 108.0),
        (110.0, 107.5, 109.0),
        (111.5, 109.0, 111.0),
    ]);
    rows.extend(std::iter::repeat((112.0, 110.0, 111.0)).take(49));
    rows
}

fn series(symbol: &str, rows: &[(f64, f64, f64)]) -> Series {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let bars = rows
        .iter()
        .enumerate()
        .map(|(i, &(high, low, close))| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 0,
        })
        .collect();
    Series::new(symbol, bars).unwrap()
}

struct FixtureProvider;

impl MarketDataProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(&self, _session: &Session, request: &HistoryRequest) -> Result<Series, FetchError> {
        match request.symbol.as_str() {
            "DIPCO" => Ok(series("DIPCO", &dip_bars())),
            "FLAT" => Ok(series("FLAT", &vec![(101.0, 99.0, 100.0); 300])),
            "DOWN" => Err(FetchError::RateLimited { retry_after_secs: 60 }),
            other => Ok(Series::empty(other)),
        }
    }
}

fn session() -> Session {
    LocalAuthenticator::default().login(None).unwrap()
}

fn request(parallel: bool) -> BatchRequest {
    BatchRequest {
        symbols: ["FLAT", "DIPCO", "GHOST", "DOWN", "DIPCO"]
            .map(String::from)
            .to_vec(),
        exchange: Exchange::Nse,
        bar_count: 300,
        parallel,
    }
}

#[test]
fn ranks_analysed_symbols_and_separates_skips_from_failures() {
    let progress = RecordingProgress::new();
    let report = run_batch(
        Some(&session()),
        &FixtureProvider,
        &request(false),
        &StrategyParams::default(),
        Some(&progress),
    )
    .unwrap();

    // duplicate DIPCO analysed once
    assert_eq!(report.outcomes.len(), 4);

    let ranked: Vec<(&str, f64)> = report
        .ranked()
        .iter()
        .map(|s| (s.symbol.as_str(), s.score))
        .collect();
    assert_eq!(ranked, vec![("DIPCO", 50.0), ("FLAT", 0.0)]);

    assert_eq!(report.skipped(), vec![("GHOST", "no data returned")]);
    assert_eq!(report.failed().len(), 1);
    assert_eq!(report.failed()[0].0, "DOWN");

    assert_eq!(report.trades().len(), 1);
    assert_eq!(report.analysis_for("DIPCO").unwrap().trades[0].holding_days, Some(3));

    assert_eq!(
        progress.events(),
        vec![
            "start:FLAT",
            "analyzed:FLAT",
            "start:DIPCO",
            "analyzed:DIPCO",
            "start:GHOST",
            "skipped:GHOST",
            "start:DOWN",
            "failed:DOWN",
            "done:4",
        ]
    );
}

#[test]
fn parallel_batch_matches_sequential_order() {
    let params = StrategyParams::default();
    let sequential = run_batch(Some(&session()), &FixtureProvider, &request(false), &params, None).unwrap();
    let parallel = run_batch(Some(&session()), &FixtureProvider, &request(true), &params, None).unwrap();
    assert_eq!(sequential.outcomes, parallel.outcomes);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let report = run_batch(
        Some(&session()),
        &FixtureProvider,
        &request(false),
        &StrategyParams::default(),
        None,
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&report, dir.path()).unwrap();

    let summary = std::fs::read_to_string(run_dir.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("1,DIPCO,1,100.00,"));
    assert!(rows[1].ends_with(",50.00"));
    assert!(rows[2].starts_with("2,FLAT,0,"));

    let trades = std::fs::read_to_string(run_dir.join("DIPCO").join("trades.csv")).unwrap();
    assert_eq!(trades.lines().count(), 2);
    assert!(trades.contains("DIPCO,2020-09-04,106.00,111.30,Target Hit,2020-09-07,111.50,3,<=5 days,false"));

    let flat_trades = std::fs::read_to_string(run_dir.join("FLAT").join("trades.csv")).unwrap();
    assert_eq!(flat_trades.lines().count(), 1);

    assert_eq!(load_artifacts(&run_dir).unwrap(), report);
}

// ── Ranking stability (proptest) ─────────────────────────────────────

fn report_with_scores(scores: &[i32]) -> BatchReport {
    let outcomes = scores
        .iter()
        .enumerate()
        .map(|(i, &score)| {
            SymbolOutcome::Analyzed(SymbolAnalysis {
                summary: SymbolSummary {
                    symbol: format!("S{i}"),
                    total_trades: 0,
                    percentages: Default::default(),
                    counts: BucketCounts::default(),
                    score: score as f64,
                },
                trades: Vec::new(),
                bar_count: 0,
                defined_bars: 0,
                first_date: None,
                last_date: None,
                pending_since: None,
            })
        })
        .collect();
    BatchReport {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        provider: "test".into(),
        user: None,
        exchange: Exchange::Nse,
        bar_count: 0,
        params: StrategyParams::default(),
        outcomes,
    }
}

proptest! {
    /// Scores descend, and equal scores keep processing order.
    #[test]
    fn ranking_is_sorted_and_stable(scores in prop::collection::vec(-3..3i32, 0..40)) {
        let report = report_with_scores(&scores);
        let ranked = report.ranked();
        prop_assert_eq!(ranked.len(), scores.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                let a: usize = pair[0].symbol[1..].parse().unwrap();
                let b: usize = pair[1].symbol[1..].parse().unwrap();
                prop_assert!(a < b);
            }
        }
    }
}
