//! Criterion benchmarks for the per-symbol hot path.
//!
//! Benchmarks:
//! 1. Indicator frame (stochastic, short RSI, 200-day mean)
//! 2. Entry detection over a computed frame
//! 3. Full analysis (indicators, entries, simulation, score)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dipscore_core::domain::{Bar, Series};
use dipscore_core::frame::IndicatorFrame;
use dipscore_core::signal::detect_entries;
use dipscore_core::{analyze_series, StrategyParams};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> Series {
    let base_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let bars = (0..n)
        .map(|i| {
            let trend = 100.0 + i as f64 * 0.05;
            let close = trend + (i as f64 * 0.7).sin() * 4.0;
            let open = close - 0.3;
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000_000,
            }
        })
        .collect();
    Series::new("BENCH", bars).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_frame");
    let params = StrategyParams::default();
    for &bar_count in &[500, 1500, 5000] {
        let series = make_series(bar_count);
        group.bench_with_input(BenchmarkId::from_parameter(bar_count), &series, |b, s| {
            b.iter(|| IndicatorFrame::compute(black_box(s), black_box(&params)));
        });
    }
    group.finish();
}

fn bench_entries(c: &mut Criterion) {
    let params = StrategyParams::default();
    let series = make_series(1500);
    let frame = IndicatorFrame::compute(&series, &params);
    c.bench_function("detect_entries_1500", |b| {
        b.iter(|| detect_entries(black_box(&frame), black_box(&params.entry)));
    });
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_series");
    let params = StrategyParams::default();
    for &bar_count in &[500, 1500, 5000] {
        let series = make_series(bar_count);
        group.bench_with_input(BenchmarkId::from_parameter(bar_count), &series, |b, s| {
            b.iter(|| analyze_series(black_box(s), black_box(&params)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frame, bench_entries, bench_analysis);
criterion_main!(benches);
