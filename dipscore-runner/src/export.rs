//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! A batch is saved as one run directory:
//! - `summary.csv`: ranked summary rows for every analysed symbol
//! - `<SYMBOL>/summary.csv` and `<SYMBOL>/trades.csv`: per-symbol sheets
//! - `report.json`: the full `BatchReport`, with `schema_version`
//! - `report.md`: ranked table plus skips and failures
//!
//! Newer schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dipscore_core::domain::{is_file_safe_symbol, TradeOutcome};
use dipscore_core::SymbolSummary;

use crate::batch::{BatchReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BatchReport to JSON")
}

/// Deserialize a `BatchReport`, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<BatchReport> {
    let report: BatchReport =
        serde_json::from_str(json).context("failed to deserialize BatchReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

const SUMMARY_HEADER: [&str; 11] = [
    "rank",
    "symbol",
    "total_trades",
    "within_5_days_pct",
    "within_10_days_pct",
    "within_20_days_pct",
    "within_30_days_pct",
    "over_30_days_pct",
    "never_hit_pct",
    "overlapping_pct",
    "score",
];

fn summary_record(rank: usize, s: &SymbolSummary) -> [String; 11] {
    let p = &s.percentages;
    [
        rank.to_string(),
        s.symbol.clone(),
        s.total_trades.to_string(),
        format!("{:.2}", p.within_5),
        format!("{:.2}", p.within_10),
        format!("{:.2}", p.within_20),
        format!("{:.2}", p.within_30),
        format!("{:.2}", p.over_30),
        format!("{:.2}", p.never_hit),
        format!("{:.2}", p.overlapping),
        format!("{:.2}", s.score),
    ]
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Summary rows in ranked order, rank starting at 1.
pub fn export_summary_csv(summaries: &[&SymbolSummary]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(SUMMARY_HEADER)?;
    for (i, s) in summaries.iter().enumerate() {
        wtr.write_record(summary_record(i + 1, s))?;
    }
    finish(wtr)
}

/// Trade log. Exit columns are blank for trades that never hit their target.
pub fn export_trades_csv(trades: &[&TradeOutcome]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_date",
        "entry_price",
        "target_price",
        "outcome",
        "exit_date",
        "exit_price",
        "holding_days",
        "holding_bucket",
        "overlapping",
    ])?;

    for t in trades {
        wtr.write_record([
            t.symbol.clone(),
            t.entry_date.to_string(),
            format!("{:.2}", t.entry_price),
            format!("{:.2}", t.target_price),
            t.kind.to_string(),
            t.exit_date.map(|d| d.to_string()).unwrap_or_default(),
            t.exit_price.map(|p| format!("{p:.2}")).unwrap_or_default(),
            t.holding_days.map(|d| d.to_string()).unwrap_or_default(),
            t.bucket.map(|b| b.label().to_string()).unwrap_or_default(),
            t.overlapping.to_string(),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a batch.
///
/// Creates `dipscore_{timestamp}/` under `output_dir` and returns its path.
pub fn save_artifacts(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "dipscore_{}",
        report.generated_at.format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("summary.csv"), &export_summary_csv(&report.ranked())?)?;

    for analysis in report.analyses() {
        let symbol_dir = run_dir.join(symbol_dir_name(analysis.symbol()));
        std::fs::create_dir_all(&symbol_dir)
            .with_context(|| format!("failed to create {}", symbol_dir.display()))?;
        write(
            &symbol_dir.join("summary.csv"),
            &export_summary_csv(&[&analysis.summary])?,
        )?;
        let trades: Vec<&TradeOutcome> = analysis.trades.iter().collect();
        write(&symbol_dir.join("trades.csv"), &export_trades_csv(&trades)?)?;
    }

    write(&run_dir.join("report.json"), &export_json(report)?)?;
    write(&run_dir.join("report.md"), &generate_report(report))?;

    Ok(run_dir)
}

/// Directory name for a symbol's files, with path separators escaped.
fn symbol_dir_name(symbol: &str) -> String {
    if is_file_safe_symbol(symbol) {
        return symbol.to_string();
    }
    let escaped: String = symbol
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '\0' | '.') { '_' } else { c })
        .collect();
    if escaped.is_empty() {
        "_".to_string()
    } else {
        escaped
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a `BatchReport` from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<BatchReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

pub fn generate_report(report: &BatchReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Dip Score Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Generated | {} |\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("| Exchange | {} |\n", report.exchange));
    md.push_str(&format!("| Provider | {} |\n", report.provider));
    md.push_str(&format!("| Bars requested | {} |\n", report.bar_count));
    md.push_str(&format!(
        "| Target | +{:.1}% |\n",
        (report.params.target_factor - 1.0) * 100.0
    ));
    if let Some(user) = &report.user {
        md.push_str(&format!("| User | {user} |\n"));
    }
    md.push('\n');

    md.push_str("## Ranking\n\n");
    let ranked = report.ranked();
    if ranked.is_empty() {
        md.push_str("No symbols were analysed.\n\n");
    } else {
        md.push_str("| # | Symbol | Trades | ≤5d % | ≤10d % | ≤20d % | ≤30d % | >30d % | Never % | Overlap % | Score |\n");
        md.push_str("| ---: | --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
        for (i, s) in ranked.iter().enumerate() {
            let p = &s.percentages;
            md.push_str(&format!(
                "| {} | {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
                i + 1,
                s.symbol,
                s.total_trades,
                p.within_5,
                p.within_10,
                p.within_20,
                p.within_30,
                p.over_30,
                p.never_hit,
                p.overlapping,
                s.score
            ));
        }
        md.push('\n');
    }

    let skipped = report.skipped();
    if !skipped.is_empty() {
        md.push_str("## Skipped\n\n");
        for (symbol, reason) in skipped {
            md.push_str(&format!("- {symbol}: {reason}\n"));
        }
        md.push('\n');
    }

    let failed = report.failed();
    if !failed.is_empty() {
        md.push_str("## Failed\n\n");
        for (symbol, error) in failed {
            md.push_str(&format!("- {symbol}: {error}\n"));
        }
        md.push('\n');
    }

    md
}
