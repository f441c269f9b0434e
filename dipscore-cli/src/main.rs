//! Dipscore CLI: rank symbols by how reliably their oversold dips recover.
//!
//! Commands:
//! - `analyze`: run the batch over a symbol list, print the ranking, save artifacts
//! - `inspect`: show one symbol's indicator frame, entries and trade outcomes

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dipscore_core::data::{Authenticator, Credentials, HistoryRequest, Session};
use dipscore_core::domain::{Exchange, OutcomeKind};
use dipscore_core::frame::IndicatorFrame;
use dipscore_core::signal::detect_entries;
use dipscore_core::simulator::simulate;
use dipscore_runner::{run_batch, save_artifacts, AnalysisConfig, BatchReport, ProviderKind, StdoutProgress};

#[derive(Parser)]
#[command(
    name = "dipscore",
    about = "Dipscore CLI: score symbols by oversold-dip recovery"
)]
struct Cli {
    /// Debug-level logging (overrides RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that fetches bars.
#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exchange: NSE or BSE.
    #[arg(long)]
    exchange: Option<Exchange>,

    /// Data provider: csv, yahoo, synthetic.
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Root of <EXCHANGE>/<SYMBOL>.csv files for the csv provider.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Number of most recent daily bars to fetch per symbol.
    #[arg(long)]
    bar_count: Option<usize>,

    #[arg(long, env = "DIPSCORE_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "DIPSCORE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a list of symbols and rank them by score.
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// Symbols to analyse (comma-separated or repeated).
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        symbols: Vec<String>,

        /// Analyse symbols in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Output directory for the artifact set.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the ranking without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Show the indicator frame, entries and outcomes for one symbol.
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        symbol: String,

        /// Number of trailing bars to print.
        #[arg(long, default_value_t = 10)]
        tail: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            source,
            symbols,
            parallel,
            output_dir,
            no_save,
        } => run_analyze(source, symbols, parallel, output_dir, no_save),
        Commands::Inspect {
            source,
            symbol,
            tail,
        } => run_inspect(source, &symbol, tail),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file (or defaults) and apply command-line overrides.
fn load_config(source: &SourceArgs) -> Result<AnalysisConfig> {
    let mut config = match &source.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(exchange) = source.exchange {
        config.run.exchange = exchange;
    }
    if let Some(provider) = source.provider {
        config.run.provider = provider;
    }
    if let Some(dir) = &source.data_dir {
        config.run.data_dir = dir.clone();
    }
    if let Some(bar_count) = source.bar_count {
        config.run.bar_count = bar_count;
    }
    config.validate()?;
    Ok(config)
}

fn login(config: &AnalysisConfig, source: &SourceArgs) -> Result<Session> {
    let credentials = match (&source.username, &source.password) {
        (Some(user), Some(password)) => Some(Credentials::new(user.as_str(), password.as_str())),
        (None, None) => None,
        (Some(_), None) => bail!("--username given without --password"),
        (None, Some(_)) => bail!("--password given without --username"),
    };
    let session = config
        .authenticator()
        .login(credentials.as_ref())
        .context("login failed")?;
    tracing::info!(user = session.user().unwrap_or("guest"), "logged in");
    Ok(session)
}

fn run_analyze(
    source: SourceArgs,
    symbols: Vec<String>,
    parallel: bool,
    output_dir: Option<PathBuf>,
    no_save: bool,
) -> Result<()> {
    let mut config = load_config(&source)?;
    if !symbols.is_empty() {
        config.run.symbols = symbols;
    }
    if parallel {
        config.run.parallel = true;
    }
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if config.run.symbols.is_empty() {
        bail!("no symbols given (use --symbols or [run].symbols in the config)");
    }

    let session = login(&config, &source)?;
    let provider = config.build_provider()?;
    let report = run_batch(
        Some(&session),
        provider.as_ref(),
        &config.batch_request(),
        &config.strategy,
        Some(&StdoutProgress),
    )?;

    print_ranking(&report);

    if !no_save {
        let run_dir = save_artifacts(&report, &config.output.dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_ranking(report: &BatchReport) {
    let ranked = report.ranked();
    if ranked.is_empty() {
        println!("\nNo symbols were analysed.");
        return;
    }
    println!(
        "\n{:>3}  {:<14} {:>6} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8}",
        "#", "Symbol", "Trades", "<=5d", "<=10d", "<=20d", "<=30d", ">30d", "Never", "Overlap", "Score"
    );
    for (i, s) in ranked.iter().enumerate() {
        let p = &s.percentages;
        println!(
            "{:>3}  {:<14} {:>6} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>8.2}",
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
        );
    }
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{v:.2}")
    }
}

fn run_inspect(source: SourceArgs, symbol: &str, tail: usize) -> Result<()> {
    let config = load_config(&source)?;
    let session = login(&config, &source)?;
    let provider = config.build_provider()?;

    let request = HistoryRequest::daily(symbol.trim(), config.run.exchange, config.run.bar_count);
    let series = provider
        .fetch(&session, &request)
        .with_context(|| format!("failed to fetch {symbol} from {}", provider.name()))?;
    if series.is_empty() {
        bail!("{} returned no data for {symbol} on {}", provider.name(), config.run.exchange);
    }

    let params = &config.strategy;
    let frame = IndicatorFrame::compute(&series, params);
    let entries = detect_entries(&frame, &params.entry);
    let simulation = simulate(&frame, &entries, params);

    println!(
        "{} on {}: {} bars ({} to {}), {} fully defined",
        series.symbol(),
        config.run.exchange,
        series.len(),
        series.first_date().map(|d| d.to_string()).unwrap_or_default(),
        series.last_date().map(|d| d.to_string()).unwrap_or_default(),
        frame.fully_defined_count()
    );

    println!(
        "\n{:<10} {:>10} {:>10} {:>8} {:>8} {:>8} {:>10}  Entry",
        "Date", "Close", "High", "%K", "%D", "RSI", "Long MA"
    );
    let start = frame.len().saturating_sub(tail);
    for row in frame.rows().skip(start) {
        let is_entry = params.entry.matches(&row);
        println!(
            "{:<10} {:>10.2} {:>10.2} {:>8} {:>8} {:>8} {:>10}  {}",
            row.bar.date,
            row.bar.close,
            row.bar.high,
            fmt_value(row.k),
            fmt_value(row.d),
            fmt_value(row.rsi),
            fmt_value(row.long_ma),
            if is_entry { "*" } else { "" }
        );
    }

    println!("\n{} entries", entries.len());
    for outcome in &simulation.outcomes {
        let detail = match outcome.kind {
            OutcomeKind::TargetHit => format!(
                "hit {} at {} after {} days ({})",
                outcome.exit_date.map(|d| d.to_string()).unwrap_or_default(),
                outcome.exit_price.map(fmt_value).unwrap_or_default(),
                outcome.holding_days.unwrap_or_default(),
                outcome.bucket.map(|b| b.label()).unwrap_or_default()
            ),
            OutcomeKind::NeverHit => "never hit".to_string(),
        };
        println!(
            "  {} close {:.2} target {:.2}: {}{}",
            outcome.entry_date,
            outcome.entry_price,
            outcome.target_price,
            detail,
            if outcome.overlapping { " [overlapping]" } else { "" }
        );
    }
    if let Some(since) = simulation.pending_since {
        println!("Open trade pending since {since}");
    }
    Ok(())
}
