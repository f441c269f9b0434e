//! Domain types for DipScore

pub mod bar;
pub mod exchange;
pub mod series;
pub mod trade;

pub use bar::Bar;
pub use exchange::{Exchange, ExchangeParseError};
pub use series::{Series, SeriesError};
pub use trade::{HoldingBucket, OutcomeKind, TradeOutcome};

/// Whether `symbol` can be used as a single file-name component.
pub fn is_file_safe_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol != "."
        && symbol != ".."
        && !symbol.chars().any(|c| matches!(c, '/' | '\\' | ':' | '\0'))
}
