//! TOML analysis configuration.
//!
//! ```toml
//! [run]
//! symbols = ["RELIANCE", "TCS"]
//! exchange = "NSE"
//! provider = "yahoo"
//! bar_count = 1500
//!
//! [strategy]
//! target_factor = 1.05
//!
//! [auth]
//! allow_guest = true
//!
//! [output]
//! dir = "results"
//! ```
//!
//! Every section and key is optional; unknown keys are rejected.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dipscore_core::data::{
    CircuitBreaker, CsvDirProvider, FetchError, LocalAuthenticator, MarketDataProvider,
    SyntheticProvider, YahooProvider, DEFAULT_BAR_COUNT, MAX_BAR_COUNT,
};
use dipscore_core::domain::Exchange;
use dipscore_core::{ParamsError, StrategyParams};

use crate::batch::BatchRequest;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("bar_count must be at least 1")]
    ZeroBarCount,

    #[error("bar_count {0} exceeds the maximum of {max}", max = MAX_BAR_COUNT)]
    BarCountTooLarge(usize),

    #[error("unknown provider '{0}' (expected csv, yahoo or synthetic)")]
    UnknownProvider(String),
}

/// Where bars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Csv,
    #[default]
    Yahoo,
    Synthetic,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Csv => "csv",
            ProviderKind::Yahoo => "yahoo",
            ProviderKind::Synthetic => "synthetic",
        })
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ProviderKind::Csv),
            "yahoo" => Ok(ProviderKind::Yahoo),
            "synthetic" => Ok(ProviderKind::Synthetic),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub symbols: Vec<String>,
    pub exchange: Exchange,
    pub provider: ProviderKind,
    /// Root of `<EXCHANGE>/<SYMBOL>.csv` files for the CSV provider.
    pub data_dir: PathBuf,
    pub bar_count: usize,
    pub parallel: bool,
    /// Last date generated by the synthetic provider. Defaults to today.
    pub synthetic_end: Option<NaiveDate>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            exchange: Exchange::Nse,
            provider: ProviderKind::Yahoo,
            data_dir: PathBuf::from("data"),
            bar_count: DEFAULT_BAR_COUNT,
            parallel: false,
            synthetic_end: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    pub allow_guest: bool,
    /// Session lifetime; `None` never expires.
    pub session_ttl_minutes: Option<i64>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            allow_guest: true,
            session_ttl_minutes: Some(480),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub run: RunSection,
    pub strategy: StrategyParams,
    pub auth: AuthSection,
    pub output: OutputSection,
}

impl AnalysisConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.bar_count == 0 {
            return Err(ConfigError::ZeroBarCount);
        }
        if self.run.bar_count > MAX_BAR_COUNT {
            return Err(ConfigError::BarCountTooLarge(self.run.bar_count));
        }
        self.strategy.validate()?;
        Ok(())
    }

    pub fn batch_request(&self) -> BatchRequest {
        BatchRequest {
            symbols: self.run.symbols.clone(),
            exchange: self.run.exchange,
            bar_count: self.run.bar_count,
            parallel: self.run.parallel,
        }
    }

    pub fn authenticator(&self) -> LocalAuthenticator {
        let ttl = self.auth.session_ttl_minutes.map(chrono::Duration::minutes);
        LocalAuthenticator::new(self.auth.allow_guest, ttl)
    }

    pub fn build_provider(&self) -> Result<Box<dyn MarketDataProvider>, FetchError> {
        Ok(match self.run.provider {
            ProviderKind::Csv => Box::new(CsvDirProvider::new(&self.run.data_dir)),
            ProviderKind::Yahoo => Box::new(YahooProvider::new(Arc::new(
                CircuitBreaker::default_provider(),
            ))?),
            ProviderKind::Synthetic => Box::new(SyntheticProvider::new(
                self.run.synthetic_end.unwrap_or_else(|| Utc::now().date_naive()),
            )),
        })
    }
}
