//! Market data: sessions, providers, and the circuit breaker guarding remote fetches.

pub mod circuit_breaker;
pub mod csv_dir;
pub mod provider;
pub mod session;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_dir::CsvDirProvider;
pub use provider::{
    DataSource, FetchError, HistoryRequest, Interval, MarketDataProvider, DEFAULT_BAR_COUNT,
    MAX_BAR_COUNT,
};
pub use session::{AuthError, Authenticator, Credentials, LocalAuthenticator, Session};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
