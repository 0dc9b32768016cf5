//! Provider abstraction for daily price history.
//!
//! This module defines the [`PriceProvider`] trait, the single interface the
//! analysis code uses to obtain a [`PriceSeries`] for one ticker and date
//! range, whatever the upstream source is.
//!
//! Implementations:
//! - [`alpaca_rest::AlpacaProvider`]: Alpaca market data REST API.
//! - [`csv::CsvProvider`]: one CSV file per ticker in a local directory.
//!
//! The trait is async and object safe, so callers pick a provider at runtime
//! and hold it as `Box<dyn PriceProvider>`.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{bar::PriceSeries, request_params::DateRange};
//! use market_data_ingestor::providers::{PriceProvider, ProviderError};
//!
//! struct EmptyProvider;
//!
//! #[async_trait]
//! impl PriceProvider for EmptyProvider {
//!     async fn fetch_daily_bars(
//!         &self,
//!         symbol: &str,
//!         _range: DateRange,
//!     ) -> Result<PriceSeries, ProviderError> {
//!         Ok(PriceSeries::new(symbol, vec![]).expect("empty series is valid"))
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "empty"
//!     }
//! }
//! ```

pub mod alpaca_rest;
pub mod csv;

use std::path::PathBuf;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{
    bar::{PriceSeries, SeriesError},
    request_params::DateRange,
};

/// Fetches daily bars for one symbol.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches the daily history of `symbol` within `range` (inclusive).
    ///
    /// An unknown symbol or a range with no trading days may yield either an
    /// empty series or an error; callers treat both as "no data".
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<PriceSeries, ProviderError>;

    /// Short human-readable name used in log lines.
    fn name(&self) -> &'static str;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// The configured data directory does not exist.
    #[snafu(display("Data directory {} does not exist", path.display()))]
    MissingDirectory { path: PathBuf, backtrace: Backtrace },
}

/// Errors that can occur within a provider implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned a specific error message (e.g., invalid API key).
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The provider has nothing for this symbol.
    #[snafu(display("No data available for {symbol}"))]
    NoData { symbol: String, backtrace: Backtrace },

    /// Reading a local data file failed.
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// A local data file is not well-formed CSV.
    #[snafu(display("Malformed CSV in {}: {source}", path.display()))]
    Csv {
        path: PathBuf,
        source: ::csv::Error,
        backtrace: Backtrace,
    },

    /// The returned data is missing required fields or has bad values.
    #[snafu(display("Data quality problem: {message}"))]
    DataQuality {
        message: String,
        backtrace: Backtrace,
    },

    /// The returned bars violate the series invariants.
    #[snafu(display("Invalid series: {source}"))]
    Series {
        source: SeriesError,
        backtrace: Backtrace,
    },
}
