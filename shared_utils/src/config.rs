//! Dashboard configuration: parsing, normalization, and loading.
//!
//! The file is optional. Every field has a default, so an empty TOML document
//! is a valid configuration. Credentials never live here; the `[news]`
//! section only names the environment variable that holds the key.
//!
//! ```toml
//! [data]
//! tickers = ["AAPL", "msft"]
//! start = "2020-01-01"
//! source = "csv"
//! csv_dir = "data"
//!
//! [forecast]
//! epochs = 10
//! seed = 42
//! ```
//!
//! Normalization trims and upper-cases ticker symbols and drops duplicates
//! while preserving order.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most headlines scored per ticker.
pub const MAX_HEADLINES: usize = 5;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected shape.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but holds values that make no sense together.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DashboardConfig {
    pub data: DataCfg,
    pub forecast: ForecastCfg,
    pub news: NewsCfg,
}

/// Where price history comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Alpaca market data REST API (needs `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`).
    #[default]
    Alpaca,
    /// One `<SYMBOL>.csv` file per ticker in [`DataCfg::csv_dir`].
    Csv,
}

/// Which tickers and which date range to load by default.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DataCfg {
    pub tickers: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub source: SourceKind,
    pub csv_dir: Option<PathBuf>,
}

impl Default for DataCfg {
    fn default() -> Self {
        Self {
            tickers: vec!["AAPL".to_string()],
            start: None,
            end: None,
            source: SourceKind::default(),
            csv_dir: None,
        }
    }
}

/// Overrides for the forecaster's training hyperparameters.
///
/// Anything left unset keeps the forecaster's built-in default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ForecastCfg {
    pub epochs: Option<usize>,
    pub batch_size: Option<usize>,
    pub hidden_units: Option<usize>,
    pub learning_rate: Option<f64>,
    /// Fixes weight initialization and shuffling so runs are reproducible.
    pub seed: Option<u64>,
}

/// News sentiment settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct NewsCfg {
    /// Name of the environment variable holding the NewsAPI key.
    pub api_key_env: String,
    /// Number of headlines to score per ticker, `1..=MAX_HEADLINES`.
    pub max_headlines: usize,
}

impl Default for NewsCfg {
    fn default() -> Self {
        Self {
            api_key_env: "NEWS_API_KEY".to_string(),
            max_headlines: MAX_HEADLINES,
        }
    }
}

/// Trims and upper-cases ticker symbols, dropping blanks and duplicates.
///
/// Returns the number of entries removed.
pub fn normalize_tickers(tickers: &mut Vec<String>) -> usize {
    let before = tickers.len();
    let mut seen = HashSet::new();
    let normalized: Vec<String> = std::mem::take(tickers)
        .into_iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect();
    *tickers = normalized;
    before - tickers.len()
}

impl DashboardConfig {
    /// Normalizes tickers and checks cross-field constraints.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        normalize_tickers(&mut self.data.tickers);

        if let (Some(start), Some(end)) = (self.data.start, self.data.end)
            && start > end
        {
            return Err(ConfigError::Invalid(format!(
                "data.start {start} is after data.end {end}"
            )));
        }
        if self.data.source == SourceKind::Csv && self.data.csv_dir.is_none() {
            return Err(ConfigError::Invalid(
                "data.source = \"csv\" requires data.csv_dir".to_string(),
            ));
        }
        if self.forecast.epochs == Some(0) || self.forecast.batch_size == Some(0) {
            return Err(ConfigError::Invalid(
                "forecast.epochs and forecast.batch_size must be > 0".to_string(),
            ));
        }
        if self.forecast.hidden_units == Some(0) {
            return Err(ConfigError::Invalid(
                "forecast.hidden_units must be > 0".to_string(),
            ));
        }
        if let Some(lr) = self.forecast.learning_rate
            && !(lr.is_finite() && lr > 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "forecast.learning_rate must be a positive number, got {lr}"
            )));
        }
        if !(1..=MAX_HEADLINES).contains(&self.news.max_headlines) {
            return Err(ConfigError::Invalid(format!(
                "news.max_headlines must be between 1 and {MAX_HEADLINES}, got {}",
                self.news.max_headlines
            )));
        }
        Ok(())
    }
}

/// Parse and normalize a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> Result<DashboardConfig, ConfigError> {
    let mut cfg: DashboardConfig = toml::from_str(toml_str)?;
    cfg.normalize()?;
    Ok(cfg)
}

/// Read a configuration file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<DashboardConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_str(&text)
}
