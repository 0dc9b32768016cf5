//! Per-ticker and session-level failures.
//!
//! A [`TickerError`] never stops the other tickers of a request; it is shown
//! next to the ticker it concerns. [`SessionError`] is the only failure that
//! ends a request early.

use chrono::NaiveDate;
use thiserror::Error;

use crate::forecast::ForecastError;

/// Something went wrong for one ticker. The remaining tickers are unaffected.
#[derive(Debug, Error)]
pub enum TickerError {
    /// The provider returned nothing usable for this ticker.
    #[error("no usable price data for {ticker}: {reason}")]
    DataAvailability { ticker: String, reason: String },

    /// Too little history to forecast; the forecaster was not called.
    #[error(
        "not enough data to forecast {ticker}: {rows} rows, need at least {required}; \
         try an earlier start date"
    )]
    InsufficientData {
        ticker: String,
        rows: usize,
        required: usize,
    },

    /// Training or the rollout failed.
    #[error("forecast failed for {ticker}: {source}")]
    TrainingOrPrediction {
        ticker: String,
        #[source]
        source: ForecastError,
    },
}

impl TickerError {
    /// The ticker this error belongs to.
    pub fn ticker(&self) -> &str {
        match self {
            TickerError::DataAvailability { ticker, .. }
            | TickerError::InsufficientData { ticker, .. }
            | TickerError::TrainingOrPrediction { ticker, .. } => ticker,
        }
    }
}

/// Failures that abort a whole request.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Every requested ticker came back empty.
    #[error(
        "no data found for {} between {start} and {end}; check the symbols and the date range",
        tickers.join(", ")
    )]
    NoData {
        tickers: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
    },
}
