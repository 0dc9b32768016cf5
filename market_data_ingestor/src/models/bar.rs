//! Canonical in-memory representation of daily price history.
//!
//! Every provider produces these types regardless of where the data came
//! from, so downstream code never looks up a close price by column name.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single daily observation.
///
/// Only `close` is mandatory. Local files frequently carry nothing but a
/// close column, so the remaining fields are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Trading day this bar describes.
    pub date: NaiveDate,

    /// Opening price.
    pub open: Option<f64>,

    /// Highest price of the day.
    pub high: Option<f64>,

    /// Lowest price of the day.
    pub low: Option<f64>,

    /// Closing price (split/dividend adjusted when the provider supports it).
    pub close: f64,

    /// Shares traded during the day.
    pub volume: Option<f64>,
}

impl DailyBar {
    /// A bar carrying only a close price.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// Reasons a sequence of bars cannot form a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    /// Dates must be strictly increasing (one row per trading day).
    #[error("{symbol}: bar dated {next} does not follow {prev}")]
    Unordered {
        symbol: String,
        prev: NaiveDate,
        next: NaiveDate,
    },

    /// Close prices must be finite numbers.
    #[error("{symbol}: close on {date} is not a finite number")]
    NonFiniteClose { symbol: String, date: NaiveDate },
}

/// Ordered daily history for one symbol.
///
/// Invariants, checked once by [`PriceSeries::new`]: dates strictly
/// increase (so there are no duplicates) and every close is finite. The
/// series is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<DailyBar>,
}

impl PriceSeries {
    /// Validates `bars` and wraps them.
    pub fn new(symbol: impl Into<String>, bars: Vec<DailyBar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();

        for bar in &bars {
            if !bar.close.is_finite() {
                return Err(SeriesError::NonFiniteClose {
                    symbol,
                    date: bar.date,
                });
            }
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::Unordered {
                    symbol,
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    /// Builds a close-only series from `(date, close)` pairs.
    pub fn from_closes(
        symbol: impl Into<String>,
        closes: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, SeriesError> {
        let bars = closes
            .into_iter()
            .map(|(date, close)| DailyBar::from_close(date, close))
            .collect();
        Self::new(symbol, bars)
    }

    /// Ticker symbol, e.g. `"AAPL"`.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All bars, oldest first.
    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The close column, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Dates, oldest first.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Most recent bar, if any.
    pub fn last(&self) -> Option<&DailyBar> {
        self.bars.last()
    }
}
