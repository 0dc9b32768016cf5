//! Indicators, forecasting and reporting for the stock dashboard.
//!
//! - [`indicators`]: moving average, Bollinger bands, RSI, MACD and daily
//!   returns over a [`PriceSeries`](market_data_ingestor::PriceSeries).
//! - [`forecast`]: LSTM-based 30-day close forecast.
//! - [`baseline`]: linear next-day close regression.
//! - [`session`]: memoized fetch + enrich, per-ticker forecast and sentiment.
//! - [`report`]: text rendering.

pub mod baseline;
pub mod error;
pub mod forecast;
pub mod indicators;
pub mod report;
pub mod session;

pub use error::{SessionError, TickerError};
pub use forecast::{ForecastConfig, ForecastRequest, ForecastResult, Forecaster};
pub use indicators::{EnrichedSeries, compute_indicators};
pub use session::{AnalysisSession, CacheKey, SessionData, TickerForecast};
