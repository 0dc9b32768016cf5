//! External data collaborators for the stock dashboard.
//!
//! - [`providers`]: the [`PriceProvider`](providers::PriceProvider) trait and
//!   its Alpaca REST and local CSV implementations.
//! - [`fetch`]: tolerant multi-ticker history fetch that logs and skips
//!   tickers without data.
//! - [`news`]: recent headlines and lexicon-based sentiment scoring.
//! - [`models`]: canonical bar, series, range and headline types.

pub mod fetch;
pub mod models;
pub mod news;
pub mod providers;

pub use fetch::fetch_price_history;
pub use models::{
    bar::{DailyBar, PriceSeries, SeriesError},
    news::{HeadlineSentiment, NewsArticle, SentimentLabel, SentimentSummary},
    request_params::{DateRange, InvalidRangeError},
};
