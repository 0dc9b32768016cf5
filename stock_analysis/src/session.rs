//! Request orchestration: fetch, enrich, memoize, then forecast and score
//! sentiment per ticker.
//!
//! Fetch and indicator results are cached per [`CacheKey`] for the lifetime
//! of the [`AnalysisSession`]. There is no eviction and no invalidation
//! other than asking for a different key. Forecasts are never cached.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use chrono::NaiveDate;
use indexmap::IndexMap;
use market_data_ingestor::{
    DateRange, HeadlineSentiment, fetch_price_history,
    news::{NewsProvider, SentimentLexicon, fetch_sentiment},
    providers::PriceProvider,
};
use tracing::{debug, info, warn};

use crate::{
    error::{SessionError, TickerError},
    forecast::{ForecastResult, MIN_FORECAST_ROWS, SeriesForecaster},
    indicators::{EnrichedSeries, compute_indicators},
};

/// Identity of a load: the set of tickers and the date range.
///
/// Ticker order does not matter; `["AAPL", "MSFT"]` and `["MSFT", "AAPL"]`
/// share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    tickers: BTreeSet<String>,
    start: NaiveDate,
    end: NaiveDate,
}

impl CacheKey {
    pub fn new(tickers: &[String], range: DateRange) -> Self {
        Self {
            tickers: tickers.iter().cloned().collect(),
            start: range.start(),
            end: range.end(),
        }
    }
}

/// Enriched history for one load, plus the tickers that had to be dropped.
#[derive(Debug)]
pub struct SessionData {
    pub range: DateRange,
    /// Tickers as requested, in order, without duplicates.
    pub tickers: Vec<String>,
    /// Tickers with usable data, in request order.
    pub enriched: IndexMap<String, EnrichedSeries>,
    /// One [`TickerError::DataAvailability`] per dropped ticker.
    pub warnings: Vec<TickerError>,
}

/// Forecast outcome for one ticker.
#[derive(Debug)]
pub struct TickerForecast {
    pub ticker: String,
    pub outcome: Result<ForecastResult, TickerError>,
}

/// Memoizing front end over a [`PriceProvider`].
pub struct AnalysisSession {
    provider: Box<dyn PriceProvider>,
    cache: HashMap<CacheKey, Arc<SessionData>>,
}

impl AnalysisSession {
    pub fn new(provider: Box<dyn PriceProvider>) -> Self {
        Self {
            provider,
            cache: HashMap::new(),
        }
    }

    /// Number of memoized loads.
    pub fn cached_loads(&self) -> usize {
        self.cache.len()
    }

    /// Fetches and enriches `tickers` over `range`, or returns the memoized
    /// result for an equal key.
    ///
    /// Fails with [`SessionError::NoData`] when no ticker yields a usable
    /// series; nothing is cached in that case.
    pub async fn load(
        &mut self,
        tickers: &[String],
        range: DateRange,
    ) -> Result<Arc<SessionData>, SessionError> {
        let key = CacheKey::new(tickers, range);
        if let Some(hit) = self.cache.get(&key) {
            debug!(tickers = ?tickers, "session cache hit");
            return Ok(Arc::clone(hit));
        }

        // First occurrence wins; the key already treats tickers as a set.
        let mut seen = HashSet::new();
        let tickers: Vec<String> = tickers
            .iter()
            .filter(|t| seen.insert(*t))
            .cloned()
            .collect();

        let mut fetched = fetch_price_history(self.provider.as_ref(), &tickers, range).await;
        if fetched.is_empty() {
            return Err(no_data(&tickers, range));
        }

        let mut enriched = IndexMap::with_capacity(fetched.len());
        let mut warnings = Vec::new();
        for ticker in &tickers {
            let Some(series) = fetched.shift_remove(ticker) else {
                warnings.push(TickerError::DataAvailability {
                    ticker: ticker.clone(),
                    reason: "no price data returned for the selected range".to_string(),
                });
                continue;
            };
            match compute_indicators(&series) {
                Ok(e) => {
                    enriched.insert(ticker.clone(), e);
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "indicators failed; dropping ticker");
                    warnings.push(TickerError::DataAvailability {
                        ticker: ticker.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        if enriched.is_empty() {
            return Err(no_data(&tickers, range));
        }

        info!(
            loaded = enriched.len(),
            dropped = warnings.len(),
            start = %range.start(),
            end = %range.end(),
            "session data ready"
        );
        let data = Arc::new(SessionData {
            range,
            tickers,
            enriched,
            warnings,
        });
        self.cache.insert(key, Arc::clone(&data));
        Ok(data)
    }

    /// Forecasts every loaded ticker, in request order.
    ///
    /// Tickers shorter than [`MIN_FORECAST_ROWS`] are reported as
    /// [`TickerError::InsufficientData`] without calling `forecaster`. A
    /// failing ticker never stops the others.
    pub fn forecast_all<F>(data: &SessionData, forecaster: &F) -> Vec<TickerForecast>
    where
        F: SeriesForecaster + ?Sized,
    {
        data.enriched
            .iter()
            .map(|(ticker, enriched)| {
                let rows = enriched.len();
                let outcome = if rows < MIN_FORECAST_ROWS {
                    warn!(ticker = %ticker, rows, required = MIN_FORECAST_ROWS, "too little history; skipping forecast");
                    Err(TickerError::InsufficientData {
                        ticker: ticker.clone(),
                        rows,
                        required: MIN_FORECAST_ROWS,
                    })
                } else {
                    forecaster
                        .forecast_series(enriched.series())
                        .map_err(|source| {
                            warn!(ticker = %ticker, error = %source, "forecast failed");
                            TickerError::TrainingOrPrediction {
                                ticker: ticker.clone(),
                                source,
                            }
                        })
                };
                TickerForecast {
                    ticker: ticker.clone(),
                    outcome,
                }
            })
            .collect()
    }

    /// Scores up to `limit` recent headlines per ticker. A ticker whose news
    /// fetch fails maps to an empty list.
    pub async fn sentiment_all<N>(
        provider: &N,
        lexicon: &SentimentLexicon,
        tickers: &[String],
        limit: usize,
    ) -> IndexMap<String, Vec<HeadlineSentiment>>
    where
        N: NewsProvider + ?Sized,
    {
        let mut out = IndexMap::with_capacity(tickers.len());
        for ticker in tickers {
            let headlines = fetch_sentiment(provider, lexicon, ticker, limit).await;
            out.insert(ticker.clone(), headlines);
        }
        out
    }
}

fn no_data(tickers: &[String], range: DateRange) -> SessionError {
    warn!(tickers = ?tickers, "no data for any requested ticker");
    SessionError::NoData {
        tickers: tickers.to_vec(),
        start: range.start(),
        end: range.end(),
    }
}
