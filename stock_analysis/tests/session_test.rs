mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Duration;
use common::{FakeProvider, bars, day0, full_range, tickers};
use market_data_ingestor::{
    DateRange, NewsArticle, PriceSeries,
    news::{NewsProvider, SentimentLexicon},
    providers::ProviderError,
};
use stock_analysis::{
    AnalysisSession, ForecastConfig, Forecaster, SessionError, TickerError,
    forecast::{ForecastError, ForecastResult, HORIZON, SeriesForecaster},
    report::DashboardReport,
};

fn provider() -> FakeProvider {
    FakeProvider::default()
        .with("LONG", bars(90, |i| 100.0 + (i as f64 / 5.0).sin() * 3.0 + 0.05 * i as f64))
        .with("SHORT", bars(40, |i| 50.0 + i as f64 * 0.1))
        .with("FLAT", bars(61, |_| 20.0))
}

/// Counts calls and delegates to a small seeded LSTM.
struct CountingForecaster {
    calls: AtomicUsize,
    inner: Forecaster,
}

impl CountingForecaster {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            inner: Forecaster::new(
                ForecastConfig::default()
                    .with_hidden_units(6)
                    .with_epochs(2)
                    .with_seed(3),
            ),
        }
    }
}

impl SeriesForecaster for CountingForecaster {
    fn forecast_series(&self, series: &PriceSeries) -> Result<ForecastResult, ForecastError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.forecast_series(series)
    }
}

struct FailingForecaster;

impl SeriesForecaster for FailingForecaster {
    fn forecast_series(&self, _series: &PriceSeries) -> Result<ForecastResult, ForecastError> {
        Err(ForecastError::Training("loss became non-finite".into()))
    }
}

#[tokio::test]
async fn empty_fetch_for_every_ticker_is_no_data() {
    let fake = provider();
    let mut session = AnalysisSession::new(Box::new(fake.clone()));

    let err = session
        .load(&tickers(&["NOPE", "NADA"]), full_range())
        .await
        .unwrap_err();

    let SessionError::NoData { tickers: requested, .. } = err;
    assert_eq!(requested, vec!["NOPE", "NADA"]);
    assert_eq!(session.cached_loads(), 0);
}

#[tokio::test]
async fn range_without_rows_is_no_data() {
    let mut session = AnalysisSession::new(Box::new(provider()));
    let later = day0() + Duration::days(1000);
    let range = DateRange::new(later, later + Duration::days(10)).unwrap();
    assert!(session.load(&tickers(&["LONG"]), range).await.is_err());
}

#[tokio::test]
async fn missing_ticker_becomes_a_warning() {
    let mut session = AnalysisSession::new(Box::new(provider()));
    let data = session
        .load(&tickers(&["LONG", "NOPE"]), full_range())
        .await
        .unwrap();

    assert_eq!(data.enriched.keys().collect::<Vec<_>>(), vec!["LONG"]);
    assert_eq!(data.warnings.len(), 1);
    assert!(matches!(
        &data.warnings[0],
        TickerError::DataAvailability { ticker, .. } if ticker == "NOPE"
    ));
}

#[tokio::test]
async fn repeated_ticker_loads_once_without_warnings() {
    let fake = provider();
    let mut session = AnalysisSession::new(Box::new(fake.clone()));

    let data = session
        .load(&tickers(&["LONG", "LONG"]), full_range())
        .await
        .unwrap();
    assert_eq!(fake.calls(), 1);
    assert_eq!(data.tickers, vec!["LONG"]);
    assert_eq!(data.enriched.len(), 1);
    assert!(data.warnings.is_empty(), "unexpected warnings: {:?}", data.warnings);

    let single = session.load(&tickers(&["LONG"]), full_range()).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&data, &single));
    assert!(single.warnings.is_empty());
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn equal_keys_are_memoized() {
    let fake = provider();
    let mut session = AnalysisSession::new(Box::new(fake.clone()));

    let first = session
        .load(&tickers(&["LONG", "SHORT"]), full_range())
        .await
        .unwrap();
    assert_eq!(fake.calls(), 2);

    let again = session
        .load(&tickers(&["SHORT", "LONG"]), full_range())
        .await
        .unwrap();
    assert_eq!(fake.calls(), 2, "same ticker set and range must not refetch");
    assert!(std::sync::Arc::ptr_eq(&first, &again));

    let shorter = DateRange::new(day0(), day0() + Duration::days(30)).unwrap();
    session
        .load(&tickers(&["LONG", "SHORT"]), shorter)
        .await
        .unwrap();
    assert_eq!(fake.calls(), 4, "a different range refetches");
    assert_eq!(session.cached_loads(), 2);
}

#[tokio::test]
async fn short_history_is_skipped_without_calling_the_forecaster() {
    let mut session = AnalysisSession::new(Box::new(provider()));
    let data = session
        .load(&tickers(&["SHORT", "LONG", "FLAT"]), full_range())
        .await
        .unwrap();

    let forecaster = CountingForecaster::new();
    let results = AnalysisSession::forecast_all(&data, &forecaster);

    assert_eq!(forecaster.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        results.iter().map(|r| r.ticker.as_str()).collect::<Vec<_>>(),
        vec!["SHORT", "LONG", "FLAT"]
    );

    match &results[0].outcome {
        Err(TickerError::InsufficientData { rows, required, .. }) => {
            assert_eq!(*rows, 40);
            assert_eq!(*required, 61);
        }
        other => panic!("expected InsufficientData, got {other:?}"),
    }

    let long = results[1].outcome.as_ref().unwrap();
    assert_eq!(long.points.len(), HORIZON);
    assert_eq!(long.points[0].date, day0() + Duration::days(90));

    let flat = results[2].outcome.as_ref().unwrap();
    assert!(flat.points.iter().all(|p| p.close == 20.0));
}

#[tokio::test]
async fn forecast_failure_stays_with_its_ticker() {
    let mut session = AnalysisSession::new(Box::new(provider()));
    let data = session
        .load(&tickers(&["LONG", "FLAT"]), full_range())
        .await
        .unwrap();

    let results = AnalysisSession::forecast_all(&data, &FailingForecaster);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| matches!(
        r.outcome,
        Err(TickerError::TrainingOrPrediction { .. })
    )));
}

struct CannedNews;

#[async_trait::async_trait]
impl NewsProvider for CannedNews {
    async fn latest_articles(&self, symbol: &str) -> Result<Vec<NewsArticle>, ProviderError> {
        Ok(vec![NewsArticle {
            title: format!("{symbol} shares surge on record profit"),
            description: None,
            published_at: None,
            url: None,
        }])
    }
}

#[tokio::test]
async fn full_report_renders_every_section() {
    let mut session = AnalysisSession::new(Box::new(provider()));
    let list = tickers(&["LONG", "SHORT", "NOPE"]);
    let data = session.load(&list, full_range()).await.unwrap();

    let forecasts = AnalysisSession::forecast_all(&data, &CountingForecaster::new());
    let sentiment =
        AnalysisSession::sentiment_all(&CannedNews, &SentimentLexicon::default(), &list[..1], 5).await;

    let text = DashboardReport::new(&data)
        .with_forecasts(&forecasts)
        .with_sentiment(&sentiment)
        .with_baseline()
        .render();

    assert!(text.contains("warning: no usable price data for NOPE"));
    assert!(text.contains("== LONG (90 rows) =="));
    assert!(text.contains("== SHORT (40 rows) =="));
    assert!(text.contains("RSI(14)"));
    assert!(text.contains("Positive"));
    assert!(text.contains("no news data available"));
    assert!(text.contains("Forecast    30 days, lookback 60"));
    assert!(text.contains("not enough data to forecast SHORT"));
    assert!(text.contains("Baseline    linear next-day close"));
}
