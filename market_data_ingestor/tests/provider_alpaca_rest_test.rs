use chrono::{Duration, Utc};
use market_data_ingestor::{
    models::request_params::DateRange,
    news::{NewsApiProvider, SentimentLexicon, fetch_sentiment},
    providers::{
        PriceProvider,
        alpaca_rest::{AlpacaBarsParams, AlpacaProvider, Feed},
    },
};
use serial_test::serial;

fn last_two_weeks() -> DateRange {
    let end = (Utc::now() - Duration::days(1)).date_naive();
    DateRange::new(end - Duration::days(14), end).unwrap()
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_alpaca_provider_fetch_daily_bars() {
    dotenvy::dotenv().ok();
    // This test requires APCA_API_KEY_ID and APCA_API_SECRET_KEY to be set in the environment.
    if std::env::var("APCA_API_KEY_ID").is_err() || std::env::var("APCA_API_SECRET_KEY").is_err() {
        println!("Skipping test_alpaca_provider_fetch_daily_bars: API keys not set.");
        return;
    }

    let provider = AlpacaProvider::new()
        .expect("Failed to create AlpacaProvider")
        .with_params(AlpacaBarsParams {
            feed: Feed::Iex,
            limit: 3,
            ..Default::default()
        });

    let range = last_two_weeks();
    let series = provider
        .fetch_daily_bars("AAPL", range)
        .await
        .expect("fetch_daily_bars returned an error");

    assert_eq!(series.symbol(), "AAPL");
    assert!(!series.is_empty(), "Expected at least one daily bar for AAPL");
    // limit=3 forces pagination over two weeks of trading days
    assert!(series.len() > 3, "pagination should have merged several pages");
    assert!(series.bars().iter().all(|b| range.contains(b.date)));
    assert!(series.bars().iter().all(|b| b.open.is_some() && b.volume.is_some()));
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_newsapi_headlines_are_scored() {
    dotenvy::dotenv().ok();
    let Ok(provider) = NewsApiProvider::from_env("NEWS_API_KEY") else {
        println!("Skipping test_newsapi_headlines_are_scored: NEWS_API_KEY not set.");
        return;
    };

    let headlines = fetch_sentiment(&provider, &SentimentLexicon::default(), "AAPL", 5).await;
    assert!(headlines.len() <= 5);
    assert!(headlines.iter().all(|h| (-1.0..=1.0).contains(&h.sentiment)));
}
