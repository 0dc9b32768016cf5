//! Recent headlines per ticker and their lexicon-based sentiment.
//!
//! [`fetch_sentiment`] is deliberately infallible: any provider failure is
//! logged and reported to the caller as "no headlines".

pub mod lexicon;
pub mod newsapi;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    models::news::{HeadlineSentiment, NewsArticle},
    providers::ProviderError,
};

pub use lexicon::SentimentLexicon;
pub use newsapi::NewsApiProvider;

pub use shared_utils::config::MAX_HEADLINES;

/// Source of recent news articles about a ticker.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Latest English-language articles mentioning `symbol`.
    async fn latest_articles(&self, symbol: &str) -> Result<Vec<NewsArticle>, ProviderError>;
}

/// Scores up to `limit` (at most [`MAX_HEADLINES`]) of the most recent
/// headlines for `symbol`.
///
/// Returns an empty vector when the provider fails.
pub async fn fetch_sentiment<N>(
    provider: &N,
    lexicon: &SentimentLexicon,
    symbol: &str,
    limit: usize,
) -> Vec<HeadlineSentiment>
where
    N: NewsProvider + ?Sized,
{
    let mut articles = match provider.latest_articles(symbol).await {
        Ok(articles) => articles,
        Err(e) => {
            warn!(ticker = symbol, error = %e, "news fetch failed; no sentiment data");
            return Vec::new();
        }
    };

    // Most recent first; undated articles sink to the end, otherwise the
    // provider's order is kept.
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let scored: Vec<HeadlineSentiment> = articles
        .into_iter()
        .take(limit.min(MAX_HEADLINES))
        .map(|article| HeadlineSentiment {
            sentiment: lexicon.polarity(&article.scoring_text()),
            title: article.title,
        })
        .collect();
    debug!(ticker = symbol, headlines = scored.len(), "scored headlines");
    scored
}
