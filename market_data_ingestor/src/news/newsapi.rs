//! [newsapi.org](https://newsapi.org) `/v2/everything` client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use shared_utils::env::get_secret_env_var;
use snafu::ResultExt;

use crate::{
    models::news::NewsArticle,
    news::NewsProvider,
    providers::{
        ApiSnafu, ClientBuildSnafu, InvalidApiKeySnafu, MissingEnvVarSnafu, ProviderError,
        ProviderInitError, ReqwestSnafu,
    },
};

const BASE_URL: &str = "https://newsapi.org/v2/everything";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    published_at: Option<DateTime<Utc>>,
    url: Option<String>,
}

#[derive(Deserialize, Debug)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

impl NewsApiResponse {
    fn into_articles(self) -> Vec<NewsArticle> {
        self.articles
            .into_iter()
            .filter_map(|a| {
                let title = a.title.filter(|t| !t.trim().is_empty())?;
                Some(NewsArticle {
                    title,
                    description: a.description,
                    published_at: a.published_at,
                    url: a.url,
                })
            })
            .collect()
    }
}

pub struct NewsApiProvider {
    client: Client,
    base_url: String,
    _api_key: SecretString,
}

impl NewsApiProvider {
    /// Reads the API key from the environment variable `key_env`
    /// (normally `NEWS_API_KEY`).
    pub fn from_env(key_env: &str) -> Result<Self, ProviderInitError> {
        let api_key = get_secret_env_var(key_env).context(MissingEnvVarSnafu)?;
        Self::with_key(api_key)
    }

    pub fn with_key(api_key: SecretString) -> Result<Self, ProviderInitError> {
        // Sent as a header so the key never ends up in a logged URL.
        let mut value =
            header::HeaderValue::from_str(api_key.expose_secret()).context(InvalidApiKeySnafu)?;
        value.set_sensitive(true);
        let mut headers = header::HeaderMap::new();
        headers.insert("X-Api-Key", value);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("stock-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            _api_key: api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn latest_articles(&self, symbol: &str) -> Result<Vec<NewsArticle>, ProviderError> {
        let query = [
            ("q", format!("{symbol} stock")),
            ("sortBy", "publishedAt".to_string()),
            ("language", "en".to_string()),
        ];
        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let body = response
            .json::<NewsApiResponse>()
            .await
            .context(ReqwestSnafu)?;
        Ok(body.into_articles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_everything_response_and_drops_untitled() {
        let body = r#"{
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {"source": {"id": null, "name": "Wire"}, "title": "Apple beats estimates",
                 "description": "Strong iPhone sales", "url": "https://example.com/a",
                 "publishedAt": "2024-05-03T20:15:00Z"},
                {"title": null, "description": "orphan", "publishedAt": null},
                {"title": "  ", "description": null}
            ]
        }"#;
        let resp: NewsApiResponse = serde_json::from_str(body).unwrap();
        let articles = resp.into_articles();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Apple beats estimates");
        assert_eq!(
            articles[0].published_at.unwrap().to_rfc3339(),
            "2024-05-03T20:15:00+00:00"
        );
    }

    #[test]
    fn missing_articles_field_is_empty() {
        let resp: NewsApiResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(resp.into_articles().is_empty());
    }
}
