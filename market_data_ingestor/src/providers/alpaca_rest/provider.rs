use async_trait::async_trait;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_secret_env_var;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{
        bar::{DailyBar, PriceSeries},
        request_params::DateRange,
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, InvalidApiKeySnafu, MissingEnvVarSnafu, PriceProvider,
        ProviderError, ProviderInitError, ReqwestSnafu, SeriesSnafu,
        alpaca_rest::{
            params::{AlpacaBarsParams, construct_params},
            response::AlpacaResponse,
        },
    },
};

const BASE_URL: &str = "https://data.alpaca.markets/v2/stocks/bars";

pub struct AlpacaProvider {
    client: Client,
    base_url: String,
    params: AlpacaBarsParams,
    _api_key: SecretString,
    _secret_key: SecretString,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables.
    pub fn new() -> Result<Self, ProviderInitError> {
        let api_key = get_secret_env_var("APCA_API_KEY_ID").context(MissingEnvVarSnafu)?;
        let secret_key = get_secret_env_var("APCA_API_SECRET_KEY").context(MissingEnvVarSnafu)?;
        Self::with_credentials(api_key, secret_key)
    }

    /// Creates a provider from explicit credentials.
    pub fn with_credentials(
        api_key: SecretString,
        secret_key: SecretString,
    ) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        let mut key_header = header::HeaderValue::from_str(api_key.expose_secret())
            .context(InvalidApiKeySnafu)?;
        key_header.set_sensitive(true);
        let mut secret_header = header::HeaderValue::from_str(secret_key.expose_secret())
            .context(InvalidApiKeySnafu)?;
        secret_header.set_sensitive(true);
        headers.insert("APCA-API-KEY-ID", key_header);
        headers.insert("APCA-API-SECRET-KEY", secret_header);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            params: AlpacaBarsParams::default(),
            _api_key: api_key,
            _secret_key: secret_key,
        })
    }

    /// Overrides the feed/adjustment/page settings.
    pub fn with_params(mut self, params: AlpacaBarsParams) -> Self {
        self.params = params;
        self
    }

    /// Points the provider at a different endpoint (e.g. a local stub server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PriceProvider for AlpacaProvider {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<PriceSeries, ProviderError> {
        let mut all_bars: Vec<DailyBar> = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut query_params = construct_params(symbol, &range, &self.params);
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            let response = self
                .client
                .get(&self.base_url)
                .query(&query_params)
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

            let alpaca_response = response
                .json::<AlpacaResponse>()
                .await
                .context(ReqwestSnafu)?;

            // Merge the bars from the current page; only our symbol was requested.
            let page = alpaca_response
                .bars
                .and_then(|mut by_symbol| by_symbol.swap_remove(symbol))
                .unwrap_or_default();
            debug!(symbol, bars = page.len(), "alpaca page received");
            all_bars.extend(page.into_iter().map(DailyBar::from));

            // If there's a next page token, use it for the next iteration. Otherwise, we're done.
            match alpaca_response.next_page_token {
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        all_bars.retain(|bar| range.contains(bar.date));
        PriceSeries::new(symbol, all_bars).context(SeriesSnafu)
    }

    fn name(&self) -> &'static str {
        "alpaca"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_keys_with_control_characters() {
        let res = AlpacaProvider::with_credentials(
            SecretString::new("bad\nkey".into()),
            SecretString::new("secret".into()),
        );
        assert!(matches!(res, Err(ProviderInitError::InvalidApiKey { .. })));
    }

    #[test]
    fn builds_with_plain_keys() {
        let provider = AlpacaProvider::with_credentials(
            SecretString::new("key".into()),
            SecretString::new("secret".into()),
        )
        .unwrap()
        .with_base_url("http://127.0.0.1:9/v2/stocks/bars");
        assert_eq!(provider.name(), "alpaca");
        assert_eq!(provider.base_url, "http://127.0.0.1:9/v2/stocks/bars");
    }
}
