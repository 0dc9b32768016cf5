//! Tolerant multi-ticker history fetch.

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::{
    models::{bar::PriceSeries, request_params::DateRange},
    providers::PriceProvider,
};

/// Fetches daily history for every ticker, one request at a time.
///
/// A ticker whose request fails, or whose series comes back empty, is
/// logged and left out of the result. The call itself never fails: an empty
/// map means no ticker had data. Entries keep the order of `tickers`.
pub async fn fetch_price_history<P>(
    provider: &P,
    tickers: &[String],
    range: DateRange,
) -> IndexMap<String, PriceSeries>
where
    P: PriceProvider + ?Sized,
{
    let mut out = IndexMap::with_capacity(tickers.len());

    for ticker in tickers {
        match provider.fetch_daily_bars(ticker, range).await {
            Ok(series) if series.is_empty() => {
                warn!(
                    provider = provider.name(),
                    ticker = %ticker,
                    start = %range.start(),
                    end = %range.end(),
                    "no bars in range; the symbol may be delisted or invalid"
                );
            }
            Ok(series) => {
                info!(provider = provider.name(), ticker = %ticker, rows = series.len(), "fetched history");
                out.insert(ticker.clone(), series);
            }
            Err(e) => {
                warn!(provider = provider.name(), ticker = %ticker, error = %e, "fetch failed; skipping ticker");
            }
        }
    }

    out
}
