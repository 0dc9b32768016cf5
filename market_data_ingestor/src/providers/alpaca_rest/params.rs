use serde::{Deserialize, Serialize};

use crate::models::request_params::DateRange;

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    Raw,
    Split,
    Dividend,
    /// Split and dividend adjusted, comparable across the whole history.
    #[default]
    All,
}

/// Specifies the source feed for stock data.
///
/// `Iex` is available on free accounts; `Sip` needs a paid subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Sip,
    #[default]
    Iex,
    Otc,
}

/// Specifies the sort order for the bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

/// Alpaca-specific parameters for a daily bars request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlpacaBarsParams {
    pub adjustment: Adjustment,
    pub feed: Feed,
    /// Page size, 1..=10000.
    pub limit: u32,
    pub sort: Sort,
}

impl Default for AlpacaBarsParams {
    fn default() -> Self {
        Self {
            adjustment: Adjustment::All,
            feed: Feed::Iex,
            limit: 10_000,
            sort: Sort::Asc,
        }
    }
}

fn as_query_value<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Builds the query string for one page of daily bars.
pub fn construct_params(
    symbol: &str,
    range: &DateRange,
    params: &AlpacaBarsParams,
) -> Vec<(String, String)> {
    vec![
        ("symbols".to_string(), symbol.to_string()),
        ("timeframe".to_string(), "1Day".to_string()),
        ("start".to_string(), range.start_utc().to_rfc3339()),
        ("end".to_string(), range.end_utc().to_rfc3339()),
        ("adjustment".to_string(), as_query_value(&params.adjustment)),
        ("feed".to_string(), as_query_value(&params.feed)),
        ("limit".to_string(), params.limit.clamp(1, 10_000).to_string()),
        ("sort".to_string(), as_query_value(&params.sort)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn daily_query_uses_snake_case_enums() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .unwrap();
        let q = construct_params("AAPL", &range, &AlpacaBarsParams::default());
        let get = |k: &str| q.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());

        assert_eq!(get("symbols"), Some("AAPL"));
        assert_eq!(get("timeframe"), Some("1Day"));
        assert_eq!(get("adjustment"), Some("all"));
        assert_eq!(get("feed"), Some("iex"));
        assert_eq!(get("sort"), Some("asc"));
        assert_eq!(get("start"), Some("2024-01-02T00:00:00+00:00"));
    }

    #[test]
    fn limit_is_clamped() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
        .unwrap();
        let params = AlpacaBarsParams {
            limit: 50_000,
            ..Default::default()
        };
        let q = construct_params("MSFT", &range, &params);
        assert!(q.contains(&("limit".to_string(), "10000".to_string())));
    }
}
