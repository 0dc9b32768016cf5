use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::bar::DailyBar;

#[derive(Deserialize, Debug)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "n")]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw")]
    pub vwap: Option<f64>,
}

impl From<AlpacaBar> for DailyBar {
    fn from(ab: AlpacaBar) -> Self {
        // Daily bars are stamped at US/Eastern midnight, which is still the
        // same calendar day in UTC.
        DailyBar {
            date: ab.timestamp.date_naive(),
            open: Some(ab.open),
            high: Some(ab.high),
            low: Some(ab.low),
            close: ab.close,
            volume: Some(ab.volume),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AlpacaResponse {
    /// Absent or `null` when no symbol had bars in the range.
    #[serde(default)]
    pub bars: Option<IndexMap<String, Vec<AlpacaBar>>>,
    pub next_page_token: Option<String>,
}
