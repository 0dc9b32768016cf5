#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use market_data_ingestor::{
    DailyBar, DateRange, PriceSeries,
    providers::{NoDataSnafu, PriceProvider, ProviderError},
};

/// In-memory provider that counts every request it serves.
#[derive(Clone, Default)]
pub struct FakeProvider {
    series: HashMap<String, Vec<DailyBar>>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn with(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.series.insert(symbol.to_string(), bars);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for FakeProvider {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<PriceSeries, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(bars) = self.series.get(symbol) else {
            return NoDataSnafu { symbol }.fail();
        };
        let bars = bars.iter().filter(|b| range.contains(b.date)).cloned().collect();
        Ok(PriceSeries::new(symbol, bars).expect("fixture bars are ordered"))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn day0() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// `n` consecutive calendar days of OHLCV bars starting at [`day0`].
pub fn bars(n: usize, close: impl Fn(usize) -> f64) -> Vec<DailyBar> {
    (0..n)
        .map(|i| {
            let c = close(i);
            DailyBar {
                date: day0() + Duration::days(i as i64),
                open: Some(c - 0.5 + 0.1 * (i % 3) as f64),
                high: Some(c + 1.0 + 0.2 * (i % 5) as f64),
                low: Some(c - 1.0 - 0.1 * (i % 4) as f64),
                close: c,
                volume: Some(1e6 + 1e4 * (i % 7) as f64),
            }
        })
        .collect()
}

pub fn full_range() -> DateRange {
    DateRange::new(day0(), day0() + Duration::days(400)).unwrap()
}

pub fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
