//! Local CSV provider: one `<SYMBOL>.csv` per ticker.
//!
//! Expected header (case-insensitive, column order free):
//! `date,open,high,low,close,volume`. Only `date` and `close` are required;
//! empty cells in the optional columns become `None`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use snafu::{ResultExt, ensure};

use crate::{
    models::{
        bar::{DailyBar, PriceSeries},
        request_params::DateRange,
    },
    providers::{
        CsvSnafu, DataQualitySnafu, IoSnafu, MissingDirectorySnafu, NoDataSnafu, PriceProvider,
        ProviderError, ProviderInitError, SeriesSnafu,
    },
};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    close: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ProviderInitError> {
        let dir = dir.into();
        ensure!(dir.is_dir(), MissingDirectorySnafu { path: dir });
        Ok(Self { dir })
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

/// Parses a CSV document into bars, keeping only rows inside `range`.
pub fn parse_daily_csv(
    text: &str,
    path: &Path,
    range: &DateRange,
) -> Result<Vec<DailyBar>, ProviderError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: ::csv::StringRecord = reader
        .headers()
        .context(CsvSnafu { path })?
        .iter()
        .map(str::to_lowercase)
        .collect();
    ensure!(
        headers.iter().any(|h| h == "close"),
        DataQualitySnafu {
            message: format!("{} has no close column", path.display()),
        }
    );
    reader.set_headers(headers);

    let mut bars = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        let row = record.context(CsvSnafu { path })?;
        if !range.contains(row.date) {
            continue;
        }
        let Some(close) = row.close else {
            return DataQualitySnafu {
                message: format!("{}: empty close on {}", path.display(), row.date),
            }
            .fail();
        };
        bars.push(DailyBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close,
            volume: row.volume,
        });
    }
    Ok(bars)
}

#[async_trait]
impl PriceProvider for CsvProvider {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<PriceSeries, ProviderError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return NoDataSnafu { symbol }.fail();
        }
        let text = tokio::fs::read_to_string(&path)
            .await
            .context(IoSnafu { path: &path })?;

        let bars = parse_daily_csv(&text, &path, &range)?;
        PriceSeries::new(symbol, bars).context(SeriesSnafu)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn parses_full_ohlcv_and_filters_range() {
        let text = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-02,1,2,0.5,1.5,100\n\
                    2024-01-03,1.5,2.5,1,2,200\n\
                    2024-01-04,2,3,1.5,2.5,300\n\
                    2024-01-08,2,3,1.5,2.5,300\n";
        let bars = parse_daily_csv(text, Path::new("X.csv"), &range()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 2.0);
        assert_eq!(bars[1].volume, Some(300.0));
    }

    #[test]
    fn close_only_file_is_accepted() {
        let text = "date,close\n2024-01-03,10\n2024-01-04,11\n";
        let bars = parse_daily_csv(text, Path::new("X.csv"), &range()).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].open.is_none());
    }

    #[test]
    fn missing_close_column_is_a_data_quality_error() {
        let text = "date,open\n2024-01-03,10\n";
        let err = parse_daily_csv(text, Path::new("X.csv"), &range()).unwrap_err();
        assert!(matches!(err, ProviderError::DataQuality { .. }));
    }

    #[test]
    fn empty_close_cell_is_a_data_quality_error() {
        let text = "date,open,close\n2024-01-03,10,\n";
        let err = parse_daily_csv(text, Path::new("X.csv"), &range()).unwrap_err();
        assert!(matches!(err, ProviderError::DataQuality { .. }));
    }

    #[test]
    fn missing_directory_fails_construction() {
        assert!(CsvProvider::new("/no/such/dir/for/sure").is_err());
    }
}
