use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use indexmap::IndexMap;
use market_data_ingestor::{
    DateRange,
    news::{NewsApiProvider, SentimentLexicon},
    providers::{PriceProvider, alpaca_rest::AlpacaProvider, csv::CsvProvider},
};
use shared_utils::config::{DashboardConfig, SourceKind, load_config_path};
use stock_analysis::{
    AnalysisSession, ForecastConfig, Forecaster, report::DashboardReport,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "stock_analysis=info,market_data_ingestor=info";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Source {
    Alpaca,
    Csv,
}

impl From<Source> for SourceKind {
    fn from(s: Source) -> Self {
        match s {
            Source::Alpaca => SourceKind::Alpaca,
            Source::Csv => SourceKind::Csv,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Stock analysis dashboard: indicators, news sentiment and a 30-day forecast")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Comma-separated ticker symbols, e.g. AAPL,MSFT.
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,

    /// First day (YYYY-MM-DD). Defaults to 2020-01-01.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long, value_enum)]
    source: Option<Source>,

    /// Directory of <SYMBOL>.csv files for --source csv.
    #[arg(long, value_name = "DIR")]
    csv_dir: Option<PathBuf>,

    /// Train the LSTM and forecast the next 30 days.
    #[arg(long)]
    predict: bool,

    /// Seed for reproducible forecasts.
    #[arg(long)]
    seed: Option<u64>,

    /// Score recent headlines (needs NEWS_API_KEY).
    #[arg(long)]
    sentiment: bool,

    /// Show the linear next-day baseline.
    #[arg(long)]
    baseline: bool,
}

impl Cli {
    /// Command-line flags win over the file.
    fn apply(&self, cfg: &mut DashboardConfig) {
        if !self.tickers.is_empty() {
            cfg.data.tickers = self.tickers.clone();
        }
        if self.start.is_some() {
            cfg.data.start = self.start;
        }
        if self.end.is_some() {
            cfg.data.end = self.end;
        }
        if let Some(source) = self.source {
            cfg.data.source = source.into();
        }
        if self.csv_dir.is_some() {
            cfg.data.csv_dir = self.csv_dir.clone();
        }
        if self.seed.is_some() {
            cfg.forecast.seed = self.seed;
        }
    }
}

fn price_provider(cfg: &DashboardConfig) -> Result<Box<dyn PriceProvider>> {
    let provider: Box<dyn PriceProvider> = match cfg.data.source {
        SourceKind::Alpaca => Box::new(AlpacaProvider::new().context("Alpaca credentials")?),
        SourceKind::Csv => {
            let dir = cfg
                .data
                .csv_dir
                .clone()
                .context("--source csv needs --csv-dir")?;
            Box::new(CsvProvider::new(dir)?)
        }
    };
    Ok(provider)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => load_config_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    cli.apply(&mut cfg);
    cfg.normalize()?;

    let start = cfg
        .data
        .start
        .or_else(|| NaiveDate::from_ymd_opt(2020, 1, 1))
        .context("default start date")?;
    let end = cfg.data.end.unwrap_or_else(|| Local::now().date_naive());
    let range = DateRange::new(start, end)?;

    let mut session = AnalysisSession::new(price_provider(&cfg)?);
    let data = session.load(&cfg.data.tickers, range).await?;

    let sentiment = if cli.sentiment {
        match NewsApiProvider::from_env(&cfg.news.api_key_env) {
            Ok(news) => {
                AnalysisSession::sentiment_all(
                    &news,
                    &SentimentLexicon::default(),
                    &cfg.data.tickers,
                    cfg.news.max_headlines,
                )
                .await
            }
            Err(e) => {
                warn!(error = %e, "news provider unavailable; sentiment shows no data");
                IndexMap::new()
            }
        }
    } else {
        IndexMap::new()
    };

    let forecasts = if cli.predict {
        let forecaster = Forecaster::new(ForecastConfig::from(&cfg.forecast));
        let shared = Arc::clone(&data);
        info!(tickers = data.enriched.len(), "forecasting");
        tokio::task::spawn_blocking(move || AnalysisSession::forecast_all(&shared, &forecaster))
            .await?
    } else {
        Vec::new()
    };

    let mut report = DashboardReport::new(&data);
    if cli.sentiment {
        report = report.with_sentiment(&sentiment);
    }
    if cli.predict {
        report = report.with_forecasts(&forecasts);
    }
    if cli.baseline {
        report = report.with_baseline();
    }
    print!("{}", report.render());

    Ok(())
}
