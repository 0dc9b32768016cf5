//! Next-30-day close forecast from a univariate price series.
//!
//! The pipeline: min-max scale the closes, cut them into sliding windows of
//! `lookback = min(60, len - 1)` values each predicting the next value, fit
//! a two-layer LSTM on those pairs, then roll the model forward 30 times,
//! feeding each prediction back into the window. A fresh model is trained
//! for every call; nothing is cached.

mod adam;
mod config;
mod lstm;
pub mod metrics;
mod scaler;
mod window;

use chrono::{Days, NaiveDate};
use market_data_ingestor::PriceSeries;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use thiserror::Error;
use tracing::{debug, info};

pub use adam::Adam;
pub use config::ForecastConfig;
pub use lstm::LstmRegressor;
pub use scaler::MinMaxScaler;
pub use window::{RolloutWindow, training_pairs};

/// Number of forecast steps.
pub const HORIZON: usize = 30;
/// Upper bound on the model's input window.
pub const MAX_LOOKBACK: usize = 60;
/// Shortest history worth forecasting: one full window plus its target.
pub const MIN_FORECAST_ROWS: usize = MAX_LOOKBACK + 1;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// The input cannot form a single training pair.
    #[error("need at least 2 closes to forecast, got {rows}")]
    InsufficientData { rows: usize },

    /// Bad input shape or values, or training/prediction produced
    /// non-finite numbers.
    #[error("{0}")]
    Training(String),
}

/// Closes to forecast from, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    symbol: String,
    closes: Vec<f64>,
    last_date: NaiveDate,
}

impl ForecastRequest {
    pub fn new(symbol: impl Into<String>, closes: Vec<f64>, last_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            closes,
            last_date,
        }
    }

    /// `None` for an empty series.
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        let last = series.last()?;
        Some(Self::new(series.symbol(), series.closes(), last.date))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn horizon(&self) -> usize {
        HORIZON
    }

    /// `min(60, len - 1)`.
    pub fn lookback(&self) -> usize {
        MAX_LOOKBACK.min(self.closes.len().saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// In-sample error of the fitted model, in price units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitMetrics {
    pub rmse: f64,
    pub mae: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub symbol: String,
    pub lookback: usize,
    /// Exactly [`HORIZON`] points, dated by calendar day after the last close.
    pub points: Vec<ForecastPoint>,
    pub fit: FitMetrics,
}

impl ForecastResult {
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}

/// Anything that turns a price series into a [`ForecastResult`].
pub trait SeriesForecaster {
    fn forecast_series(&self, series: &PriceSeries) -> Result<ForecastResult, ForecastError>;
}

/// Trains an LSTM per request and rolls it forward [`HORIZON`] steps.
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResult, ForecastError> {
        let closes = request.closes();
        let rows = closes.len();
        if rows < 2 {
            return Err(ForecastError::InsufficientData { rows });
        }
        if self.config.hidden_units == 0 || self.config.batch_size == 0 {
            return Err(ForecastError::Training(
                "hidden_units and batch_size must be positive".to_string(),
            ));
        }
        let scaler = MinMaxScaler::fit(closes).ok_or_else(|| {
            ForecastError::Training(format!("{}: closes contain non-finite values", request.symbol()))
        })?;
        let lookback = request.lookback();

        if scaler.is_constant() {
            info!(ticker = request.symbol(), "constant series; forecasting the constant");
            let points = dated_points(request.last_date(), &[scaler.min(); HORIZON])?;
            return Ok(ForecastResult {
                symbol: request.symbol().to_string(),
                lookback,
                points,
                fit: FitMetrics { rmse: 0.0, mae: 0.0 },
            });
        }

        let scaled = scaler.transform_all(closes);
        let pairs = training_pairs(&scaled, lookback);
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut model = LstmRegressor::new(self.config.hidden_units, &mut rng);
        let mut adam = Adam::new(self.config.learning_rate);

        info!(
            ticker = request.symbol(),
            rows,
            lookback,
            samples = pairs.len(),
            hidden = model.hidden_units(),
            epochs = self.config.epochs,
            "training forecaster"
        );

        let mut order: Vec<usize> = (0..pairs.len()).collect();
        for epoch in 1..=self.config.epochs {
            order.shuffle(&mut rng);
            let mut total = 0.0;
            for chunk in order.chunks(self.config.batch_size) {
                let windows: Vec<&[f64]> = chunk.iter().map(|&i| pairs[i].0).collect();
                let targets: Vec<f64> = chunk.iter().map(|&i| pairs[i].1).collect();
                let loss = model.train_batch(&windows, &targets, &mut adam);
                if !loss.is_finite() {
                    return Err(ForecastError::Training(format!(
                        "{}: training loss became non-finite in epoch {epoch}",
                        request.symbol()
                    )));
                }
                total += loss * chunk.len() as f64;
            }
            debug!(ticker = request.symbol(), epoch, loss = total / pairs.len() as f64, "epoch done");
        }

        let fit = self.in_sample_fit(&model, &pairs, &scaler, &closes[lookback..]);

        let mut window = RolloutWindow::from_tail(&scaled, lookback).ok_or_else(|| {
            ForecastError::Training(format!("{}: history shorter than lookback", request.symbol()))
        })?;
        let mut predicted = Vec::with_capacity(HORIZON);
        for step in 1..=HORIZON {
            let input = window.to_vec();
            let next = model.predict(&[input.as_slice()]).first().copied().unwrap_or(f64::NAN);
            if !next.is_finite() {
                return Err(ForecastError::Training(format!(
                    "{}: prediction {step} is not a finite number",
                    request.symbol()
                )));
            }
            window.push(next);
            predicted.push(scaler.inverse(next));
        }

        Ok(ForecastResult {
            symbol: request.symbol().to_string(),
            lookback,
            points: dated_points(request.last_date(), &predicted)?,
            fit,
        })
    }

    fn in_sample_fit(
        &self,
        model: &LstmRegressor,
        pairs: &[(&[f64], f64)],
        scaler: &MinMaxScaler,
        actual: &[f64],
    ) -> FitMetrics {
        let mut fitted = Vec::with_capacity(pairs.len());
        for chunk in pairs.chunks(self.config.batch_size) {
            let windows: Vec<&[f64]> = chunk.iter().map(|(w, _)| *w).collect();
            fitted.extend(model.predict(&windows).into_iter().map(|v| scaler.inverse(v)));
        }
        FitMetrics {
            rmse: metrics::rmse(actual, &fitted),
            mae: metrics::mae(actual, &fitted),
        }
    }
}

impl SeriesForecaster for Forecaster {
    fn forecast_series(&self, series: &PriceSeries) -> Result<ForecastResult, ForecastError> {
        let request = ForecastRequest::from_series(series)
            .ok_or(ForecastError::InsufficientData { rows: 0 })?;
        self.forecast(&request)
    }
}

/// Dates predictions by calendar day: `last + 1`, `last + 2`, ...
fn dated_points(last: NaiveDate, closes: &[f64]) -> Result<Vec<ForecastPoint>, ForecastError> {
    closes
        .iter()
        .zip(1u64..)
        .map(|(&close, offset)| {
            let date = last
                .checked_add_days(Days::new(offset))
                .ok_or_else(|| ForecastError::Training(format!("date overflow after {last}")))?;
            Ok(ForecastPoint { date, close })
        })
        .collect()
}
