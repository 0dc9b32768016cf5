//! Linear baseline: next-day close from today's open, high, low and volume.
//!
//! Ordinary least squares with an intercept, solved through the normal
//! equations on standardized features. Useful as a sanity reference next to
//! the LSTM forecast.

use chrono::NaiveDate;
use market_data_ingestor::{DailyBar, PriceSeries};
use ndarray::{Array1, Array2};
use thiserror::Error;

/// open, high, low, volume
pub const FEATURES: usize = 4;
/// Intercept plus one coefficient per feature.
const PARAMS: usize = FEATURES + 1;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BaselineError {
    #[error("{symbol}: bar on {date} lacks open, high, low or volume")]
    MissingFeatures { symbol: String, date: NaiveDate },

    #[error("{symbol}: {rows} rows is too few for a linear fit (need at least {required})")]
    TooFewRows {
        symbol: String,
        rows: usize,
        required: usize,
    },

    #[error("{symbol}: features are collinear, the fit has no unique solution")]
    Singular { symbol: String },
}

fn features(bar: &DailyBar) -> Option<[f64; FEATURES]> {
    Some([bar.open?, bar.high?, bar.low?, bar.volume?])
}

/// Fitted `close[t + 1] ~ intercept + coef . [open, high, low, volume][t]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearBaseline {
    symbol: String,
    intercept: f64,
    coefficients: [f64; FEATURES],
    /// In-sample root mean squared error, in price units.
    rmse: f64,
}

impl LinearBaseline {
    /// Rows needed for more training pairs than parameters.
    pub const MIN_ROWS: usize = PARAMS + 2;

    pub fn fit(series: &PriceSeries) -> Result<Self, BaselineError> {
        let symbol = series.symbol().to_string();
        let bars = series.bars();
        if bars.len() < Self::MIN_ROWS {
            return Err(BaselineError::TooFewRows {
                symbol,
                rows: bars.len(),
                required: Self::MIN_ROWS,
            });
        }

        let mut xs = Vec::with_capacity(bars.len() - 1);
        for bar in &bars[..bars.len() - 1] {
            let row = features(bar).ok_or_else(|| BaselineError::MissingFeatures {
                symbol: symbol.clone(),
                date: bar.date,
            })?;
            xs.push(row);
        }
        let ys: Vec<f64> = bars[1..].iter().map(|b| b.close).collect();
        let n = xs.len() as f64;

        // Standardize so volume (~1e7) and prices (~1e2) share a scale.
        let mut means = [0.0; FEATURES];
        let mut scales = [0.0; FEATURES];
        for j in 0..FEATURES {
            means[j] = xs.iter().map(|x| x[j]).sum::<f64>() / n;
            let var = xs.iter().map(|x| (x[j] - means[j]).powi(2)).sum::<f64>() / n;
            scales[j] = var.sqrt();
            if scales[j] == 0.0 {
                return Err(BaselineError::Singular { symbol });
            }
        }

        let design = Array2::from_shape_fn((xs.len(), PARAMS), |(i, j)| match j {
            0 => 1.0,
            j => (xs[i][j - 1] - means[j - 1]) / scales[j - 1],
        });
        let y = Array1::from(ys.clone());
        let xtx = design.t().dot(&design);
        let xty = design.t().dot(&y);
        let beta = solve(xtx, xty).ok_or_else(|| BaselineError::Singular {
            symbol: symbol.clone(),
        })?;

        let mut coefficients = [0.0; FEATURES];
        let mut intercept = beta[0];
        for j in 0..FEATURES {
            coefficients[j] = beta[j + 1] / scales[j];
            intercept -= coefficients[j] * means[j];
        }

        let mut fitted = Self {
            symbol,
            intercept,
            coefficients,
            rmse: 0.0,
        };
        let sse: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (fitted.apply(x) - y).powi(2))
            .sum();
        fitted.rmse = (sse / n).sqrt();
        Ok(fitted)
    }

    fn apply(&self, x: &[f64; FEATURES]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64; FEATURES] {
        &self.coefficients
    }

    pub fn rmse(&self) -> f64 {
        self.rmse
    }

    /// Predicted close for the day after `bar`; `None` if a feature is missing.
    pub fn predict(&self, bar: &DailyBar) -> Option<f64> {
        features(bar).map(|x| self.apply(&x))
    }

    /// Predicted close for the day after the last bar of `series`.
    pub fn predict_next(&self, series: &PriceSeries) -> Result<f64, BaselineError> {
        let Some(last) = series.last() else {
            return Err(BaselineError::TooFewRows {
                symbol: series.symbol().to_string(),
                rows: 0,
                required: 1,
            });
        };
        self.predict(last).ok_or_else(|| BaselineError::MissingFeatures {
            symbol: series.symbol().to_string(),
            date: last.date,
        })
    }
}

/// Solves `a x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() < 1e-10 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            b.swap(pivot, col);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(x)
}
