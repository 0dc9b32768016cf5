//! Technical indicators derived from daily closes.
//!
//! Every column is a causal function of the closes up to and including its
//! row, and has exactly one value per input row. Windowed columns are `None`
//! until their window is full. The exponential averages are seeded with the
//! first close, so they are defined from row 0.

use chrono::NaiveDate;
use market_data_ingestor::PriceSeries;
use thiserror::Error;

/// Window of the moving average and the Bollinger bands.
pub const MA_WINDOW: usize = 20;
/// Band width in standard deviations.
pub const BOLLINGER_K: f64 = 2.0;
/// RSI look-back, in price changes.
pub const RSI_PERIOD: usize = 14;
pub const EMA_FAST: usize = 12;
pub const EMA_SLOW: usize = 26;
pub const SIGNAL_SPAN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("{symbol}: {rows} rows is too few to compute indicators (need at least {required})")]
    TooFewRows {
        symbol: String,
        rows: usize,
        required: usize,
    },
}

/// `close[t] / close[t-1] - 1`, `None` at row 0.
///
/// A return is also `None` when the previous close is zero.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(closes.windows(2).map(|w| {
        let r = w[1] / w[0] - 1.0;
        r.is_finite().then_some(r)
    }));
    out
}

/// Trailing mean over `window` rows, inclusive of the current row.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing sample standard deviation (`n - 1` denominator).
///
/// Needs a window of at least 2; smaller windows yield all `None`.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }
    rolling(values, window, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let ss: f64 = w.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    })
}

fn rolling(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    if window == 0 || window > values.len() {
        return vec![None; values.len()];
    }
    let mut out = vec![None; window - 1];
    out.extend(values.windows(window).map(|w| Some(f(w))));
    out
}

/// Exponential moving average with `alpha = 2 / (span + 1)`, seeded with the
/// first value and without bias adjustment.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = None;
    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Relative strength index from simple averages of the last `period` price
/// changes.
///
/// Row `t` needs `period` changes, so the first defined row is `period`.
/// With no losses in the window the value is exactly 100, flat windows
/// included.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // deltas[t - 1] is the change into row t.
    for (t, slot) in out.iter_mut().enumerate().skip(period) {
        let window = &deltas[t - period..t];
        let gain = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
        let loss = -window.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;
        *slot = Some(if loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + gain / loss)
        });
    }
    out
}

/// MACD line and its signal, with both underlying averages.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);
    let line: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let signal = ema(&line, signal);
    Macd {
        ema_fast,
        ema_slow,
        macd: line,
        signal,
    }
}

/// One row of an [`EnrichedSeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedRow {
    pub date: NaiveDate,
    pub close: f64,
    pub daily_return: Option<f64>,
    pub ma20: Option<f64>,
    pub std20: Option<f64>,
    pub upper_bb: Option<f64>,
    pub lower_bb: Option<f64>,
    pub rsi14: Option<f64>,
    pub ema12: f64,
    pub ema26: f64,
    pub macd: f64,
    pub signal: f64,
}

/// A price series together with its indicator columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    series: PriceSeries,
    daily_return: Vec<Option<f64>>,
    ma20: Vec<Option<f64>>,
    std20: Vec<Option<f64>>,
    upper_bb: Vec<Option<f64>>,
    lower_bb: Vec<Option<f64>>,
    rsi14: Vec<Option<f64>>,
    macd: Macd,
}

impl EnrichedSeries {
    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn daily_return(&self) -> &[Option<f64>] {
        &self.daily_return
    }

    pub fn ma20(&self) -> &[Option<f64>] {
        &self.ma20
    }

    pub fn std20(&self) -> &[Option<f64>] {
        &self.std20
    }

    pub fn upper_bb(&self) -> &[Option<f64>] {
        &self.upper_bb
    }

    pub fn lower_bb(&self) -> &[Option<f64>] {
        &self.lower_bb
    }

    pub fn rsi14(&self) -> &[Option<f64>] {
        &self.rsi14
    }

    pub fn ema12(&self) -> &[f64] {
        &self.macd.ema_fast
    }

    pub fn ema26(&self) -> &[f64] {
        &self.macd.ema_slow
    }

    pub fn macd(&self) -> &[f64] {
        &self.macd.macd
    }

    pub fn signal(&self) -> &[f64] {
        &self.macd.signal
    }

    /// Row `i`, or `None` past the end.
    pub fn row(&self, i: usize) -> Option<EnrichedRow> {
        let bar = self.series.bars().get(i)?;
        Some(EnrichedRow {
            date: bar.date,
            close: bar.close,
            daily_return: self.daily_return[i],
            ma20: self.ma20[i],
            std20: self.std20[i],
            upper_bb: self.upper_bb[i],
            lower_bb: self.lower_bb[i],
            rsi14: self.rsi14[i],
            ema12: self.macd.ema_fast[i],
            ema26: self.macd.ema_slow[i],
            macd: self.macd.macd[i],
            signal: self.macd.signal[i],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = EnrichedRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    pub fn latest(&self) -> Option<EnrichedRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// Mean of all defined daily returns.
    pub fn average_return(&self) -> Option<f64> {
        let defined: Vec<f64> = self.daily_return.iter().flatten().copied().collect();
        (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

/// Derives every indicator column for `series`.
///
/// Fails with [`IndicatorError::TooFewRows`] below two rows, where not even a
/// daily return exists.
pub fn compute_indicators(series: &PriceSeries) -> Result<EnrichedSeries, IndicatorError> {
    if series.len() < 2 {
        return Err(IndicatorError::TooFewRows {
            symbol: series.symbol().to_string(),
            rows: series.len(),
            required: 2,
        });
    }
    let closes = series.closes();

    let ma20 = rolling_mean(&closes, MA_WINDOW);
    let std20 = rolling_std(&closes, MA_WINDOW);
    let band = |sign: f64| -> Vec<Option<f64>> {
        ma20.iter()
            .zip(&std20)
            .map(|(m, s)| Some((*m)? + sign * BOLLINGER_K * (*s)?))
            .collect()
    };
    let upper_bb = band(1.0);
    let lower_bb = band(-1.0);

    Ok(EnrichedSeries {
        daily_return: daily_returns(&closes),
        rsi14: rsi(&closes, RSI_PERIOD),
        macd: macd(&closes, EMA_FAST, EMA_SLOW, SIGNAL_SPAN),
        ma20,
        std20,
        upper_bb,
        lower_bb,
        series: series.clone(),
    })
}
