//! Plain-text dashboard rendering.
//!
//! Rendering is pure: everything shown is computed from the inputs, and the
//! output is a `String` (through [`Display`](fmt::Display)).

use std::fmt;

use indexmap::IndexMap;
use market_data_ingestor::{HeadlineSentiment, SentimentSummary};

use crate::{
    baseline::LinearBaseline,
    indicators::EnrichedSeries,
    session::{SessionData, TickerForecast},
};

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

pub fn rsi_label(rsi: f64) -> &'static str {
    if rsi >= RSI_OVERBOUGHT {
        "overbought"
    } else if rsi <= RSI_OVERSOLD {
        "oversold"
    } else {
        "neutral"
    }
}

fn num(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn pct(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{:+.2}%", v * 100.0))
}

/// The whole dashboard for one session load.
pub struct DashboardReport<'a> {
    data: &'a SessionData,
    forecasts: Option<&'a [TickerForecast]>,
    sentiment: Option<&'a IndexMap<String, Vec<HeadlineSentiment>>>,
    baseline: bool,
}

impl<'a> DashboardReport<'a> {
    pub fn new(data: &'a SessionData) -> Self {
        Self {
            data,
            forecasts: None,
            sentiment: None,
            baseline: false,
        }
    }

    pub fn with_forecasts(mut self, forecasts: &'a [TickerForecast]) -> Self {
        self.forecasts = Some(forecasts);
        self
    }

    pub fn with_sentiment(mut self, sentiment: &'a IndexMap<String, Vec<HeadlineSentiment>>) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Adds the linear next-day baseline to each ticker.
    pub fn with_baseline(mut self) -> Self {
        self.baseline = true;
        self
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    fn price_section(f: &mut fmt::Formatter<'_>, enriched: &EnrichedSeries) -> fmt::Result {
        let Some(latest) = enriched.latest() else {
            return writeln!(f, "Price       no rows");
        };
        let change = enriched
            .len()
            .checked_sub(2)
            .and_then(|i| enriched.row(i))
            .map(|prev| latest.close - prev.close);
        writeln!(
            f,
            "Price       close {:.2} on {}, change {} ({})",
            latest.close,
            latest.date,
            change.map_or_else(|| "n/a".to_string(), |c| format!("{c:+.2}")),
            pct(latest.daily_return),
        )?;
        writeln!(
            f,
            "            MA20 {}  Bollinger [{}, {}]",
            num(latest.ma20),
            num(latest.lower_bb),
            num(latest.upper_bb),
        )?;
        let rsi = match latest.rsi14 {
            Some(v) => format!("{v:.1} ({})", rsi_label(v)),
            None => "n/a".to_string(),
        };
        writeln!(
            f,
            "Indicators  RSI(14) {rsi}  MACD {:.3}  signal {:.3}",
            latest.macd, latest.signal
        )?;
        writeln!(
            f,
            "Returns     latest {}  average {}",
            pct(latest.daily_return),
            pct(enriched.average_return()),
        )
    }

    fn sentiment_section(f: &mut fmt::Formatter<'_>, headlines: &[HeadlineSentiment]) -> fmt::Result {
        let Some(summary) = SentimentSummary::from_headlines(headlines) else {
            return writeln!(f, "Sentiment   no news data available");
        };
        writeln!(f, "Sentiment   {:+.2} {:?}", summary.average, summary.label)?;
        for h in headlines {
            writeln!(f, "    [{:+.2}] {}", h.sentiment, h.title)?;
        }
        Ok(())
    }

    fn forecast_section(f: &mut fmt::Formatter<'_>, forecast: &TickerForecast) -> fmt::Result {
        match &forecast.outcome {
            Ok(result) => {
                writeln!(
                    f,
                    "Forecast    {} days, lookback {}, in-sample RMSE {:.2} MAE {:.2}",
                    result.points.len(),
                    result.lookback,
                    result.fit.rmse,
                    result.fit.mae,
                )?;
                for p in &result.points {
                    writeln!(f, "    {}  {:.2}", p.date, p.close)?;
                }
                Ok(())
            }
            Err(e) => writeln!(f, "Forecast    unavailable: {e}"),
        }
    }

    fn baseline_section(f: &mut fmt::Formatter<'_>, enriched: &EnrichedSeries) -> fmt::Result {
        let series = enriched.series();
        let outcome = LinearBaseline::fit(series)
            .and_then(|model| Ok((model.predict_next(series)?, model.rmse())));
        match outcome {
            Ok((next, rmse)) => writeln!(
                f,
                "Baseline    linear next-day close {next:.2} (in-sample RMSE {rmse:.2})"
            ),
            Err(e) => writeln!(f, "Baseline    unavailable: {e}"),
        }
    }
}

impl fmt::Display for DashboardReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.data.range;
        writeln!(
            f,
            "Stock dashboard {} to {} ({} calendar days)",
            range.start(),
            range.end(),
            range.calendar_days()
        )?;
        for warning in &self.data.warnings {
            writeln!(f, "warning: {warning}")?;
        }

        for (ticker, enriched) in &self.data.enriched {
            writeln!(f)?;
            writeln!(f, "== {ticker} ({} rows) ==", enriched.len())?;
            Self::price_section(f, enriched)?;

            if let Some(sentiment) = self.sentiment {
                let headlines = sentiment.get(ticker).map_or(&[][..], Vec::as_slice);
                Self::sentiment_section(f, headlines)?;
            }
            if self.baseline {
                Self::baseline_section(f, enriched)?;
            }
            if let Some(forecast) = self
                .forecasts
                .and_then(|all| all.iter().find(|fc| &fc.ticker == ticker))
            {
                Self::forecast_section(f, forecast)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_labels_use_inclusive_thresholds() {
        assert_eq!(rsi_label(70.0), "overbought");
        assert_eq!(rsi_label(99.0), "overbought");
        assert_eq!(rsi_label(30.0), "oversold");
        assert_eq!(rsi_label(50.0), "neutral");
    }

    #[test]
    fn formatting_helpers() {
        assert_eq!(num(None), "n/a");
        assert_eq!(num(Some(1.234)), "1.23");
        assert_eq!(pct(Some(0.0123)), "+1.23%");
        assert_eq!(pct(Some(-0.5)), "-50.00%");
    }
}
