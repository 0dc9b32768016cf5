//! News headlines and their sentiment scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article as returned by a [`NewsProvider`](crate::news::NewsProvider).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl NewsArticle {
    /// Text that gets scored: `"{title}. {description}"`.
    pub fn scoring_text(&self) -> String {
        format!("{}. {}", self.title, self.description.as_deref().unwrap_or(""))
    }
}

/// One scored headline. `sentiment` is a polarity in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineSentiment {
    pub title: String,
    pub sentiment: f64,
}

/// Coarse classification of a polarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Scores above `0.1` are positive, below `-0.1` negative.
    pub fn from_score(score: f64) -> Self {
        if score > 0.1 {
            Self::Positive
        } else if score < -0.1 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// Average polarity over a set of headlines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub average: f64,
    pub label: SentimentLabel,
}

impl SentimentSummary {
    /// `None` when there is nothing to summarize.
    pub fn from_headlines(headlines: &[HeadlineSentiment]) -> Option<Self> {
        if headlines.is_empty() {
            return None;
        }
        let average =
            headlines.iter().map(|h| h.sentiment).sum::<f64>() / headlines.len() as f64;
        Some(Self {
            average,
            label: SentimentLabel::from_score(average),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(sentiment: f64) -> HeadlineSentiment {
        HeadlineSentiment {
            title: "t".into(),
            sentiment,
        }
    }

    #[test]
    fn label_thresholds_are_exclusive() {
        assert_eq!(SentimentLabel::from_score(0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(0.11), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.5), SentimentLabel::Negative);
    }

    #[test]
    fn summary_averages_scores() {
        let s = SentimentSummary::from_headlines(&[h(0.5), h(0.1), h(0.0)]).unwrap();
        assert!((s.average - 0.2).abs() < 1e-12);
        assert_eq!(s.label, SentimentLabel::Positive);
        assert!(SentimentSummary::from_headlines(&[]).is_none());
    }

    #[test]
    fn scoring_text_joins_title_and_description() {
        let a = NewsArticle {
            title: "Shares rally".into(),
            description: Some("Strong quarter".into()),
            published_at: None,
            url: None,
        };
        assert_eq!(a.scoring_text(), "Shares rally. Strong quarter");
    }
}
