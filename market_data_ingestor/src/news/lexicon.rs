//! Rule-based polarity scoring for short financial text.
//!
//! Each known word carries a score in `[-1, 1]`. A negation word flips the
//! sign of the next scored word, an intensifier scales it. The polarity of a
//! text is the mean of its scored words, clamped to `[-1, 1]`, or `0.0` when
//! nothing matched.

use std::collections::{HashMap, HashSet};

const POSITIVE: &[(&str, f64)] = &[
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("best", 1.0),
    ("better", 0.5),
    ("happy", 0.8),
    ("win", 0.8),
    ("success", 0.6),
    ("successful", 0.75),
    ("bullish", 0.8),
    ("surge", 0.7),
    ("rally", 0.7),
    ("soar", 0.8),
    ("gain", 0.5),
    ("profit", 0.6),
    ("profitable", 0.6),
    ("growth", 0.6),
    ("rise", 0.5),
    ("jump", 0.5),
    ("climb", 0.4),
    ("increase", 0.5),
    ("improve", 0.5),
    ("outperform", 0.7),
    ("beat", 0.6),
    ("exceed", 0.6),
    ("strong", 0.5),
    ("positive", 0.5),
    ("optimistic", 0.6),
    ("confident", 0.5),
    ("record", 0.6),
    ("high", 0.3),
    ("upgrade", 0.6),
    ("buy", 0.5),
    ("breakout", 0.6),
    ("recovery", 0.5),
    ("rebound", 0.5),
    ("boost", 0.5),
    ("innovative", 0.5),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("bad", -0.7),
    ("poor", -0.4),
    ("terrible", -1.0),
    ("worst", -1.0),
    ("worse", -0.5),
    ("sad", -0.5),
    ("bearish", -0.8),
    ("crash", -0.9),
    ("plunge", -0.8),
    ("tumble", -0.7),
    ("slump", -0.7),
    ("drop", -0.6),
    ("fall", -0.5),
    ("decline", -0.6),
    ("loss", -0.6),
    ("down", -0.4),
    ("decrease", -0.5),
    ("weak", -0.5),
    ("negative", -0.5),
    ("pessimistic", -0.6),
    ("concern", -0.5),
    ("worry", -0.5),
    ("fear", -0.6),
    ("risk", -0.4),
    ("volatile", -0.3),
    ("uncertainty", -0.5),
    ("miss", -0.6),
    ("disappoint", -0.7),
    ("underperform", -0.6),
    ("downgrade", -0.6),
    ("sell", -0.5),
    ("lawsuit", -0.6),
    ("layoff", -0.6),
    ("crisis", -0.8),
    ("warning", -0.5),
    ("trouble", -0.6),
    ("problem", -0.5),
    ("fail", -0.7),
    ("fraud", -0.9),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "none", "nothing", "cannot", "cant", "dont",
    "doesnt", "didnt", "wont", "wouldnt", "shouldnt", "couldnt", "isnt", "arent", "wasnt",
    "werent", "hardly", "barely",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("significantly", 1.3),
    ("sharply", 1.4),
    ("dramatically", 1.5),
    ("massively", 1.5),
    ("slightly", 0.5),
    ("somewhat", 0.7),
    ("marginally", 0.5),
];

/// Suffixes tried, in order, when a word is not found verbatim.
const SUFFIXES: &[&str] = &["ing", "ed", "es", "s", "d"];

/// Word-score lexicon with negation and intensifier handling.
#[derive(Debug, Clone)]
pub struct SentimentLexicon {
    words: HashMap<String, f64>,
    negations: HashSet<String>,
    intensifiers: HashMap<String, f64>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            words: POSITIVE
                .iter()
                .chain(NEGATIVE)
                .map(|(w, s)| (w.to_string(), *s))
                .collect(),
            negations: NEGATIONS.iter().map(|w| w.to_string()).collect(),
            intensifiers: INTENSIFIERS.iter().map(|(w, m)| (w.to_string(), *m)).collect(),
        }
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .map(|raw| {
            raw.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
}

impl SentimentLexicon {
    /// Adds or replaces a word score. The score is clamped to `[-1, 1]`.
    pub fn with_word(mut self, word: &str, score: f64) -> Self {
        self.words
            .insert(word.to_lowercase(), score.clamp(-1.0, 1.0));
        self
    }

    /// Score of a single lower-case word, trying a few inflection suffixes.
    fn score(&self, word: &str) -> Option<f64> {
        if let Some(s) = self.words.get(word) {
            return Some(*s);
        }
        SUFFIXES.iter().find_map(|suffix| {
            let stem = word.strip_suffix(suffix)?;
            if stem.len() < 3 {
                return None;
            }
            self.words.get(stem).copied()
        })
    }

    /// Polarity of `text` in `[-1, 1]`.
    pub fn polarity(&self, text: &str) -> f64 {
        let mut scores = Vec::new();
        let mut negate_next = false;
        let mut intensity = 1.0;

        for word in tokenize(text) {
            if self.negations.contains(&word) {
                negate_next = true;
                continue;
            }
            if let Some(mult) = self.intensifiers.get(&word) {
                intensity = *mult;
                continue;
            }
            if let Some(mut score) = self.score(&word) {
                if negate_next {
                    // A negated word carries half its weight with the sign flipped.
                    score = -0.5 * score;
                    negate_next = false;
                }
                scores.push((score * intensity).clamp(-1.0, 1.0));
                intensity = 1.0;
            }
        }

        if scores.is_empty() {
            return 0.0;
        }
        (scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_text_scores_zero() {
        let lex = SentimentLexicon::default();
        assert_eq!(lex.polarity("Apple to hold annual meeting on Tuesday"), 0.0);
        assert_eq!(lex.polarity(""), 0.0);
    }

    #[test]
    fn positive_and_negative_headlines() {
        let lex = SentimentLexicon::default();
        assert!(lex.polarity("Shares surge after strong earnings beat") > 0.1);
        assert!(lex.polarity("Stock plunges on fraud lawsuit") < -0.1);
    }

    #[test]
    fn inflections_are_matched() {
        let lex = SentimentLexicon::default();
        assert!(lex.polarity("surged") > 0.0);
        assert!(lex.polarity("declines") < 0.0);
    }

    #[test]
    fn negation_flips_sign() {
        let lex = SentimentLexicon::default();
        assert!(lex.polarity("results were good") > 0.0);
        assert!(lex.polarity("results were not good") < 0.0);
    }

    #[test]
    fn intensifier_scales_but_stays_bounded() {
        let lex = SentimentLexicon::default();
        let plain = lex.polarity("strong quarter");
        let boosted = lex.polarity("extremely strong quarter");
        assert!(boosted > plain);
        assert!(lex.polarity("extremely excellent") <= 1.0);
        assert!(lex.polarity("extremely terrible") >= -1.0);
    }

    #[test]
    fn custom_words_are_clamped() {
        let lex = SentimentLexicon::default().with_word("moon", 5.0);
        assert_eq!(lex.polarity("MOON!"), 1.0);
    }
}
