//! # Sentiment
//! Lexicon-based headline scorer (AFINN-style word weights in `[-5, 5]`).
//!
//! Deterministic and pure: the same text always yields the same
//! [`SentimentResult`]. Malformed input (empty, punctuation only) scores as
//! neutral instead of failing.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// How many preceding tokens are checked for a negator.
const NEGATION_WINDOW: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s > 0 => SentimentLabel::Positive,
            s if s < 0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub raw_score: i32,
    /// Tokens with an effective positive weight, one entry per occurrence.
    pub positive_phrases: Vec<String>,
    /// Tokens with an effective negative weight, one entry per occurrence.
    pub negative_phrases: Vec<String>,
    pub token_count: usize,
}

impl SentimentResult {
    /// Score normalized by token count (0.0 for empty text).
    pub fn comparative(&self) -> f32 {
        if self.token_count == 0 {
            0.0
        } else {
            self.raw_score as f32 / self.token_count as f32
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer {
    /// Operator-supplied weights; take precedence over the embedded lexicon.
    extras: HashMap<String, i32>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with extra lexicon entries. Keys are lower-cased on the way in.
    pub fn with_extras(extras: HashMap<String, i32>) -> Self {
        let extras = extras
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.clamp(-5, 5)))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { extras }
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        self.extras
            .get(w)
            .or_else(|| LEXICON.get(w))
            .copied()
            .unwrap_or(0)
    }

    /// Score a piece of text.
    ///
    /// A negator directly before a lexicon word inverts that word's weight,
    /// and the word is filed under the phrase list matching its effective sign.
    pub fn score(&self, text: &str) -> SentimentResult {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut raw_score: i32 = 0;
        let mut positive_phrases = Vec::new();
        let mut negative_phrases = Vec::new();

        for (i, tok) in tokens.iter().enumerate() {
            let base = self.word_score(tok);
            if base == 0 {
                continue;
            }

            let negated = (1..=NEGATION_WINDOW).any(|k| i >= k && is_negator(&tokens[i - k]));
            let adj = if negated { -base } else { base };
            raw_score += adj;

            if adj > 0 {
                positive_phrases.push(tok.clone());
            } else {
                negative_phrases.push(tok.clone());
            }
        }

        SentimentResult {
            label: SentimentLabel::from_score(raw_score),
            raw_score,
            positive_phrases,
            negative_phrases,
            token_count: tokens.len(),
        }
    }
}

/// Lower-cased word tokens. Apostrophes are dropped so contractions stay whole
/// ("don't" -> "dont"); hyphenated words are kept together.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\'' || c == '\u{2019}'))
        .map(|t| {
            t.chars()
                .filter(|c| *c != '\'' && *c != '\u{2019}')
                .collect::<String>()
                .trim_matches('-')
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
}

/// Negators recognised in front of a lexicon word. Contractions arrive here
/// without their apostrophe.
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "non" | "cant" | "dont" | "doesnt" | "isnt" | "wont"
    )
}
