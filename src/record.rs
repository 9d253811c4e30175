//! # Article records
//! The persisted, immutable unit of the store, and the builder that derives it
//! from a raw article plus its sentiment.
//!
//! Sort keys are `<timestamp>_<suffix>`: a fixed-width RFC 3339 UTC timestamp
//! with millisecond precision followed by 32 random hex chars, so lexicographic
//! order equals chronological order and keys stay unique within a topic.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IngestError;
use crate::ingest::types::RawArticle;
use crate::sentiment::{SentimentLabel, SentimentResult};

pub const SORT_KEY_SEPARATOR: char = '_';
const SORT_KEY_TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Phrase-level polarity counts. `mixed` is reserved and always 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SentimentScore {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub mixed: u32,
}

/// Stored article. Also reads items written under the older field names
/// (`searchTerm`, `date`, `sourcecountry`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    #[serde(alias = "searchTerm")]
    pub topic: String,
    #[serde(alias = "date")]
    pub sort_key: String,
    pub article_id: Uuid,
    pub title: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, alias = "sourcecountry", skip_serializing_if = "Option::is_none")]
    pub source_country: Option<String>,
    #[serde(rename = "sentiment")]
    pub sentiment_label: SentimentLabel,
    pub raw_sentiment_score: i32,
    pub sentiment_score: SentimentScore,
    #[serde(default)]
    pub key_phrases: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
}

impl ArticleRecord {
    /// Timestamp portion of the sort key (everything before the separator).
    pub fn sort_timestamp(&self) -> &str {
        sort_key_timestamp(&self.sort_key)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_sort_key_time(&self.sort_key)
    }
}

/// Build an immutable record for `article` under `topic`.
///
/// Fails with [`IngestError::Validation`] when topic, title or url is blank.
pub fn build(
    topic: &str,
    article: &RawArticle,
    sentiment: &SentimentResult,
    now: DateTime<Utc>,
) -> Result<ArticleRecord, IngestError> {
    let topic = required(Some(topic), "topic")?;
    let title = required(article.title.as_deref(), "title")?;
    let source_url = required(article.url.as_deref(), "url")?;

    let positive = sentiment.positive_phrases.len();
    let negative = sentiment.negative_phrases.len();
    let neutral = sentiment.token_count.saturating_sub(positive + negative);

    let mut key_phrases = Vec::with_capacity(positive + negative);
    key_phrases.extend(sentiment.positive_phrases.iter().cloned());
    key_phrases.extend(sentiment.negative_phrases.iter().cloned());

    Ok(ArticleRecord {
        topic,
        sort_key: make_sort_key(now),
        article_id: Uuid::new_v4(),
        title,
        source_url,
        domain: optional(article.domain.as_deref()),
        source_country: optional(article.source_country.as_deref()),
        sentiment_label: sentiment.label,
        raw_sentiment_score: sentiment.raw_score,
        sentiment_score: SentimentScore {
            positive: to_u32(positive),
            negative: to_u32(negative),
            neutral: to_u32(neutral),
            mixed: 0,
        },
        key_phrases,
        entities: Vec::new(),
    })
}

pub fn make_sort_key(now: DateTime<Utc>) -> String {
    format!(
        "{}{}{}",
        now.format(SORT_KEY_TS_FORMAT),
        SORT_KEY_SEPARATOR,
        Uuid::new_v4().simple()
    )
}

pub fn sort_key_timestamp(key: &str) -> &str {
    key.split_once(SORT_KEY_SEPARATOR)
        .map(|(ts, _)| ts)
        .unwrap_or(key)
}

pub fn parse_sort_key_time(key: &str) -> Option<DateTime<Utc>> {
    let ts = sort_key_timestamp(key);
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            // Keys written without an offset designator.
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|n| n.and_utc())
        })
}

fn required(v: Option<&str>, field: &'static str) -> Result<String, IngestError> {
    match v.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(IngestError::Validation { field }),
    }
}

fn optional(v: Option<&str>) -> Option<String> {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
