//! Error kinds surfaced by the ingestion pipeline.
//!
//! All variants reach the caller untranslated; retry policy (if any) belongs
//! to whoever called `ingest` / `analyze_topic`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The article source returned nothing for the topic.
    #[error("no articles found for topic '{topic}'")]
    NoArticles { topic: String },

    /// A required field was absent or blank.
    #[error("invalid article: missing required field '{field}'")]
    Validation { field: &'static str },

    /// The record store rejected a write. Earlier writes of the batch stay persisted.
    #[error("failed to persist record {sort_key} for topic '{topic}': {source:#}")]
    Persistence {
        topic: String,
        sort_key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The article source itself failed (network, decode, upstream status).
    #[error("failed to fetch articles for topic '{topic}': {source:#}")]
    Fetch {
        topic: String,
        #[source]
        source: anyhow::Error,
    },
}

impl IngestError {
    /// Short, stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::NoArticles { .. } => "no_articles",
            IngestError::Validation { .. } => "validation",
            IngestError::Persistence { .. } => "persistence",
            IngestError::Fetch { .. } => "fetch",
        }
    }
}
