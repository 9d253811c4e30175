// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod heatmap;
pub mod ingest;
pub mod metrics;
pub mod record;
pub mod sentiment;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{aggregate, AggregateView};
pub use crate::api::{router, AppState};
pub use crate::error::IngestError;
pub use crate::heatmap::{color_for, Rgb};
pub use crate::ingest::types::{ArticleSource, RawArticle};
pub use crate::ingest::IngestPipeline;
pub use crate::record::ArticleRecord;
pub use crate::sentiment::{SentimentAnalyzer, SentimentLabel, SentimentResult};
pub use crate::store::RecordStore;
