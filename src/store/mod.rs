//! # Record store
//! Append-only, per-topic partitioned persistence for [`ArticleRecord`]s.
//!
//! Records are never updated or deleted. Reads return a topic's records in
//! sort-key order, but callers that care about ordering (the aggregator)
//! re-sort anyway.

pub mod jsonl;
pub mod memory;

use anyhow::Result;

use crate::record::ArticleRecord;

pub use jsonl::JsonlFileStore;
pub use memory::MemoryStore;

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one record. Fails if the write could not be made durable.
    async fn put(&self, record: &ArticleRecord) -> Result<()>;

    /// All records stored under `topic`.
    async fn query_by_topic(&self, topic: &str) -> Result<Vec<ArticleRecord>>;

    /// Records whose sort key lies within `[from, to]`.
    ///
    /// `to` is compared as a prefix, so `to = "2025-03-07"` includes every
    /// record written on that day.
    async fn query_range(
        &self,
        topic: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<ArticleRecord>> {
        let mut all = self.query_by_topic(topic).await?;
        all.retain(|r| sort_key_in_range(&r.sort_key, from, to));
        Ok(all)
    }

    fn name(&self) -> &'static str;
}

pub(crate) fn sort_key_in_range(key: &str, from: Option<&str>, to: Option<&str>) -> bool {
    let after_from = from.map_or(true, |f| key >= f);
    let before_to = to.map_or(true, |t| {
        let end = key
            .char_indices()
            .nth(t.chars().count())
            .map(|(i, _)| i)
            .unwrap_or(key.len());
        &key[..end] <= t
    });
    after_from && before_to
}
