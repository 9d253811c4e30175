//! In-memory record store, keyed by topic and then sort key.

use anyhow::{anyhow, bail, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::RecordStore;
use crate::record::ArticleRecord;

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, BTreeMap<String, ArticleRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all topics.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|m| m.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, record: &ArticleRecord) -> Result<()> {
        let mut m = self
            .inner
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?;
        let partition = m.entry(record.topic.clone()).or_default();
        if partition.contains_key(&record.sort_key) {
            bail!(
                "duplicate sort key {} for topic '{}'",
                record.sort_key,
                record.topic
            );
        }
        partition.insert(record.sort_key.clone(), record.clone());
        Ok(())
    }

    async fn query_by_topic(&self, topic: &str) -> Result<Vec<ArticleRecord>> {
        let m = self
            .inner
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?;
        Ok(m.get(topic)
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn query_range(
        &self,
        topic: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<ArticleRecord>> {
        let m = self
            .inner
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?;
        let Some(p) = m.get(topic) else {
            return Ok(Vec::new());
        };
        // BTreeMap iteration is already in key order; skip straight to `from`.
        let iter: Box<dyn Iterator<Item = &ArticleRecord> + '_> = match from {
            Some(f) => Box::new(p.range(f.to_string()..).map(|(_, r)| r)),
            None => Box::new(p.values()),
        };
        Ok(iter
            .take_while(|r| super::sort_key_in_range(&r.sort_key, None, to))
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
