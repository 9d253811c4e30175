//! File-backed record store: one JSON-lines file per topic under a data dir.
//!
//! Appends and reads share one async mutex, so writers never interleave partial
//! lines and readers never see a line mid-append. A trailing line without its
//! newline (another process still writing) is skipped quietly.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::RecordStore;
use crate::record::ArticleRecord;

#[derive(Debug)]
pub struct JsonlFileStore {
    dir: PathBuf,
    io_lock: Mutex<()>,
}

impl JsonlFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            io_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn topic_path(&self, topic: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", file_stem(topic)))
    }
}

/// Filesystem-safe stem for a topic. Distinct topics may share a stem; reads
/// filter on the stored `topic` field.
fn file_stem(topic: &str) -> String {
    let stem: String = topic
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

#[async_trait::async_trait]
impl RecordStore for JsonlFileStore {
    async fn put(&self, record: &ArticleRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("serialize record")?;
        line.push('\n');

        let path = self.topic_path(&record.topic);
        let _guard = self.io_lock.lock().await;

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating data dir {}", self.dir.display()))?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        f.write_all(line.as_bytes())
            .await
            .with_context(|| format!("appending to {}", path.display()))?;
        f.flush().await.context("flush record file")?;

        tracing::debug!(target: "store", path = %path.display(), sort_key = %record.sort_key, "record appended");
        Ok(())
    }

    async fn query_by_topic(&self, topic: &str) -> Result<Vec<ArticleRecord>> {
        let path = self.topic_path(topic);
        let content = {
            let _guard = self.io_lock.lock().await;
            match fs::read_to_string(&path).await {
                Ok(s) => s,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => {
                    return Err(e).with_context(|| format!("reading {}", path.display()));
                }
            }
        };

        let mut out = Vec::new();
        let mut lines = content.split_inclusive('\n').enumerate().peekable();
        while let Some((lineno, raw)) = lines.next() {
            let line = raw.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            let unterminated = lines.peek().is_none() && !raw.ends_with('\n');
            match serde_json::from_str::<ArticleRecord>(line) {
                Ok(r) if r.topic == topic => out.push(r),
                Ok(_) => {}
                Err(e) if unterminated => {
                    tracing::debug!(
                        target: "store",
                        path = %path.display(),
                        line = lineno + 1,
                        error = %e,
                        "skipping unterminated trailing line"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: "store",
                        path = %path.display(),
                        line = lineno + 1,
                        error = %e,
                        "skipping malformed record line"
                    );
                }
            }
        }
        out.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}
