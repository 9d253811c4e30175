// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::error::IngestError;
use crate::ingest::types::{ArticleSource, RawArticle};
use crate::record::{self, ArticleRecord};
use crate::sentiment::SentimentAnalyzer;
use crate::store::RecordStore;

const MAX_TITLE_CHARS: usize = 1500;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_articles_total", "Articles received for ingestion.");
        describe_counter!(
            "ingest_records_persisted_total",
            "Records written to the store."
        );
        describe_counter!(
            "ingest_failures_total",
            "Ingest calls aborted, labelled by error kind."
        );
        describe_counter!(
            "ingest_no_articles_total",
            "Ingest calls with an empty article list."
        );
        describe_histogram!("ingest_batch_ms", "Ingest batch time in milliseconds.");
        describe_gauge!(
            "ingest_last_run_ts",
            "Unix ts when an ingest batch last completed."
        );
    });
}

/// Normalize headline text: strip tags, decode entities, fold typographic
/// quotes, collapse whitespace. Tags go before decoding so escaped brackets
/// (`&lt;AAPL.O&gt;`) survive as text.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| {
        regex::Regex::new(r"(?is)</?[a-z!][^>]*>").expect("tag regex")
    });
    let stripped = re_tags.replace_all(s, "");
    let mut out = html_escape::decode_html_entities(&stripped).to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TITLE_CHARS {
        out = out.chars().take(MAX_TITLE_CHARS).collect();
    }
    out
}

fn normalize_article(a: &RawArticle) -> RawArticle {
    RawArticle {
        title: a.title.as_deref().map(normalize_text),
        url: a.url.as_deref().map(|u| u.trim().to_string()),
        domain: a.domain.as_deref().map(|d| d.trim().to_ascii_lowercase()),
        source_country: a.source_country.as_deref().map(|c| c.trim().to_string()),
        seen_date: a.seen_date.clone(),
        language: a.language.clone(),
    }
}

/// Score → build → persist, one article at a time, aborting on the first error.
pub struct IngestPipeline {
    analyzer: SentimentAnalyzer,
    store: Arc<dyn RecordStore>,
}

impl IngestPipeline {
    pub fn new(analyzer: SentimentAnalyzer, store: Arc<dyn RecordStore>) -> Self {
        Self { analyzer, store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn analyzer(&self) -> &SentimentAnalyzer {
        &self.analyzer
    }

    /// Ingest a batch for `topic`.
    ///
    /// Returns every built record, in input order, only when all of them were
    /// persisted. Records written before a failure stay in the store.
    pub async fn ingest(
        &self,
        topic: &str,
        articles: &[RawArticle],
    ) -> Result<Vec<ArticleRecord>, IngestError> {
        ensure_metrics_described();

        if articles.is_empty() {
            counter!("ingest_no_articles_total").increment(1);
            return Err(IngestError::NoArticles {
                topic: topic.to_string(),
            });
        }

        let t0 = Instant::now();
        counter!("ingest_articles_total").increment(articles.len() as u64);

        let mut out = Vec::with_capacity(articles.len());
        for raw in articles {
            let article = normalize_article(raw);
            let sentiment = self
                .analyzer
                .score(article.title.as_deref().unwrap_or_default());

            let rec = match record::build(topic, &article, &sentiment, Utc::now()) {
                Ok(r) => r,
                Err(e) => return Err(self.abort(topic, out.len(), e)),
            };

            if let Err(source) = self.store.put(&rec).await {
                let e = IngestError::Persistence {
                    topic: rec.topic.clone(),
                    sort_key: rec.sort_key.clone(),
                    source,
                };
                return Err(self.abort(topic, out.len(), e));
            }

            counter!("ingest_records_persisted_total").increment(1);
            tracing::debug!(
                target: "ingest",
                topic = %rec.topic,
                sort_key = %rec.sort_key,
                label = %rec.sentiment_label,
                score = rec.raw_sentiment_score,
                "record persisted"
            );
            out.push(rec);
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_batch_ms").record(ms);
        gauge!("ingest_last_run_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(
            target: "ingest",
            topic,
            records = out.len(),
            store = self.store.name(),
            elapsed_ms = ms,
            "ingest batch stored"
        );
        Ok(out)
    }

    /// Fetch articles for `topic` from `source`, then [`ingest`](Self::ingest) them.
    pub async fn analyze_topic(
        &self,
        source: &dyn ArticleSource,
        topic: &str,
    ) -> Result<Vec<ArticleRecord>, IngestError> {
        let articles = match source.fetch_articles(topic).await {
            Ok(v) => v,
            Err(e) => {
                let err = IngestError::Fetch {
                    topic: topic.to_string(),
                    source: e,
                };
                tracing::warn!(target: "ingest", provider = source.name(), error = %err, "article fetch failed");
                counter!("ingest_failures_total", "kind" => err.kind()).increment(1);
                return Err(err);
            }
        };
        tracing::debug!(
            target: "ingest",
            provider = source.name(),
            topic,
            fetched = articles.len(),
            "articles fetched"
        );
        self.ingest(topic, &articles).await
    }

    fn abort(&self, topic: &str, persisted: usize, e: IngestError) -> IngestError {
        counter!("ingest_failures_total", "kind" => e.kind()).increment(1);
        tracing::warn!(
            target: "ingest",
            topic,
            persisted,
            error = %e,
            "ingest aborted"
        );
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn normalize_text_decodes_and_collapses() {
        let s = "  Stocks&nbsp;&nbsp;<b>rally</b> on \u{201C}good\u{201D} news  ";
        assert_eq!(normalize_text(s), r#"Stocks rally on "good" news"#);
    }

    #[test]
    fn normalize_text_keeps_comparison_signs() {
        assert_eq!(normalize_text("Profits < forecast > 2024?"), "Profits < forecast > 2024?");
    }

    #[test]
    fn normalize_article_lowercases_domain() {
        let a = RawArticle::new(" t ", " https://x ").with_domain(" Reuters.COM ");
        let n = normalize_article(&a);
        assert_eq!(n.title.as_deref(), Some("t"));
        assert_eq!(n.url.as_deref(), Some("https://x"));
        assert_eq!(n.domain.as_deref(), Some("reuters.com"));
    }

    #[tokio::test]
    async fn empty_batch_is_no_articles() {
        let p = IngestPipeline::new(SentimentAnalyzer::new(), Arc::new(MemoryStore::new()));
        let err = p.ingest("Tesla", &[]).await.unwrap_err();
        assert!(matches!(err, IngestError::NoArticles { ref topic } if topic == "Tesla"));
    }

    #[tokio::test]
    async fn records_keep_input_order() {
        let store = Arc::new(MemoryStore::new());
        let p = IngestPipeline::new(SentimentAnalyzer::new(), store.clone());
        let arts = vec![
            RawArticle::new("Markets crash", "u1"),
            RawArticle::new("Quiet day", "u2"),
            RawArticle::new("Great earnings", "u3"),
        ];
        let out = p.ingest("Tesla", &arts).await.unwrap();
        let urls: Vec<&str> = out.iter().map(|r| r.source_url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u2", "u3"]);
        assert_eq!(store.len(), 3);
    }
}
