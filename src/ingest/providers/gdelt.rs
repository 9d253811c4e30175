// src/ingest/providers/gdelt.rs
//! GDELT DOC 2.0 article list (`mode=artlist&format=json`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::config::GdeltConfig;
use crate::ingest::types::{ArticleSource, RawArticle};

#[derive(Debug, Default, Deserialize)]
struct ArtList {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

pub struct GdeltProvider {
    mode: Mode,
}

enum Mode {
    /// Canned response body; the topic is ignored.
    Fixture(String),
    Http {
        client: reqwest::Client,
        base_url: String,
        max_records: u32,
        source_lang: String,
        timeout: Duration,
    },
}

impl GdeltProvider {
    pub fn from_config(cfg: &GdeltConfig) -> Self {
        Self {
            mode: Mode::Http {
                client: reqwest::Client::new(),
                base_url: cfg.base_url.clone(),
                max_records: cfg.max_records,
                source_lang: cfg.source_lang.clone(),
                timeout: Duration::from_secs(cfg.timeout_secs),
            },
        }
    }

    pub fn from_fixture_str(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }

    /// GDELT answers "no results" with an empty body or `{}`; both parse to no articles.
    fn parse_body(body: &str) -> Result<Vec<RawArticle>> {
        let t0 = std::time::Instant::now();
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        let list: ArtList = serde_json::from_str(trimmed).with_context(|| {
            let head: String = trimmed.chars().take(120).collect();
            format!("parsing gdelt artlist json, body starts: {head}")
        })?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_events_total").increment(list.articles.len() as u64);
        Ok(list.articles)
    }
}

#[async_trait]
impl ArticleSource for GdeltProvider {
    async fn fetch_articles(&self, topic: &str) -> Result<Vec<RawArticle>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_body(s),
            Mode::Http {
                client,
                base_url,
                max_records,
                source_lang,
                timeout,
            } => {
                let max = max_records.to_string();
                let resp = client
                    .get(base_url)
                    .query(&[
                        ("query", topic),
                        ("mode", "artlist"),
                        ("format", "json"),
                        ("maxrecords", max.as_str()),
                        ("sourcelang", source_lang.as_str()),
                    ])
                    .timeout(*timeout)
                    .send()
                    .await;

                let resp = match resp.and_then(|r| r.error_for_status()) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(target: "gdelt", error = ?e, topic, "provider http error");
                        counter!("ingest_provider_errors_total").increment(1);
                        return Err(e).context("gdelt http get()");
                    }
                };
                let body = resp.text().await.context("gdelt http .text()")?;
                Self::parse_body(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "GDELT"
    }
}
