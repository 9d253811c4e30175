// src/ingest/types.rs
use anyhow::Result;

/// An article as delivered by an [`ArticleSource`], before scoring.
/// Field names accept the GDELT artlist spelling (`sourcecountry`, `seendate`).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, alias = "sourcecountry", alias = "sourceCountry")]
    pub source_country: Option<String>,
    /// Upstream "first seen" stamp, e.g. `20250307T090000Z`. Informational only.
    #[serde(default, alias = "seendate")]
    pub seen_date: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl RawArticle {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.source_country = Some(country.into());
        self
    }
}

/// Fetches the raw articles for a search topic. An empty result is not an error.
#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_articles(&self, topic: &str) -> Result<Vec<RawArticle>>;
    fn name(&self) -> &'static str;
}
