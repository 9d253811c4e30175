// tests/metrics_ingest.rs
#![cfg(feature = "strict-metrics")] // installs a global recorder; run with --features strict-metrics

use std::sync::Arc;

use axum::body::{self, Body};
use http::{Request, StatusCode};
use news_trends::metrics::Metrics;
use news_trends::store::MemoryStore;
use news_trends::{IngestPipeline, RawArticle, SentimentAnalyzer};
use tower::ServiceExt;

#[tokio::test]
async fn metrics_exposed_after_ingest() {
    let m = Metrics::init().expect("recorder");

    let p = IngestPipeline::new(SentimentAnalyzer::new(), Arc::new(MemoryStore::new()));
    p.ingest("Tesla", &[RawArticle::new("Good day", "u1")])
        .await
        .expect("ingest");
    let _ = p.ingest("Tesla", &[]).await;

    let resp = m
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let out = String::from_utf8(bytes.to_vec()).unwrap();

    for needle in [
        "ingest_articles_total",
        "ingest_records_persisted_total",
        "ingest_no_articles_total",
        "ingest_batch_ms",
    ] {
        assert!(out.contains(needle), "missing {needle} in:\n{out}");
    }
}
