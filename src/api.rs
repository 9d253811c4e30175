use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::aggregate::{aggregate, AggregateView};
use crate::config::AppConfig;
use crate::error::IngestError;
use crate::heatmap::{heatmap, HeatmapCell};
use crate::ingest::providers::GdeltProvider;
use crate::ingest::types::ArticleSource;
use crate::ingest::IngestPipeline;
use crate::record::ArticleRecord;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub source: Arc<dyn ArticleSource>,
}

impl AppState {
    pub fn new(pipeline: IngestPipeline, source: Arc<dyn ArticleSource>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            source,
        }
    }

    /// Wire the GDELT source, configured store and analyzer.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let analyzer = cfg.sentiment.build_analyzer()?;
        let store = cfg.storage.build_store();
        let source: Arc<dyn ArticleSource> = Arc::new(GdeltProvider::from_config(&cfg.gdelt));
        tracing::info!(
            target: "api",
            store = store.name(),
            provider = source.name(),
            max_records = cfg.gdelt.max_records,
            "app state ready"
        );
        Ok(Self::new(IngestPipeline::new(analyzer, store), source))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/analyze", post(analyze))
        .route("/api/topics/{term}", get(topic_records))
        .route("/api/topics/{term}/dashboard", get(topic_dashboard))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

pub enum ApiError {
    BadRequest(&'static str),
    Ingest(IngestError),
    Store(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        ApiError::Ingest(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg, kind) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.to_string(), None),
            ApiError::Ingest(e) => {
                let status = match &e {
                    IngestError::NoArticles { .. } => StatusCode::NOT_FOUND,
                    IngestError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    IngestError::Fetch { .. } => StatusCode::BAD_GATEWAY,
                    IngestError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string(), Some(e.kind()))
            }
            ApiError::Store(e) => {
                tracing::warn!(target: "api", error = %format!("{e:#}"), "store query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("store error: {e:#}"),
                    Some("store"),
                )
            }
        };
        (status, Json(ErrorBody { msg, kind })).into_response()
    }
}

#[derive(Deserialize)]
struct AnalyzeReq {
    #[serde(default, rename = "searchTerm")]
    search_term: Option<String>,
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Result<(StatusCode, Json<Vec<ArticleRecord>>), ApiError> {
    let term = body
        .search_term
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::BadRequest("Search term is required"))?;

    let records = state
        .pipeline
        .analyze_topic(state.source.as_ref(), term)
        .await?;
    Ok((StatusCode::CREATED, Json(records)))
}

#[derive(Deserialize)]
struct RangeQuery {
    from: Option<String>,
    to: Option<String>,
}

async fn topic_records(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<Vec<ArticleRecord>>, ApiError> {
    let store = state.pipeline.store();
    let records = if q.from.is_some() || q.to.is_some() {
        store
            .query_range(&term, q.from.as_deref(), q.to.as_deref())
            .await
    } else {
        store.query_by_topic(&term).await
    }
    .map_err(ApiError::Store)?;
    Ok(Json(records))
}

#[derive(Serialize)]
struct DashboardResp {
    topic: String,
    total: usize,
    #[serde(flatten)]
    view: AggregateView,
    heatmap: Vec<HeatmapCell>,
}

async fn topic_dashboard(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<DashboardResp>, ApiError> {
    let records = state
        .pipeline
        .store()
        .query_by_topic(&term)
        .await
        .map_err(ApiError::Store)?;

    let view = aggregate(&records);
    let cells = heatmap(&view.country_counts);
    counter!("aggregate_requests_total").increment(1);
    tracing::debug!(target: "api", topic = %term, records = records.len(), "dashboard aggregated");

    Ok(Json(DashboardResp {
        topic: term,
        total: records.len(),
        view,
        heatmap: cells,
    }))
}
