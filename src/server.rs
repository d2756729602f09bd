//! HTTP API over the cached corpus.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness (returns version) |
//! | `GET`  | `/status` | Current epoch: number, documents, index, build time |
//! | `POST` | `/search` | `{query, limit?, explain?}` → `{results}` |
//! | `POST` | `/context` | `{query}` → `{context, related}` for prompt building |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be >= 1" } }
//! ```
//!
//! A query with no searchable terms is not an error; it returns an empty
//! list. An unavailable corpus is not an error either.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so that browser chat
//! widgets can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use context_ranker_core::models::SearchResultItem;
use context_ranker_core::search::{context_bundle, ContextBundle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::cache::CorpusCache;
use crate::config::Config;
use crate::search::search_content;
use crate::source::source_from_config;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CorpusCache>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(cache: Arc<CorpusCache>, config: Arc<Config>) -> Self {
        Self { cache, config }
    }
}

/// Build the router. Exposed separately from [`run_server`] so tests can
/// serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/search", post(handle_search))
        .route("/context", post(handle_context))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `[server].bind` until the process is terminated.
///
/// The first corpus load starts in the background so the listener is up
/// immediately; early requests wait on that same load.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let source = source_from_config(&config.corpus)?;
    let cache = Arc::new(CorpusCache::from_config(source, &config.corpus));
    let state = AppState::new(cache.clone(), Arc::new(config.clone()));

    tokio::spawn(async move {
        cache.load().await;
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "server listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| bad_request(format!("invalid request: {}", e)))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /status ============

#[derive(Serialize)]
struct StatusResponse {
    source: String,
    /// `0` until the first successful load.
    epoch: u64,
    documents: usize,
    indexed: bool,
    built_at: Option<String>,
    fetch_attempts: u64,
}

/// Reports the published epoch without triggering a load.
async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let epoch = state.cache.current().await;
    Json(StatusResponse {
        source: state.cache.source(),
        epoch: epoch.as_ref().map(|e| e.number).unwrap_or(0),
        documents: epoch.as_ref().map(|e| e.documents.len()).unwrap_or(0),
        indexed: epoch.as_ref().is_some_and(|e| e.has_index()),
        built_at: epoch
            .as_ref()
            .and_then(|e| e.built_at_utc)
            .map(|t| t.to_rfc3339()),
        fetch_attempts: state.cache.fetch_attempts(),
    })
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    explain: bool,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResultItem>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SearchResponse>, AppError> {
    let req: SearchRequest = parse_body(body)?;
    if req.limit == Some(0) {
        return Err(bad_request("limit must be >= 1"));
    }

    let params = state.config.retrieval.search_params(req.limit, req.explain);
    let results = search_content(&state.cache, &req.query, &params).await;
    Ok(Json(SearchResponse { results }))
}

// ============ POST /context ============

#[derive(Deserialize)]
struct ContextRequest {
    query: String,
}

async fn handle_context(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ContextBundle>, AppError> {
    let req: ContextRequest = parse_body(body)?;

    let retrieval = &state.config.retrieval;
    let params = retrieval.search_params(None, false);
    let results = search_content(&state.cache, &req.query, &params).await;
    Ok(Json(context_bundle(results, retrieval.context_limit)))
}
