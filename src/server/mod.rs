//! HTTP API for the crawler host process
//!
//! A thin wrapper around the crawl engine: liveness/health endpoints for
//! container health checks, a trigger endpoint that runs a crawl in the
//! background, and read-only result/status endpoints. No crawl logic lives
//! here.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::crawler::Crawler;
use crate::storage::{CrawledPage, PageStore, SqliteStore};

/// Snapshot of the crawler's run state, shared with the background task
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStatus {
    pub is_running: bool,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub pages_crawled: u64,
    pub pages_failed: u64,
    pub errors: Vec<String>,
    pub last_activity: Option<String>,
}

struct Inner {
    config: Config,
    status: Mutex<CrawlStatus>,
    sample: Mutex<Vec<CrawledPage>>,
    cancel: Mutex<CancellationToken>,
    started: Instant,
}

/// Shared state behind every handler
#[derive(Clone)]
pub struct ApiState {
    inner: Arc<Inner>,
}

impl ApiState {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                status: Mutex::new(CrawlStatus::default()),
                sample: Mutex::new(Vec::new()),
                cancel: Mutex::new(CancellationToken::new()),
                started: Instant::now(),
            }),
        }
    }

    fn status_snapshot(&self) -> CrawlStatus {
        self.inner.status.lock().unwrap().clone()
    }
}

/// Parameters accepted by the crawl trigger endpoint
///
/// Absent fields fall back to the loaded configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    pub max_pages: Option<usize>,
    pub delay: Option<f64>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    uptime_seconds: f64,
    version: String,
    crawler_status: CrawlStatus,
}

/// Builds the API router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/status", get(status))
        .route("/crawl", post(start_crawl))
        .route("/crawl/stop", post(stop_crawl))
        .route("/crawl/results", get(results))
        .route("/stats", get(storage_stats))
        .route("/pages", get(list_stored_pages))
        .with_state(state)
}

/// Binds and serves the API until the process exits
pub async fn serve(config: Config) -> crate::Result<()> {
    let bind_address = config.server.bind_address.clone();
    let state = ApiState::new(config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("API listening on {}", bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "kumo crawler API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        uptime_seconds: state.inner.started.elapsed().as_secs_f64(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        crawler_status: state.status_snapshot(),
    })
}

async fn liveness() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn readiness() -> Json<Value> {
    Json(json!({
        "status": "ready",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn status(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "crawler_status": state.status_snapshot(),
        "server_info": {
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": state.inner.started.elapsed().as_secs_f64(),
            "current_time": Utc::now().to_rfc3339(),
        },
    }))
}

async fn start_crawl(
    State(state): State<ApiState>,
    request: Option<Json<CrawlRequest>>,
) -> (StatusCode, Json<Value>) {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let mut config = state.inner.config.clone();
    if !request.urls.is_empty() {
        config.seeds = request.urls;
    }
    if let Some(max_pages) = request.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(delay) = request.delay {
        config.crawler.delay_seconds = delay;
    }

    if let Err(e) = crate::config::validate(&config) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": e.to_string() })),
        );
    }

    {
        let mut status = state.inner.status.lock().unwrap();
        if status.is_running {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "detail": "Crawler is already running" })),
            );
        }
        let now = Utc::now().to_rfc3339();
        *status = CrawlStatus {
            is_running: true,
            started_at: Some(now.clone()),
            last_activity: Some(now),
            ..CrawlStatus::default()
        };
    }

    let cancel = CancellationToken::new();
    *state.inner.cancel.lock().unwrap() = cancel.clone();

    let response = json!({
        "message": "Crawling started",
        "seeds": config.seeds,
        "max_pages": config.crawler.max_pages,
        "delay": config.crawler.delay_seconds,
    });

    let task_state = state.clone();
    tokio::spawn(async move {
        run_background_crawl(task_state, config, cancel).await;
    });

    (StatusCode::ACCEPTED, Json(response))
}

async fn stop_crawl(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    {
        let status = state.inner.status.lock().unwrap();
        if !status.is_running {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "detail": "No crawler is running" })),
            );
        }
    }

    state.inner.cancel.lock().unwrap().cancel();

    (
        StatusCode::OK,
        Json(json!({
            "message": "Stop requested; the in-flight page will finish first",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

async fn results(State(state): State<ApiState>) -> Json<Value> {
    let status = state.status_snapshot();
    let sample = state.inner.sample.lock().unwrap().clone();

    Json(json!({
        "crawler_status": status,
        "sample_count": sample.len(),
        "sample_data": sample,
    }))
}

/// Query parameters for the stored-pages listing
#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default = "default_page_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_page_limit() -> usize {
    10
}

async fn storage_stats(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    let store = match open_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.stats() {
        Ok(stats) => (StatusCode::OK, Json(json!({ "stats": stats }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": e.to_string() })),
        ),
    }
}

async fn list_stored_pages(
    State(state): State<ApiState>,
    Query(query): Query<PagesQuery>,
) -> (StatusCode, Json<Value>) {
    let store = match open_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.list_pages(query.limit, query.offset) {
        Ok(pages) => (
            StatusCode::OK,
            Json(json!({ "count": pages.len(), "pages": pages })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": e.to_string() })),
        ),
    }
}

fn open_store(state: &ApiState) -> Result<SqliteStore, (StatusCode, Json<Value>)> {
    if !state.inner.config.storage.enabled {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "detail": "Storage is disabled" })),
        ));
    }

    SqliteStore::open(Path::new(&state.inner.config.storage.database_path)).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": e.to_string() })),
        )
    })
}

async fn run_background_crawl(state: ApiState, config: Config, cancel: CancellationToken) {
    let outcome = match Crawler::new(config) {
        Ok(crawler) => {
            let mut crawler = crawler.with_cancellation(cancel);
            crawler.run().await
        }
        Err(e) => Err(e),
    };

    let now = Utc::now().to_rfc3339();
    let mut status = state.inner.status.lock().unwrap();
    status.is_running = false;
    status.finished_at = Some(now.clone());
    status.last_activity = Some(now);

    match outcome {
        Ok(result) => {
            status.pages_crawled = result.pages_fetched;
            status.pages_failed = result.pages_failed;

            let mut sample = state.inner.sample.lock().unwrap();
            *sample = result.pages.into_iter().take(3).collect();
        }
        Err(e) => {
            tracing::error!("Background crawl failed: {}", e);
            status.errors.push(e.to_string());
        }
    }
}
