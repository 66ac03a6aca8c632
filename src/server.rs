//! Dashboard HTTP API.
//!
//! Exposes the file inventory to the browser dashboard as a small JSON API.
//!
//! # Endpoints
//!
//! | Method   | Path | Description |
//! |----------|------|-------------|
//! | `GET`    | `/scrapes` | List files (optional `search`, `industry` query filters) |
//! | `GET`    | `/scraper/industries` | The fixed industry vocabulary |
//! | `GET`    | `/scraper/stats` | Aggregate totals and per-industry record counts |
//! | `POST`   | `/scrapes/upload` | Multipart CSV upload (`file` field) |
//! | `GET`    | `/scrapes/download/{filename}` | Raw CSV bytes as an attachment |
//! | `DELETE` | `/scrapes/{filename}` | Remove a file |
//! | `GET`    | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Failures return `{ "detail": "..." }` with a 4xx/5xx status: 400 for
//! invalid input, 404 for unknown names, 503 for retryable storage faults,
//! 500 for detected registry/blob divergence.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the dashboard is a
//! browser client served from a different origin.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{Aggregate, FileRecord, Industry};
use crate::registry::{IndustryFilter, ListFilter};
use crate::store::LeadStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<LeadStore>,
}

/// Start the API server: open the store (seeding the registry from the blob
/// root) and serve until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = Arc::new(LeadStore::open(config).await?);
    run_server_with_store(config, store).await
}

/// Like [`run_server`], but over an already-opened store.
pub async fn run_server_with_store(
    config: &Config,
    store: Arc<LeadStore>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(store, config.upload.max_bytes);

    println!("leadstore API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(store: Arc<LeadStore>, max_upload_bytes: u64) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Multipart framing adds overhead beyond the file bytes themselves.
    let body_limit = (max_upload_bytes as usize).saturating_add(64 * 1024);

    Router::new()
        .route("/scrapes", get(handle_list))
        .route("/scrapes/upload", post(handle_upload))
        .route("/scrapes/download/{filename}", get(handle_download))
        .route("/scrapes/{filename}", delete(handle_delete))
        .route("/scraper/industries", get(handle_industries))
        .route("/scraper/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(AppState { store })
}

// ============ Error response ============

/// Failure body: `{ "detail": "..." }`, the shape the dashboard expects.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Consistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            detail: err.to_string(),
        }
    }
}

fn bad_request(detail: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        detail: detail.into(),
    }
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

// ============ GET /scrapes ============

#[derive(Deserialize)]
struct ListQuery {
    search: Option<String>,
    industry: Option<String>,
}

#[derive(Serialize)]
struct ScrapesResponse {
    files: Vec<FileRecord>,
    total_records: u64,
}

async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ScrapesResponse>, ApiError> {
    let industry = match query.industry.as_deref() {
        None | Some("all") | Some("") => IndustryFilter::All,
        Some(tag) => {
            let parsed: Industry = tag.parse().map_err(bad_request)?;
            IndustryFilter::Only(parsed)
        }
    };

    let filter = ListFilter {
        name_contains: query.search.filter(|s| !s.is_empty()),
        industry,
    };

    let files = state.store.list(&filter);
    let total_records = files.iter().map(|f| f.record_count).sum();

    Ok(Json(ScrapesResponse {
        files,
        total_records,
    }))
}

// ============ GET /scraper/industries ============

#[derive(Serialize)]
struct IndustriesResponse {
    industries: Vec<&'static str>,
}

async fn handle_industries() -> Json<IndustriesResponse> {
    Json(IndustriesResponse {
        industries: Industry::ALL.iter().map(|i| i.as_str()).collect(),
    })
}

// ============ GET /scraper/stats ============

async fn handle_stats(State(state): State<AppState>) -> Json<Aggregate> {
    Json(state.store.aggregate())
}

// ============ POST /scrapes/upload ============

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| bad_request("the 'file' field has no filename"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;

        let record = state.store.upload(&name, &bytes).await?;
        return Ok((
            StatusCode::CREATED,
            Json(MessageResponse {
                message: format!(
                    "Uploaded {} ({} records)",
                    record.name, record.record_count
                ),
            }),
        ));
    }

    Err(bad_request("multipart body has no 'file' field"))
}

// ============ GET /scrapes/download/{filename} ============

async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.store.download(&filename).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, bytes).into_response())
}

// ============ DELETE /scrapes/{filename} ============

async fn handle_delete(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete(&filename).await?;
    Ok(Json(MessageResponse {
        message: format!("Deleted {}", filename),
    }))
}
