//! HTTP API for ingestion, taxonomy and statistics.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/insert-promptme` | Insert a batch of FAQ / reverse-prompt documents |
//! | `POST` | `/api/insert-qa-pairs` | Insert a batch of generic QA pairs |
//! | `GET`  | `/api/contexts?type=` | Distinct contexts |
//! | `GET`  | `/api/categories?context=` | Distinct categories |
//! | `GET`  | `/api/stats` | Aggregate statistics |
//! | `GET`  | `/api/promptme?limit=` | Oldest typed documents |
//! | `GET`  | `/api/qa-pairs?limit=` | Oldest generic QA pairs |
//! | `GET`  | `/api/documents/{id}` | One stored document |
//! | `GET`  | `/api/health` | Database connectivity |
//!
//! # Error Contract
//!
//! Every error response has the same shape:
//!
//! ```json
//! { "error": "Document 2 (faq) missing required field: response" }
//! ```
//!
//! Unknown routes, and known paths called with the wrong method, answer
//! 404 `Endpoint not found`; a panicking handler
//! answers 500 `Internal server error` without leaking details.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser form can
//! be served from anywhere.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};

use qa_corpus_core::models::{
    DocumentFamily, DraftDocument, InsertResponse, InvalidDocumentId, StoredDocument,
    TaxonomyEntry,
};
use qa_corpus_core::stats::CollectionStats;
use qa_corpus_core::store::Store;
use qa_corpus_core::validate::{parse_drafts, BatchError};

use crate::config::Config;
use crate::ingest::{ingest_batch, timestamp_now, IngestError};
use crate::migrate::COLLECTION_NAME;
use crate::sqlite_store::SqliteStore;

/// Listing size used when `limit` is absent, unparsable or not positive.
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    store: Arc<dyn Store>,
}

/// Build the application router over `store`.
///
/// Exposed separately from [`serve`] so callers can mount it on their own
/// listener or wrap it in extra layers.
pub fn router(store: Arc<dyn Store>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);

    Router::new()
        .route("/api/insert-promptme", post(handle_insert_promptme))
        .route("/api/insert-qa-pairs", post(handle_insert_qa_pairs))
        .route("/api/contexts", get(handle_contexts))
        .route("/api/categories", get(handle_categories))
        .route("/api/stats", get(handle_stats))
        .route("/api/promptme", get(handle_list_promptme))
        .route("/api/qa-pairs", get(handle_list_qa_pairs))
        .route("/api/documents/{id}", get(handle_get_document))
        .route("/api/health", get(handle_health))
        .fallback(handle_not_found)
        .method_not_allowed_fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(AppState { store })
}

/// Serve the API on `listener` until `shutdown` resolves, then close the
/// store.
///
/// In-flight requests are allowed to finish before the store is closed.
/// Fails if serving fails or if the store cannot be closed cleanly.
pub async fn serve<F>(
    listener: TcpListener,
    store: Arc<dyn Store>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "corpus server listening");

    let served = axum::serve(listener, router(store.clone()))
        .with_graceful_shutdown(shutdown)
        .await;

    let closed = store.close().await;
    if let Err(e) = &closed {
        tracing::error!(error = %e, "failed to close the corpus database");
    }

    served?;
    closed
}

/// Start the server described by `config`, backed by the SQLite store.
///
/// The database is connected before the listener is bound so a bad
/// `db.path` fails fast. Runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&config.db));
    store
        .ping()
        .await
        .context("failed to connect to the corpus database")?;

    let bind_addr = config.server.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("Corpus server listening on http://{}", bind_addr);

    serve(listener, store, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down corpus server");
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// An error that renders as `{ "error": message }` with `status`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

/// Map a store failure. A malformed id is the caller's fault.
fn classify_store_error(err: anyhow::Error) -> AppError {
    if let Some(invalid) = err.downcast_ref::<InvalidDocumentId>() {
        return bad_request(invalid.to_string());
    }
    tracing::error!(error = %err, "store operation failed");
    internal(err.to_string())
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Rejected(e) => bad_request(e.to_string()),
            e @ IngestError::Store(_) => internal(e.to_string()),
        }
    }
}

async fn handle_not_found() -> AppError {
    not_found("Endpoint not found")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "request handler panicked");
    internal("Internal server error").into_response()
}

// ============ POST /api/insert-* ============

/// Request body of both insert routes.
///
/// Documents stay raw JSON here so each one can be decoded and reported
/// on its own.
#[derive(Debug, Deserialize)]
struct InsertRequest {
    documents: Option<Vec<serde_json::Value>>,
}

async fn insert(
    store: &dyn Store,
    family: DocumentFamily,
    body: Result<Json<InsertRequest>, JsonRejection>,
) -> Result<Json<InsertResponse>, AppError> {
    let values = match body {
        Ok(Json(InsertRequest {
            documents: Some(values),
        })) => values,
        Ok(_) => return Err(bad_request(BatchError::Empty.to_string())),
        Err(rejection) => {
            tracing::warn!(
                family = %family,
                error = %rejection.body_text(),
                "unreadable insert body"
            );
            return Err(bad_request(BatchError::Empty.to_string()));
        }
    };

    let drafts: Vec<DraftDocument> = parse_drafts(values).map_err(|e| {
        tracing::warn!(family = %family, error = %e, "rejected batch");
        bad_request(e.to_string())
    })?;

    let report = ingest_batch(store, family, &drafts).await?;
    Ok(Json(InsertResponse {
        success: true,
        inserted_count: report.inserted_count,
        message: report.message(),
    }))
}

async fn handle_insert_promptme(
    State(state): State<AppState>,
    body: Result<Json<InsertRequest>, JsonRejection>,
) -> Result<Json<InsertResponse>, AppError> {
    insert(state.store.as_ref(), DocumentFamily::PromptMe, body).await
}

async fn handle_insert_qa_pairs(
    State(state): State<AppState>,
    body: Result<Json<InsertRequest>, JsonRejection>,
) -> Result<Json<InsertResponse>, AppError> {
    insert(state.store.as_ref(), DocumentFamily::QaPair, body).await
}

// ============ Taxonomy ============

#[derive(Debug, Deserialize)]
struct ContextsQuery {
    #[serde(rename = "type")]
    doc_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoriesQuery {
    context: Option<String>,
}

/// An empty filter value means "no filter".
fn filter_value(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn handle_contexts(
    State(state): State<AppState>,
    Query(query): Query<ContextsQuery>,
) -> Result<Json<Vec<TaxonomyEntry>>, AppError> {
    let names = state
        .store
        .distinct_contexts(filter_value(&query.doc_type))
        .await
        .map_err(classify_store_error)?;
    Ok(Json(names.into_iter().map(TaxonomyEntry::from).collect()))
}

async fn handle_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoriesQuery>,
) -> Result<Json<Vec<TaxonomyEntry>>, AppError> {
    let names = state
        .store
        .distinct_categories(filter_value(&query.context))
        .await
        .map_err(classify_store_error)?;
    Ok(Json(names.into_iter().map(TaxonomyEntry::from).collect()))
}

// ============ GET /api/stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<CollectionStats>, AppError> {
    let stats = state.store.stats().await.map_err(classify_store_error)?;
    Ok(Json(stats))
}

// ============ Listings ============

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<String>,
}

/// Parse a `limit` query value, falling back to [`DEFAULT_LIST_LIMIT`].
pub fn parse_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map_or(DEFAULT_LIST_LIMIT, effective_limit)
}

/// A non-positive limit means the default.
pub fn effective_limit(limit: i64) -> i64 {
    if limit > 0 {
        limit
    } else {
        DEFAULT_LIST_LIMIT
    }
}

async fn list(
    store: &dyn Store,
    family: DocumentFamily,
    query: ListQuery,
) -> Result<Json<Vec<StoredDocument>>, AppError> {
    let docs = store
        .find(Some(family), parse_limit(query.limit.as_deref()))
        .await
        .map_err(classify_store_error)?;
    Ok(Json(docs))
}

async fn handle_list_promptme(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StoredDocument>>, AppError> {
    list(state.store.as_ref(), DocumentFamily::PromptMe, query).await
}

async fn handle_list_qa_pairs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StoredDocument>>, AppError> {
    list(state.store.as_ref(), DocumentFamily::QaPair, query).await
}

async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredDocument>, AppError> {
    state
        .store
        .find_by_id(&id)
        .await
        .map_err(classify_store_error)?
        .map(Json)
        .ok_or_else(|| not_found(format!("Document not found: {}", id)))
}

// ============ GET /api/health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    collection: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: String,
}

/// Reports 503 rather than failing when the database is unreachable.
async fn handle_health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "connected",
                collection: Some(COLLECTION_NAME),
                error: None,
                timestamp: timestamp_now(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    database: "disconnected",
                    collection: None,
                    error: Some(e.to_string()),
                    timestamp: timestamp_now(),
                }),
            )
        }
    }
}
