// equipment-ledger-server/src/server.rs
// ============================================================================
// Module: Equipment Ledger HTTP Server
// Description: axum transport for the ledger API.
// Purpose: Decode HTTP requests and dispatch them to the API handler.
// Dependencies: equipment-ledger-config, equipment-ledger-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! [`LedgerServer`] builds the batch store, pipeline, renderer, and audit sink
//! from configuration and serves the ledger API over HTTP. Handlers decode
//! headers, path segments, and multipart bodies, then run the blocking
//! [`ApiHandler`] call on tokio's blocking pool.
//!
//! Routes:
//! - `POST /api/upload` (multipart `file`, optional `confirm`, or `?confirm=true`)
//! - `GET /api/history`
//! - `GET /api/data/{id}` and `DELETE /api/data/{id}`
//! - `GET /api/summary/{id}`
//! - `GET /api/report/{id}`

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::Multipart;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use equipment_ledger_config::AuditConfig;
use equipment_ledger_config::EquipmentLedgerConfig;
use equipment_ledger_config::StoreType;
use equipment_ledger_core::InMemoryBatchStore;
use equipment_ledger_core::IngestPipeline;
use equipment_ledger_core::OwnerRef;
use equipment_ledger_core::RequestContext;
use equipment_ledger_core::SharedBatchStore;
use equipment_ledger_core::TextReportRenderer;
use equipment_ledger_store_sqlite::SqliteBatchStore;
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::api::ApiHandler;
use crate::api::ApiResponse;
use crate::api::UploadFile;
use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the caller's owner reference.
pub const OWNER_HEADER: &str = "x-equipment-ledger-user";
/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Maximum accepted header value length for owner and request id.
const MAX_HEADER_VALUE_LENGTH: usize = 256;

// ============================================================================
// SECTION: Ledger Server
// ============================================================================

/// HTTP server instance.
pub struct LedgerServer {
    /// Server configuration.
    config: EquipmentLedgerConfig,
    /// API handler for request dispatch.
    handler: ApiHandler,
}

impl LedgerServer {
    /// Builds a new server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerServerError`] when validation or initialization fails.
    pub fn from_config(config: EquipmentLedgerConfig) -> Result<Self, LedgerServerError> {
        config.validate().map_err(|err| LedgerServerError::Config(err.to_string()))?;
        let handler = build_handler(&config)?;
        Ok(Self {
            config,
            handler,
        })
    }

    /// Returns the API handler.
    #[must_use]
    pub const fn handler(&self) -> &ApiHandler {
        &self.handler
    }

    /// Returns the axum router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.handler.clone(), self.config.server.max_body_bytes)
    }

    /// Binds the configured address and serves requests.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), LedgerServerError> {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| LedgerServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| LedgerServerError::Transport("http bind failed".to_string()))?;
        self.serve_on(listener).await
    }

    /// Serves requests on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerServerError`] when the server fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), LedgerServerError> {
        if let Ok(addr) = listener.local_addr() {
            emit_exposure_warning(addr);
        }
        let app = self.router();
        axum::serve(listener, app)
            .await
            .map_err(|_| LedgerServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the API handler from configuration.
///
/// # Errors
///
/// Returns [`LedgerServerError`] when the store or audit sink cannot be opened.
pub fn build_handler(config: &EquipmentLedgerConfig) -> Result<ApiHandler, LedgerServerError> {
    let pipeline = build_pipeline(config)?;
    let renderer = Arc::new(TextReportRenderer::new(config.report.decimal_places));
    let audit = build_audit_sink(&config.audit)?;
    Ok(ApiHandler::new(pipeline, renderer, audit))
}

/// Builds the ingestion pipeline and its batch store from configuration.
///
/// # Errors
///
/// Returns [`LedgerServerError`] when the store cannot be opened.
pub fn build_pipeline(config: &EquipmentLedgerConfig) -> Result<IngestPipeline, LedgerServerError> {
    let store = match config.store.store_type {
        StoreType::Memory => SharedBatchStore::from_store(InMemoryBatchStore::new()),
        StoreType::Sqlite => {
            let sqlite_config = config.store.sqlite_config().ok_or_else(|| {
                LedgerServerError::Config("sqlite store requires path".to_string())
            })?;
            let store = SqliteBatchStore::new(&sqlite_config)
                .map_err(|err| LedgerServerError::Init(err.to_string()))?;
            SharedBatchStore::from_store(store)
        }
    };
    Ok(IngestPipeline::new(store, config.pipeline_config()))
}

/// Builds the audit sink selected by configuration.
///
/// # Errors
///
/// Returns [`LedgerServerError`] when the audit log file cannot be opened.
pub fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, LedgerServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FileAuditSink::new(FsPath::new(path.trim()))
                .map_err(|err| LedgerServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Shared server state for HTTP handlers.
struct ServerState {
    /// API handler for request dispatch.
    handler: ApiHandler,
    /// Counter for generated request ids.
    next_request: AtomicU64,
}

impl ServerState {
    /// Builds the request context from headers.
    fn request_context(&self, headers: &HeaderMap) -> RequestContext {
        let request_id = header_value(headers, REQUEST_ID_HEADER).unwrap_or_else(|| {
            format!("req-{}", self.next_request.fetch_add(1, Ordering::Relaxed))
        });
        let ctx = RequestContext::anonymous().with_request_id(request_id);
        match header_value(headers, OWNER_HEADER) {
            Some(owner) => ctx.with_owner(OwnerRef::new(owner)),
            None => ctx,
        }
    }
}

/// Query parameters accepted by the upload endpoint.
#[derive(Debug, Default, Deserialize)]
struct UploadQuery {
    /// Confirmation flag (`true`, `1`, or `yes`).
    confirm: Option<String>,
}

/// Decoded multipart upload form.
struct UploadForm {
    /// File part, when present.
    file: Option<UploadFile>,
    /// Confirmation flag from the form.
    confirmed: bool,
}

/// Builds the router with all ledger routes.
fn build_router(handler: ApiHandler, max_body_bytes: usize) -> Router {
    let state = Arc::new(ServerState {
        handler,
        next_request: AtomicU64::new(1),
    });
    Router::new()
        .route("/api/upload", post(handle_upload))
        .route("/api/history", get(handle_history))
        .route("/api/data/{id}", get(handle_data).delete(handle_delete))
        .route("/api/summary/{id}", get(handle_summary))
        .route("/api/report/{id}", get(handle_report))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Handles `POST /api/upload`.
async fn handle_upload(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Query(query): Query<UploadQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let ctx = state.request_context(&headers);
    let query_confirmed = query.confirm.as_deref().is_some_and(is_truthy);
    let form = match multipart {
        Ok(multipart) => match read_upload_form(multipart).await {
            Ok(form) => form,
            Err(err) => {
                let status = err.status();
                let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "request body too large"
                } else {
                    "invalid multipart body"
                };
                let handler = state.handler.clone();
                return run_blocking(move || handler.rejected_upload(&ctx, status, message)).await;
            }
        },
        Err(_) => UploadForm {
            file: None,
            confirmed: false,
        },
    };
    let confirmed = query_confirmed || form.confirmed;
    let handler = state.handler.clone();
    run_blocking(move || handler.upload(&ctx, form.file, confirmed)).await
}

/// Handles `GET /api/history`.
async fn handle_history(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let ctx = state.request_context(&headers);
    let handler = state.handler.clone();
    run_blocking(move || handler.history(&ctx)).await
}

/// Handles `GET /api/data/{id}`.
async fn handle_data(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers);
    let handler = state.handler.clone();
    run_blocking(move || handler.data(&ctx, &id)).await
}

/// Handles `DELETE /api/data/{id}`.
async fn handle_delete(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers);
    let handler = state.handler.clone();
    run_blocking(move || handler.delete(&ctx, &id)).await
}

/// Handles `GET /api/summary/{id}`.
async fn handle_summary(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers);
    let handler = state.handler.clone();
    run_blocking(move || handler.summary(&ctx, &id)).await
}

/// Handles `GET /api/report/{id}`.
async fn handle_report(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers);
    let handler = state.handler.clone();
    run_blocking(move || handler.report(&ctx, &id)).await
}

/// Reads the `file` and `confirm` parts of a multipart body.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm {
        file: None,
        confirmed: false,
    };
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string).unwrap_or_default();
                let bytes = field.bytes().await?;
                form.file = Some(UploadFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("confirm") => {
                let value = field.text().await?;
                form.confirmed = is_truthy(&value);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Runs a blocking handler call and converts its response.
async fn run_blocking(work: impl FnOnce() -> ApiResponse + Send + 'static) -> Response {
    match tokio::task::spawn_blocking(work).await {
        Ok(response) => into_http(response),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "internal server error" })),
        )
            .into_response(),
    }
}

/// Converts an API response into an HTTP response.
#[must_use]
pub fn into_http(response: ApiResponse) -> Response {
    match response {
        ApiResponse::Json {
            status,
            body,
        } => (status, Json(body)).into_response(),
        ApiResponse::Document {
            report,
        } => {
            let disposition = format!("attachment; filename=\"{}\"", report.filename);
            (
                StatusCode::OK,
                [(CONTENT_TYPE, report.content_type), (CONTENT_DISPOSITION, disposition)],
                report.bytes,
            )
                .into_response()
        }
        ApiResponse::Empty {
            status,
        } => status.into_response(),
    }
}

/// Returns a trimmed, bounded header value.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_HEADER_VALUE_LENGTH)
        .map(str::to_string)
}

/// Interprets a confirmation flag.
fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Warns when the server listens beyond loopback; the API has no authentication.
fn emit_exposure_warning(addr: SocketAddr) {
    if !addr.ip().is_loopback() {
        let _ = writeln!(
            std::io::stderr(),
            "equipment-ledger: WARNING: listening on {addr} without authentication; owner \
             headers are trusted as supplied"
        );
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only header construction.")]

    use axum::http::HeaderMap;
    use axum::http::HeaderValue;
    use axum::http::StatusCode;
    use equipment_ledger_core::OwnerRef;
    use equipment_ledger_core::RenderedReport;

    use super::OWNER_HEADER;
    use super::REQUEST_ID_HEADER;
    use super::header_value;
    use super::into_http;
    use super::is_truthy;
    use crate::api::ApiResponse;

    #[test]
    fn confirmation_flags_accept_common_spellings() {
        for value in ["true", "TRUE", "1", "yes", " Yes "] {
            assert!(is_truthy(value), "{value} should confirm");
        }
        for value in ["", "false", "0", "no", "y"] {
            assert!(!is_truthy(value), "{value} should not confirm");
        }
    }

    #[test]
    fn header_values_are_trimmed_and_bounded() {
        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, HeaderValue::from_static("  operator-3  "));
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&"r".repeat(300)).unwrap());
        assert_eq!(header_value(&headers, OWNER_HEADER), Some("operator-3".to_string()));
        assert_eq!(header_value(&headers, REQUEST_ID_HEADER), None);
        let owner = header_value(&headers, OWNER_HEADER).map(OwnerRef::new);
        assert_eq!(owner, Some(OwnerRef::new("operator-3")));
    }

    #[test]
    fn documents_are_served_as_attachments() {
        let response = into_http(ApiResponse::Document {
            report: RenderedReport {
                content_type: "text/plain; charset=utf-8".to_string(),
                filename: "report_3.txt".to_string(),
                bytes: b"Equipment Report".to_vec(),
            },
        });
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers().get("content-disposition").unwrap();
        assert_eq!(disposition, "attachment; filename=\"report_3.txt\"");
    }

    #[test]
    fn empty_responses_keep_their_status() {
        let response = into_http(ApiResponse::Empty {
            status: StatusCode::NO_CONTENT,
        });
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
