//! JSON HTTP API over the [`Assistant`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/providers` | All providers, configured subset, active provider |
//! | `POST` | `/search` | Ranked site content for `query` |
//! | `POST` | `/context` | Rendered context block for `query` |
//! | `POST` | `/augment` | `message` with the context block prepended |
//! | `POST` | `/chat` | Send `message` to a provider |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "no_api_key", "message": "Groq API key is not configured. ..." } }
//! ```
//!
//! Provider failures use the [`ErrorKind`] code. Request-side failures
//! (`empty_message`, `invalid_request`, `provider_not_configured`,
//! `no_api_key`, `no_endpoint`) are 400; upstream failures (`api_error`,
//! `transport_error`, `malformed_response`) are 502.
//!
//! # Blocking Calls
//!
//! Provider calls use a blocking HTTP client, so `/chat` runs them on
//! tokio's blocking pool.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use assistant_gateway_core::SearchResult;

use crate::assistant::{Assistant, SendOptions};
use crate::provider::{ChatResponse, ErrorKind, ProviderError, ProviderInfo};

type AppState = Arc<Assistant>;

/// Build the router. Exposed separately from [`run_server`] so it can be
/// mounted or exercised without binding a socket.
pub fn router(assistant: Arc<Assistant>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/providers", get(handle_providers))
        .route("/search", post(handle_search))
        .route("/context", post(handle_context))
        .route("/augment", post(handle_augment))
        .route("/chat", post(handle_chat))
        .layer(cors)
        .with_state(assistant)
}

/// Bind `bind_addr` and serve until the process is terminated.
pub async fn run_server(assistant: Arc<Assistant>, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(assistant);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "assistant gateway listening");
    axum::serve(listener, app).await?;

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

#[derive(Debug)]
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

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::EmptyMessage
            | ErrorKind::InvalidRequest
            | ErrorKind::ProviderNotConfigured
            | ErrorKind::NoApiKey
            | ErrorKind::NoEndpoint => StatusCode::BAD_REQUEST,
            ErrorKind::ApiError | ErrorKind::TransportError | ErrorKind::MalformedResponse => {
                StatusCode::BAD_GATEWAY
            }
        };
        AppError {
            status,
            code: kind.code().to_string(),
            message: err.to_string(),
        }
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
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

// ============ GET /providers ============

#[derive(Serialize)]
struct ProvidersResponse {
    providers: Vec<ProviderInfo>,
    configured: Vec<String>,
    active: String,
}

async fn handle_providers(State(assistant): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: assistant.list_providers(),
        configured: assistant
            .list_configured_providers()
            .into_iter()
            .map(|p| p.id)
            .collect(),
        active: assistant.active_provider().id().to_string(),
    })
}

// ============ POST /search, /context, /augment ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

async fn handle_search(
    State(assistant): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let results = match req.limit {
        Some(limit) => assistant.search(&req.query, limit),
        None => assistant.search_default(&req.query),
    };
    Json(SearchResponse { results })
}

#[derive(Deserialize)]
struct ContextRequest {
    query: String,
}

#[derive(Serialize)]
struct ContextResponse {
    context: String,
}

async fn handle_context(
    State(assistant): State<AppState>,
    Json(req): Json<ContextRequest>,
) -> Json<ContextResponse> {
    Json(ContextResponse {
        context: assistant.get_context(&req.query),
    })
}

#[derive(Deserialize)]
struct AugmentRequest {
    message: String,
}

#[derive(Serialize)]
struct AugmentResponse {
    message: String,
}

async fn handle_augment(
    State(assistant): State<AppState>,
    Json(req): Json<AugmentRequest>,
) -> Json<AugmentResponse> {
    Json(AugmentResponse {
        message: assistant.augment_message(&req.message),
    })
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatBody {
    message: String,
    #[serde(flatten)]
    options: SendOptions,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    provider: String,
    #[serde(flatten)]
    response: ChatResponse,
}

async fn handle_chat(
    State(assistant): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatReply>, AppError> {
    let outcome = tokio::task::spawn_blocking(move || {
        let (provider, response) = assistant.dispatch(&body.message, &body.options)?;
        Ok::<_, ProviderError>(ChatReply {
            provider: provider.id().to_string(),
            response,
        })
    })
    .await
    .map_err(|e| internal(format!("chat task failed: {}", e)))?;

    Ok(Json(outcome?))
}
