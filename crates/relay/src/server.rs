//! Relay HTTP surface.
//!
//! Bridges browser chat clients to the upstream completion provider without
//! leaking provider-specific framing concerns to the caller.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Run a completion over `{messages, stream}` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! With `stream: false` the response is the buffered completion JSON. With
//! `stream: true` the response is `Content-Type: text/event-stream` with
//! `Cache-Control: no-cache`, forwarding the provider's `data: {...}`
//! frames as they arrive.
//!
//! # Error Contract
//!
//! All error responses are JSON:
//!
//! ```json
//! { "error": { "code": "configuration", "message": "..." } }
//! ```
//!
//! Codes: `configuration` (500), `upstream` (502), `upstream_protocol`
//! (502), `timeout` (504), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support the browser
//! chat widget.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sitechat_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::client::{ChatRequest, CompletionClient, Message};
use crate::providers::OpenAiCompatClient;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    /// Application configuration (wrapped in `Arc` for cheap cloning).
    config: Arc<AppConfig>,
    /// Upstream completion client.
    client: Arc<dyn CompletionClient>,
}

/// Request body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurnRequest {
    /// Ordered conversation messages
    pub messages: Vec<Message>,

    /// Request incremental output
    #[serde(default)]
    pub stream: bool,
}

/// Start the relay HTTP server.
///
/// Binds to `config.bind` and serves until the process is terminated.
pub async fn run_server(config: &AppConfig) -> AppResult<()> {
    let client = Arc::new(OpenAiCompatClient::from_config(config));
    run_server_with_client(config, client).await
}

/// Start the relay with a custom completion client.
pub async fn run_server_with_client(
    config: &AppConfig,
    client: Arc<dyn CompletionClient>,
) -> AppResult<()> {
    let bind_addr = config.bind.clone();
    let app = router(config, client);

    tracing::info!("Relay listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the relay router. Exposed separately so tests can drive handlers
/// without binding a socket.
pub fn router(config: &AppConfig, client: Arc<dyn CompletionClient>) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        client,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable
/// message.
#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"configuration"`, `"upstream"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct RelayError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<AppError> for RelayError {
    fn from(err: AppError) -> Self {
        let (status, code) = match &err {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration"),
            AppError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream"),
            AppError::UpstreamProtocol(_) => (StatusCode::BAD_GATEWAY, "upstream_protocol"),
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /chat ============

/// Handler for `POST /chat`.
///
/// Every call is stateless with respect to prior calls: the full message
/// list arrives in the body, and nothing is persisted.
async fn handle_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatTurnRequest>,
) -> Result<Response, RelayError> {
    let request = ChatRequest::new(state.config.model.clone(), body.messages)
        .with_temperature(state.config.temperature)
        .with_max_tokens(state.config.max_tokens);

    if body.stream {
        // Bytes are forwarded as they arrive; an upstream failure
        // mid-stream terminates the body, which the consumer surfaces
        let stream = state
            .client
            .stream_bytes(&request.with_streaming())
            .await?;

        Response::builder()
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from_stream(stream))
            .map_err(|e| RelayError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message: e.to_string(),
            })
    } else {
        let completion = state.client.complete(&request).await?;
        Ok(Json(completion).into_response())
    }
}
