//! HTTP surface of the simulator.
//!
//! Every TD target lives under `/workspaces/...`: GET resolves property
//! reads, discovery documents and goal reports; POST dispatches actions.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;

use hmas_config::{HmasConfig, World};
use hmas_core::{DispatchError, Resource, Simulator};
use hmas_devices::{load_blocksworld, load_homes};

const TURTLE: &str = "text/turtle; charset=utf-8";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

#[derive(Clone)]
pub struct AppState {
    simulator: Arc<Simulator>,
}

impl AppState {
    pub fn new(simulator: Simulator) -> Self {
        Self {
            simulator: Arc::new(simulator),
        }
    }
}

/// Error envelope: `{"error": <message>, "status_code": <code>}`
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    status_code: u16,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        if matches!(err, DispatchError::InternalError(_)) {
            tracing::error!(error = %err, "internal error while serving request");
        }
        let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            status_code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(platform))
        .route("/health", get(health))
        .route("/reset", post(reset))
        .route("/workspaces/{*path}", get(read_resource).post(invoke_action))
        .fallback(not_found)
        .with_state(state)
}

/// Build the simulator for the configured world.
pub fn load_simulator(config: &HmasConfig) -> anyhow::Result<Simulator> {
    let server = &config.server;
    let simulator = match server.world {
        World::HomeBench => load_homes(&server.data_dir, &server.base_url, server.strict_handlers),
        World::Blocksworld => load_blocksworld(&server.data_dir, &server.base_url, server.strict_handlers),
    }
    .with_context(|| {
        format!(
            "load {} world from {}",
            server.world,
            server.data_dir.display()
        )
    })?;
    Ok(simulator)
}

pub async fn run_server(config: HmasConfig) -> anyhow::Result<()> {
    let listen: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.server.listen))?;
    let simulator = load_simulator(&config)?;
    let app = router(AppState::new(simulator));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context("bind server listener failed")?;
    tracing::info!(
        listen = %listen,
        base_url = %config.server.base_url,
        world = %config.server.world,
        "hmas-server listening"
    );
    axum::serve(listener, app)
        .await
        .context("server terminated with error")
}

/// Install the global subscriber once. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) {
    TRACING_INIT.get_or_init(|| {
        let fallback = match level.trim().to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

async fn platform(State(state): State<AppState>) -> Response {
    turtle(state.simulator.platform_document())
}

async fn read_resource(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response, ApiError> {
    let path = format!("/workspaces/{}", path);
    match state.simulator.get(&path)? {
        Resource::Json(value) => Ok(Json(value).into_response()),
        Resource::Turtle(doc) => Ok(turtle(doc)),
    }
}

async fn invoke_action(
    State(state): State<AppState>,
    Path(path): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let path = format!("/workspaces/{}", path);
    let payload = parse_body(&body)?;
    let outcome = state.simulator.dispatch(&path, &payload)?;
    Ok(Json(outcome).into_response())
}

async fn reset(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let payload = parse_body(&body)?;
    let home = match payload.get("home") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => {
            return Err(ApiError::new(StatusCode::BAD_REQUEST, "Missing 'home' field in request body"));
        }
        Some(other) => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("Invalid 'home' field: {}", other),
            ));
        }
    };
    let devices_reset = state.simulator.reset(&home)?;
    Ok(Json(serde_json::json!({
        "status": "success",
        "message": format!("Home {} reset to initial state", home),
        "devices_reset": devices_reset,
    })))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, format!("Resource not found: {}", uri.path()))
}

/// Empty bodies read as `null`.
fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)))
}

fn turtle(doc: String) -> Response {
    ([(header::CONTENT_TYPE, TURTLE)], doc).into_response()
}
