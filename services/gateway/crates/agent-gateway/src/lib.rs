//! Agent gateway — the HTTP application registered as `yield_agent.server:app`.
//!
//! Routes:
//!   - `GET  /`        → informational status (`online`)
//!   - `GET  /health`  → probe for load balancers (`healthy`)
//!   - `POST /invoke`  → run the agent (requires `X-API-Key`)
//!   - `POST /chat`    → alias of `/invoke`
//!
//! Agent failures never change the HTTP status: they are reported as
//! `{"success": false, "error": ...}` with 200.

pub mod backend;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use berth_common::{
    AgentInput, AgentRequest, AgentResponse, ErrorDetail, GatewayConfig, HealthResponse,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use backend::{AgentBackend, Backend, UpstreamAgent};

/// Application identifier under which the gateway is registered.
pub const APP_IDENTIFIER: &str = "yield_agent.server:app";

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared state for all handlers.
pub struct GatewayState<B> {
    api_key: String,
    backend: B,
}

impl<B: AgentBackend> GatewayState<B> {
    #[must_use]
    pub fn new(api_key: impl Into<String>, backend: B) -> Self {
        Self {
            api_key: api_key.into(),
            backend,
        }
    }
}

/// Build the gateway application from configuration.
///
/// # Errors
///
/// Returns an error if the configured backend cannot be constructed.
pub fn app(config: &GatewayConfig) -> Result<Router> {
    tracing::info!("initializing yield intelligence agent");
    if config.uses_default_api_key() {
        tracing::warn!("AGENT_API_KEY not set, accepting the built-in default key");
    }
    let backend = Backend::from_config(config)?;
    match config.upstream_url() {
        Some(url) => tracing::info!(upstream = %url, graph = %config.agent_graph_id, "agent ready"),
        None => tracing::warn!("AGENT_UPSTREAM_URL not set, invocations will fail"),
    }
    Ok(router(GatewayState::new(config.agent_api_key.clone(), backend)))
}

/// Compose the router around an explicit state.
pub fn router<B: AgentBackend>(state: GatewayState<B>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/invoke", post(invoke::<B>))
        .route("/chat", post(invoke::<B>))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn root() -> Json<HealthResponse> {
    Json(HealthResponse::online())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

async fn invoke<B: AgentBackend>(
    State(state): State<Arc<GatewayState<B>>>,
    _key: ApiKey,
    Json(request): Json<AgentRequest>,
) -> Json<AgentResponse> {
    let input = match AgentInput::from_request(&request) {
        Ok(input) => input,
        Err(e) => return Json(AgentResponse::failed(e.to_string())),
    };
    match state.backend.invoke(&input).await {
        Ok(text) => Json(AgentResponse::ok(text)),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "agent invocation failed");
            Json(AgentResponse::failed(format!("{e:#}")))
        }
    }
}

/// Proof that the request carried the configured API key.
pub struct ApiKey;

impl<B: AgentBackend> FromRequestParts<Arc<GatewayState<B>>> for ApiKey {
    type Rejection = (StatusCode, Json<ErrorDetail>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState<B>>,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());
        match presented {
            None => Err(reject(StatusCode::UNAUTHORIZED, "Missing API key")),
            Some(key) if constant_time_eq(key.as_bytes(), state.api_key.as_bytes()) => Ok(Self),
            Some(_) => Err(reject(StatusCode::FORBIDDEN, "Invalid API key")),
        }
    }
}

fn reject(status: StatusCode, detail: &str) -> (StatusCode, Json<ErrorDetail>) {
    (
        status,
        Json(ErrorDetail {
            detail: detail.to_string(),
        }),
    )
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
