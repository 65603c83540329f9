use crate::access::{self, AccessConfig};
use crate::credentials::CredentialProvider;
use crate::error::{GatewayError, Result};
use crate::logging::{LogLevel, SharedLogger};
use crate::proxy::{upstream_url, Forwarder, UpstreamResponse};
use crate::translate::anthropic_types::AnthropicRequest;
use crate::translate::openai_types::OpenAIChatResponse;
use crate::translate::{anthropic_to_openai, openai_to_anthropic};

use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Header carrying the gateway's own API key.
pub const API_KEY_HEADER: &str = "x-api-key";

pub struct AppState {
    pub access: AccessConfig,
    pub credentials: Arc<dyn CredentialProvider>,
    pub forwarder: Forwarder,
    pub logger: SharedLogger,
}

/// Build the router. It must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the access gate can
/// see the caller address.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/completions", post(handle_completions))
        .route("/v1/messages", post(handle_messages))
        .route("/v1/models", get(handle_list_models))
        .route("/v1/models/:model", get(handle_get_model))
        .route("/health", get(handle_health))
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn access_gate(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let caller = peer.ip().to_canonical().to_string();
    let supplied_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let decision = access::authorize(&caller, supplied_key, &state.access);

    let context = serde_json::json!({
        "request_id": Uuid::new_v4().to_string(),
        "caller": caller,
        "method": req.method().as_str(),
        "path": req.uri().path(),
    });

    if let Err(err) = decision.into_result() {
        state
            .logger
            .log_with_context(LogLevel::Warn, "access", format!("Rejected: {err}"), context);
        return err.into_response();
    }

    state
        .logger
        .log_with_context(LogLevel::Info, "access", "Accepted", context);
    next.run(req).await
}

/// `POST /v1/completions`: forwarded verbatim.
async fn handle_completions(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response> {
    let payload: serde_json::Value = parse_json(&body)?;
    let upstream = call_upstream(
        &state,
        Method::POST,
        &["v1", "completions"],
        Some(&payload),
    )
    .await?;
    Ok(relay(upstream))
}

/// `POST /v1/messages`: Anthropic in, chat completions upstream, Anthropic out.
/// Upstream failures are relayed untranslated.
async fn handle_messages(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response> {
    let req: AnthropicRequest = parse_json(&body)?;
    let payload = serde_json::to_value(anthropic_to_openai(&req))?;

    let upstream = call_upstream(
        &state,
        Method::POST,
        &["chat", "completions"],
        Some(&payload),
    )
    .await?;
    if !upstream.is_success() {
        state.logger.warn(
            "proxy",
            format!("Chat completion failed with status {}", upstream.status),
        );
        return Ok(relay(upstream));
    }

    let chat: OpenAIChatResponse = serde_json::from_slice(&upstream.body).map_err(|e| {
        GatewayError::upstream(format!("Unexpected chat completion body: {e}"))
    })?;
    let message = openai_to_anthropic(&chat);

    if let Some(ref usage) = message.usage {
        state.logger.info(
            "proxy",
            format!(
                "Completed: in={} out={} tokens",
                usage.input_tokens, usage.output_tokens
            ),
        );
    }

    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::OK);
    Ok((status, Json(message)).into_response())
}

async fn handle_list_models(State(state): State<Arc<AppState>>) -> Result<Response> {
    let upstream = call_upstream(&state, Method::GET, &["models"], None).await?;
    Ok(relay(upstream))
}

async fn handle_get_model(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
) -> Result<Response> {
    if model == "." || model == ".." {
        return Err(GatewayError::malformed(format!("Invalid model id {model:?}")));
    }
    let upstream = call_upstream(&state, Method::GET, &["models", model.as_str()], None).await?;
    Ok(relay(upstream))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Read credentials fresh, then forward to `{endpoint}/{segments..}`.
async fn call_upstream(
    state: &AppState,
    method: Method,
    segments: &[&str],
    body: Option<&serde_json::Value>,
) -> Result<UpstreamResponse> {
    let creds = state.credentials.get_credentials().await.map_err(|e| {
        state.logger.error("credentials", e.to_string());
        e
    })?;

    let url = upstream_url(&creds.endpoint_base_url, segments).map_err(|e| {
        state.logger.error("credentials", e.to_string());
        e
    })?;
    state.logger.info("proxy", format!("{method} {url}"));

    state
        .forwarder
        .forward(method, &url, &creds.bearer_token, body)
        .await
        .map_err(|e| {
            state.logger.error("proxy", e.to_string());
            e
        })
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| GatewayError::malformed(e.to_string()))
}

fn relay(upstream: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        upstream.body,
    )
        .into_response()
}
