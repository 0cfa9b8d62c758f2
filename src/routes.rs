//! HTTP surface.
//!
//! Thin dispatch in front of the cache and the orchestrator:
//!
//! - `GET /` — the cached text as plain UTF-8 with a trailing newline, or
//!   503 while nothing has been generated yet.
//! - `POST /update` — bearer-authenticated manual refresh; runs the
//!   orchestrator synchronously and reports its outcome as JSON.
//! - `GET /healthz` — liveness probe.
//! - `OPTIONS` anywhere answers 204; every response carries CORS headers.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::error;

use crate::cache::CONTENT_KEY;
use crate::state::AppState;

const EMPTY_CACHE_MESSAGE: &str = "Content has not been generated yet. Please try again later.\n";

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(read_content).options(preflight))
        .route("/update", post(update).options(preflight))
        .route("/healthz", get(health).options(preflight))
        .fallback(fallback)
        .layer(middleware::map_response(add_cors_headers))
        .with_state(state)
}

/// Serve the cached content as plain text with a single trailing newline.
async fn read_content(State(state): State<AppState>) -> Response {
    match state.store.get(CONTENT_KEY).await {
        Ok(Some(content)) => (StatusCode::OK, format!("{content}\n")).into_response(),
        Ok(None) => {
            (StatusCode::SERVICE_UNAVAILABLE, EMPTY_CACHE_MESSAGE.to_string()).into_response()
        }
        Err(err) => {
            error!(error = %err, "cache read failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// JSON body for the manual-update endpoint.
#[derive(Debug, Serialize)]
struct UpdateResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_content: Option<String>,
}

impl UpdateResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            model_used: None,
            new_content: None,
        }
    }
}

/// Manual refresh, guarded by the shared update token.
async fn update(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(expected) = state.config.update_token.as_deref() else {
        error!("update requested but HERALD_UPDATE_TOKEN is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UpdateResponse::failure("update token is not configured")),
        )
            .into_response();
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = provided else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(UpdateResponse::failure(
                "missing or malformed authorization header",
            )),
        )
            .into_response();
    };

    if token != expected {
        return (
            StatusCode::FORBIDDEN,
            Json(UpdateResponse::failure("invalid update token")),
        )
            .into_response();
    }

    match state.refresher.run().await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(UpdateResponse {
                success: true,
                message: format!("content updated via {} tier", outcome.tier),
                model_used: Some(outcome.model),
                new_content: Some(outcome.content),
            }),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "manual update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UpdateResponse::failure(err.detail())),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Preflight response for registered paths.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Unknown paths: preflight still answers 204, everything else is 404.
async fn fallback(method: Method) -> StatusCode {
    if method == Method::OPTIONS {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Attach CORS headers to every response, including errors and preflights.
async fn add_cors_headers(response: Response) -> Response {
    let mut response = response;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Authorization, Content-Type"),
    );
    response
}
