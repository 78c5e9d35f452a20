//! HTTP host
//!
//! `POST /` takes the whole request body as input and answers with the whole
//! transcoded payload as `application/octet-stream`. Failures are JSON:
//!
//! ```text
//! 400  {"error": "input_unavailable", "message": "..."}
//! 403  {"error": "capability_denied", "message": "..."}
//! 500  {"error": "sandbox_failed" | "internal", "message": "..."}
//! ```

use super::ModePolicy;
use crate::bridge::{Bridge, Host};
use crate::error::BridgeError;
use crate::invocation::{Invocation, Output};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use wzip_format::Mode;

/// Default request body limit (64MB)
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Server settings
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub policy: ModePolicy,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            policy: ModePolicy::Fixed(Mode::Compress),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug)]
struct AppState {
    bridge: Bridge,
    policy: ModePolicy,
}

/// Build the router
pub fn router(bridge: Bridge, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        bridge,
        policy: config.policy,
    });

    Router::new()
        .route("/", post(transcode))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .with_state(state)
}

async fn transcode(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ServerError> {
    tracing::info!(len = body.len(), policy = %state.policy, "Request received");

    let host = RequestHost::new(body.to_vec(), state.policy);
    let payload = state.bridge.dispatch(host).await?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], payload).into_response())
}

/// [`Host`] for one request body
#[derive(Debug)]
pub struct RequestHost {
    body: Option<Vec<u8>>,
    policy: ModePolicy,
}

impl RequestHost {
    pub fn new(body: Vec<u8>, policy: ModePolicy) -> Self {
        Self {
            body: Some(body),
            policy,
        }
    }
}

impl Host for RequestHost {
    type Delivery = Vec<u8>;
    const NAME: &'static str = "server";

    fn collect(&mut self) -> Result<Invocation, BridgeError> {
        let body = self
            .body
            .take()
            .ok_or_else(|| BridgeError::input_unavailable("request body already consumed", None))?;
        let mode = self.policy.resolve(&body);
        Ok(Invocation::from_bytes(mode, body))
    }

    fn deliver(self, output: Output) -> Result<Vec<u8>, BridgeError> {
        match output {
            Output::Bytes(bytes) => Ok(bytes),
            Output::Written(_) => Err(BridgeError::UnexpectedOutput { host: Self::NAME }),
        }
    }
}

/// JSON body of a failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// A bridge failure rendered as an HTTP response
#[derive(Debug)]
pub struct ServerError(pub BridgeError);

impl From<BridgeError> for ServerError {
    fn from(error: BridgeError) -> Self {
        Self(error)
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            BridgeError::InputUnavailable { .. } => StatusCode::BAD_REQUEST,
            BridgeError::CapabilityDenied { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            BridgeError::InputUnavailable { .. } => "input_unavailable",
            BridgeError::CapabilityDenied { .. } => "capability_denied",
            e if e.is_sandbox_failure() => "sandbox_failed",
            _ => "internal",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
