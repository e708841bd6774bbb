//! HTTP route handlers and the request-boundary error translator.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::ActivationError;
use crate::framing;
use crate::loader::InitPayload;
use crate::service::ActionService;

/// `/init` body. A malformed body degrades to an all-defaults payload, so
/// metadata-only (and even empty) inits still persist the binding.
#[derive(Debug, Default, Deserialize)]
struct InitRequest {
    #[serde(default)]
    value: InitPayload,
}

/// `/run` body. Anything other than `{"value": {...}}` degrades to empty
/// arguments rather than failing.
#[derive(Debug, Default, Deserialize)]
struct RunRequest {
    #[serde(default)]
    value: Value,
}

/// A failure crossing the request boundary. Translated to an HTTP response
/// exactly once, here.
pub struct ActivationFailure(pub ActivationError);

impl From<ActivationError> for ActivationFailure {
    fn from(err: ActivationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ActivationFailure {
    fn into_response(self) -> Response {
        let error = self.0;

        // Full detail goes to the diagnostic log regardless of disclosure.
        tracing::error!(error = %error, detail = ?error, "request failed");

        let status = StatusCode::from_u16(error.status_code())
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = error.disclosed_message();

        // The user-visible message is activation log content; the sentinel
        // pair closes the frame even on failure.
        framing::log_to_stdout(&message);
        framing::emit_activation_end();

        json_response(status, &json!({ "error": message }))
    }
}

async fn init_action(
    State(service): State<Arc<ActionService>>,
    body: Bytes,
) -> Result<Response, ActivationFailure> {
    let payload = serde_json::from_slice::<InitRequest>(&body)
        .map(|r| r.value)
        .unwrap_or_default();

    service.init(&payload)?;

    Ok(json_response(StatusCode::OK, &json!({ "OK": true })))
}

async fn run_action(
    State(service): State<Arc<ActionService>>,
    body: Bytes,
) -> Result<Response, ActivationFailure> {
    let args = match serde_json::from_slice::<RunRequest>(&body) {
        Ok(RunRequest {
            value: Value::Object(map),
        }) => map,
        _ => Map::new(),
    };

    let result = service.run(args).await?;

    // Sentinels close the activation frame once the body is determined.
    let body = Value::Object(result).to_string().into_bytes();
    framing::emit_activation_end();

    Ok(raw_json_response(StatusCode::OK, body))
}

async fn unexpected_route(uri: Uri) -> ActivationFailure {
    ActivationFailure(ActivationError::UnexpectedRoute(uri.path().to_string()))
}

fn json_response(status: StatusCode, value: &Value) -> Response {
    raw_json_response(status, value.to_string().into_bytes())
}

fn raw_json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_LENGTH, body.len().to_string()),
        ],
        body,
    )
        .into_response()
}

pub fn routes(service: Arc<ActionService>) -> Router {
    Router::new()
        .route("/init", post(init_action))
        .route("/run", post(run_action))
        .fallback(unexpected_route)
        .with_state(service)
}
