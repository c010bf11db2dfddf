//! HTTP route handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use obs_control_core::action::ActionBody;

use crate::health::HealthResponse;
use crate::panel;
use crate::server::AppState;

/// Body of `POST /api/action` responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn success(message: String) -> Self {
        Self {
            ok: true,
            message: Some(message),
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            ok: false,
            message: None,
            error: Some(error),
        }
    }
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health.snapshot().into())
}

/// `GET /api/panel`
pub async fn panel(State(state): State<AppState>) -> Response {
    match panel::load_panel(&state.panel_path).await {
        Ok(document) => Json(document).into_response(),
        Err(e) => {
            tracing::warn!(path = %state.panel_path.display(), error = %e, "Panel document not readable");
            (StatusCode::INTERNAL_SERVER_ERROR, "panel.json not readable").into_response()
        }
    }
}

/// `POST /api/action`
pub async fn action(State(state): State<AppState>, body: Bytes) -> Response {
    let body = match parse_action_body(&body) {
        Ok(body) => body,
        Err(e) => {
            let error = format!("invalid request body: {e}");
            return (StatusCode::BAD_REQUEST, Json(ActionResponse::failure(error))).into_response();
        }
    };

    match state.dispatcher.dispatch(&body).await {
        Ok(message) => Json(ActionResponse::success(message)).into_response(),
        Err(e) => {
            (StatusCode::BAD_REQUEST, Json(ActionResponse::failure(e.to_string()))).into_response()
        }
    }
}

/// Only malformed JSON is an error. Empty bodies and `null` count as `{}`;
/// field types are left for the dispatcher to judge.
fn parse_action_body(raw: &[u8]) -> Result<ActionBody, serde_json::Error> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(ActionBody::default());
    }
    let value: Value = serde_json::from_slice(raw)?;
    Ok(ActionBody::from(value))
}
