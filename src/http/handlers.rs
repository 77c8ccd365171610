use super::state::AppState;
use crate::error::InvalidState;
use crate::hardware::{Button, Edge};
use crate::service::ConnectOutcome;
use crate::session::SessionConfig;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn outcome_response(outcome: ConnectOutcome) -> Response {
    let status = if outcome.connected {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(outcome)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.service.status()))
}

/// PUT /session
/// Drop the current session and connect with the posted configuration
pub async fn reconfigure_session(
    State(state): State<AppState>,
    Json(config): Json<SessionConfig>,
) -> Response {
    info!(
        "Reconfiguring session for {} at {}",
        config.username,
        config.address()
    );

    match state.service.reconfigure(config).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => {
            error!("Reconfigure failed: {:#}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, format!("{:#}", e))
        }
    }
}

/// POST /session/reconnect
pub async fn reconnect_session(State(state): State<AppState>) -> Response {
    match state.service.reconnect().await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => {
            error!("Reconnect failed: {:#}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, format!("{:#}", e))
        }
    }
}

/// POST /talk/unlatch
pub async fn unlatch(State(state): State<AppState>) -> Response {
    match state.service.unlatch().await {
        Ok(()) => (StatusCode::OK, Json(state.service.status().talk)).into_response(),
        Err(e) => match e.downcast_ref::<InvalidState>() {
            Some(invalid) => {
                warn!("Unlatch rejected: {}", invalid);
                error_response(StatusCode::CONFLICT, invalid.to_string())
            }
            None => {
                error!("Unlatch failed: {:#}", e);
                error_response(StatusCode::SERVICE_UNAVAILABLE, format!("{:#}", e))
            }
        },
    }
}

/// POST /buttons/:button/:edge
pub async fn press_button(
    State(state): State<AppState>,
    Path((button, edge)): Path<(Button, Edge)>,
) -> Response {
    match state.panel.press(button, edge).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            error!("Failed to inject button edge: {:#}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, format!("{:#}", e))
        }
    }
}
