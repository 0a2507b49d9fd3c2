use axum::{Json, extract::State, http::StatusCode};
use inkpad_api::{ApiError, MessageResponse};
use inkpad_core::{Timestamp, now_utc};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
    pub timestamp: Timestamp,
}

/// `GET /api/health`: liveness plus a storage round trip.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = state.notes.backend_name();
    let reachable = match state.notes.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(storage, error = %e, "health check: storage unreachable");
            false
        }
    };

    let (code, status) = if reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            storage,
            timestamp: now_utc(),
        }),
    )
}

/// Fallback for paths no route matches.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Fallback for a known path called with an unsupported method.
pub async fn method_not_allowed() -> (StatusCode, Json<MessageResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MessageResponse::new("Method not allowed")),
    )
}
