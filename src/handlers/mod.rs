pub mod devices;
pub mod objects;
pub mod stacks;
pub mod templates;
pub mod views;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::EngineError;
use crate::models::Snapshot;
use crate::AppState;

/// Error response - `{"error": "message"}`
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// API error type
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("{} not found", resource),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::NotFound { .. } => Self {
                status: StatusCode::NOT_FOUND,
                message,
            },
            EngineError::DuplicateVariable { .. } | EngineError::Conflict(_) => Self::conflict(message),
            EngineError::ReadOnly { .. } => Self::forbidden(message),
            _ => Self::bad_request(message),
        }
    }
}

/// Response helper: return 201 Created with JSON body
pub fn created<T: Serialize>(item: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(item))
}

/// Healthcheck endpoint - returns 200 OK with status
pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "template-stacks",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// The whole current snapshot
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    let snapshot = state.store.snapshot().await;
    Json(Snapshot::clone(&snapshot))
}
