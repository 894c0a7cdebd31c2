use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::store::StoreError;
use crate::watchdog::ResolveError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
    Store(StoreError),
    Resolve(ResolveError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Store(err) => write!(f, "Store Error: {err}"),
            AppError::Resolve(err) => write!(f, "Resolve Error: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Store(err) => {
                tracing::error!("Store error: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Watchdog store unavailable".to_string(),
                )
            }
            AppError::Resolve(err) => {
                tracing::error!("{err}");
                let message = match err {
                    ResolveError::Insert(_) => "Failed to add exception".to_string(),
                    ResolveError::Update { exception_id, .. } => {
                        format!("Exception {exception_id} added but resolution not recorded")
                    }
                };
                (StatusCode::BAD_GATEWAY, message)
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        AppError::Resolve(err)
    }
}
