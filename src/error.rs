//! HTTP error type shared by all handlers.
//!
//! Every failure is reported as `{"success": false, "error": "<message>"}`;
//! the variant only decides the status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input caught before touching the database.
    #[error("{0}")]
    BadRequest(String),

    /// Parse or database failure on the write path. Reported as 400.
    #[error("{0:#}")]
    Ingest(anyhow::Error),

    /// Database failure on the read path.
    #[error("{0:#}")]
    Query(anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Ingest(_) => StatusCode::BAD_REQUEST,
            ApiError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}
