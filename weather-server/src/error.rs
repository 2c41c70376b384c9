//! API error handling
//!
//! Every failure leaves the server running and answers with
//! `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use weather_core::{ChartsError, FetchError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] FetchError),

    #[error("{0}")]
    Internal(String),
}

impl From<ChartsError> for ApiError {
    fn from(err: ChartsError) -> Self {
        match err {
            ChartsError::Fetch(e) => ApiError::Upstream(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::BadRequest(msg) => warn!(%msg, "Rejected request"),
            ApiError::Upstream(FetchError::Config(msg)) => {
                error!(%msg, "Weather provider is not configured");
            }
            ApiError::Upstream(e) => error!(error = %e, "Weather lookup failed"),
            ApiError::Internal(msg) => error!(%msg, "Request failed"),
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
