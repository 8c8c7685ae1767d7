//! # Web API Error Types
//!
//! HTTP-facing errors and their status-code mappings. Every error renders as
//! a `{"error": "..."}` JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::RankForgeError;

/// Web API specific errors with HTTP status code mappings
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("job not found")]
    NotFound,

    #[error("service temporarily unavailable")]
    ServiceUnavailable,

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<RankForgeError> for ApiError {
    fn from(err: RankForgeError) -> Self {
        match err {
            RankForgeError::Validation(message) => Self::BadRequest(message),
            RankForgeError::JobNotFound(_) => Self::NotFound,
            RankForgeError::Store(_) => Self::ServiceUnavailable,
            _ => Self::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
