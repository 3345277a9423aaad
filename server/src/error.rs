use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use slateink_shared::ErrorBody;

use crate::store::StoreError;

/// API failures, each mapped to one status code and a JSON body of the
/// form `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Note not found")]
    NotFound,

    #[error("Missing required fields")]
    MissingFields,

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal server error")]
    Internal(#[source] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MissingFields | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref source) = self {
            tracing::error!("store failure: {source}");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::Internal(error)
    }
}
