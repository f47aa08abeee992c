use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use calendar_shared::api::{ApiErrorBody, ApiResponse, FieldViolation};

use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Access denied")]
    Forbidden,

    #[error("Too many requests. Please try again later.")]
    TooManyRequests,

    #[error("Content-Type must be application/json")]
    UnsupportedContentType,

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_id_required() -> Self {
        AppError::BadRequest("UserId is required".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::Validation(_)
            | AppError::UnsupportedContentType => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::UnsupportedContentType,
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error = match self {
            AppError::Validation(violations) => ApiErrorBody::Violations(violations),
            other => {
                if status.is_server_error() {
                    tracing::error!("Request failed: {:?}", other);
                }
                ApiErrorBody::Message(other.to_string())
            }
        };

        (status, Json(ApiResponse::<()>::failure(error))).into_response()
    }
}
