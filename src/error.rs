use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    models::{ErrorResponse, UserId},
    policy::Denial,
    validation::ValidationErrors,
};

/// StoreError
///
/// Failures a `UserRepository` can report. `NotFound` is a variant of its own so
/// handlers never have to inspect error text to recognise a missing row.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(UserId),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// ApiError
///
/// The single failure path of every handler. Each variant maps to exactly one
/// status code; `Unexpected` is the generic handler and hides its cause from clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("user not found")]
    NotFound,

    #[error("unexpected error: {0}")]
    Unexpected(#[source] StoreError),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthorized => ApiError::Unauthorized,
            Denial::Forbidden(reason) => ApiError::Forbidden(reason.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Unexpected(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => ErrorResponse {
                error: "Validation failed".to_string(),
                message: None,
                details: Some(errors.into_details()),
            },
            ApiError::Unauthorized => ErrorResponse {
                error: "Unauthorized".to_string(),
                message: Some("Authentication required".to_string()),
                details: None,
            },
            ApiError::Forbidden(reason) => ErrorResponse {
                error: "Forbidden".to_string(),
                message: Some(reason),
                details: None,
            },
            ApiError::NotFound => ErrorResponse {
                error: "User not found".to_string(),
                message: None,
                details: None,
            },
            ApiError::Unexpected(ref e) => {
                tracing::error!("Unhandled store error: {:?}", e);
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    message: None,
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
