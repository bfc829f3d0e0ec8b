use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use items_shared::{ErrorResponse, FieldError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("item not found")]
    NotFound,

    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("database error: {0}")]
    Storage(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound => {
                tracing::debug!("Responding with 404");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        detail: "Item not found".to_string(),
                        errors: Vec::new(),
                    },
                )
            }
            ApiError::Validation(errors) => {
                tracing::debug!(?errors, "Rejected request");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        detail: "Validation failed".to_string(),
                        errors,
                    },
                )
            }
            err => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        detail: "Internal server error".to_string(),
                        errors: Vec::new(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
