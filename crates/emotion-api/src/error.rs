use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use emotion_ai::ModelError;
use emotion_store::{AdminError, StoreError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Body of every 500 response. Details go to the log only.
const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("emotion model is not loaded")]
    ModelUnavailable,

    #[error("admin store is not configured")]
    AdminUnavailable,

    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),

    #[error("document store failure: {0}")]
    Store(#[from] StoreError),
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            AdminError::Store(e) => ApiError::Store(e),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            ApiError::InvalidInput(msg) => msg.clone(),
            other => {
                error!(error = %other, "request failed");
                INTERNAL_MESSAGE.to_string()
            }
        };
        HttpResponse::build(status).json(json!({ "error": message }))
    }
}
