use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::task::TaskServiceError;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of what went wrong
    pub message: String,
    /// Underlying error detail, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: String, error: Option<String>) -> Self {
        Self { message, error }
    }
}

/// Error type for the JSON API boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed or failed validation.
    #[error("{message}")]
    Validation {
        message: String,
        detail: Option<String>,
    },
    /// The addressed task does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The store or runtime failed while handling the request.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: TaskServiceError,
    },
    /// No route matches the request.
    #[error("API endpoint not found")]
    RouteNotFound,
}

impl ApiError {
    /// Translates a service failure, using `context` as the message for
    /// store failures.
    pub fn from_service(err: TaskServiceError, context: &str) -> Self {
        match err {
            TaskServiceError::Validation(message) => ApiError::Validation {
                message,
                detail: None,
            },
            TaskServiceError::TaskNotFound(_) => ApiError::NotFound("Task not found".to_string()),
            source @ TaskServiceError::Database(_) => ApiError::Internal {
                message: context.to_string(),
                source,
            },
        }
    }

    /// Reports a JSON body that could not be read into the expected shape.
    pub fn invalid_body(rejection: JsonRejection) -> Self {
        ApiError::Validation {
            message: "Invalid request body".to_string(),
            detail: Some(rejection.body_text()),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation { message, detail } => ErrorResponse::new(message, detail),
            ApiError::NotFound(message) => ErrorResponse::new(message, None),
            ApiError::Internal { message, source } => {
                tracing::error!(error = %source, "{}", message);
                ErrorResponse::new(message, Some(source.to_string()))
            }
            ApiError::RouteNotFound => {
                ErrorResponse::new("API endpoint not found".to_string(), None)
            }
        };
        (status, Json(body)).into_response()
    }
}
