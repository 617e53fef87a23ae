use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use common::error::AppError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Parse(msg) | AppError::Validation(msg) => Self::Validation(msg),
            AppError::NotFound(msg) => Self::NotFound(msg),
            AppError::Cancelled => {
                Self::Pipeline("The pipeline was cancelled before completing".to_string())
            }
            other => {
                tracing::error!(error = %other, "Pipeline failure");
                Self::Pipeline("The alert pipeline failed; see server logs".to_string())
            }
        }
    }
}

/// Stable error envelope returned by every failing endpoint.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    correlation_id: Uuid,
    error_code: &'static str,
    message: String,
    timestamp: DateTime<Utc>,
    details: serde_json::Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
            Self::Pipeline(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_ERROR", message)
            }
        };

        let body = ErrorResponse {
            correlation_id: Uuid::new_v4(),
            error_code,
            message,
            timestamp: Utc::now(),
            details: serde_json::Value::Null,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_status_code(error: ApiError, expected: StatusCode) {
        let response = error.into_response();
        assert_eq!(response.status(), expected);
    }

    #[test]
    fn app_errors_map_to_api_errors() {
        let parse = AppError::Parse("bad payload".to_string());
        assert!(matches!(ApiError::from(parse), ApiError::Validation(msg) if msg == "bad payload"));

        let validation = AppError::Validation("bad input".to_string());
        assert!(matches!(ApiError::from(validation), ApiError::Validation(_)));

        let cancelled = AppError::Cancelled;
        assert!(matches!(ApiError::from(cancelled), ApiError::Pipeline(_)));

        let provider = AppError::Provider("llm down".to_string());
        assert!(matches!(ApiError::from(provider), ApiError::Pipeline(_)));
    }

    #[test]
    fn status_codes_follow_the_wire_contract() {
        assert_status_code(
            ApiError::Validation("invalid".to_string()),
            StatusCode::BAD_REQUEST,
        );
        assert_status_code(
            ApiError::NotFound("missing".to_string()),
            StatusCode::NOT_FOUND,
        );
        assert_status_code(
            ApiError::Pipeline("boom".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        );
    }

    #[test]
    fn internal_details_are_not_leaked_for_pipeline_errors() {
        let err = ApiError::from(AppError::Provider("secret connection string".to_string()));
        if let ApiError::Pipeline(message) = &err {
            assert!(!message.contains("secret"));
        } else {
            panic!("expected pipeline error");
        }
    }
}
