use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::blocks::StoreError;
use crate::generation::flow::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every error body has the shape `{ "error": string, "code": string }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Proxy failure; the message is shown to the caller as-is.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Store(e) => (StatusCode::BAD_REQUEST, "INVALID_BLOCKS", e.to_string()),
            AppError::Generation(e) => {
                tracing::warn!("Generation error: {e}");
                let (status, code) = match e {
                    GenerationError::EmptyPrompt => (StatusCode::BAD_REQUEST, "EMPTY_PROMPT"),
                    GenerationError::TextService(_) => {
                        (StatusCode::BAD_GATEWAY, "TEXT_SERVICE_UNAVAILABLE")
                    }
                    GenerationError::EmptyContent => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_CONTENT")
                    }
                    GenerationError::Busy => (StatusCode::CONFLICT, "GENERATION_IN_PROGRESS"),
                };
                (status, code, e.user_message().to_string())
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_ERROR",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let AppError::Generation(e) = &self {
            body["canRetry"] = json!(e.can_retry());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_is_400_with_flat_body() {
        let response = AppError::Validation("Prompt is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Prompt is required");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generation_errors_carry_user_copy() {
        let response = AppError::from(GenerationError::EmptyContent).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], GenerationError::EmptyContent.user_message());
        assert_eq!(body["canRetry"], true);
    }

    #[tokio::test]
    async fn test_busy_is_conflict() {
        let response = AppError::from(GenerationError::Busy).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_internal_hides_details() {
        let response = AppError::Internal(anyhow::anyhow!("secret detail")).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "An internal server error occurred");
    }
}
