//! HTTP error response conversion
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`.
//! Use `AppError` (or types that implement `Into<AppError>`) for errors and
//! `.map_err(Into::into)` so they render consistently (status, body, logging).

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use textlens_core::{AppError, ErrorMetadata, LogLevel};
use textlens_storage::StorageError;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Wait 60s and retry")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    /// Seconds to wait before retrying; only set on 429 responses.
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Wrapper type for AppError to implement IntoResponse
/// Necessary because of Rust's orphan rules: we can't implement
/// IntoResponse (external trait) for AppError (type from textlens-core).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::DownloadFailed(msg) => AppError::DownloadFailed(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::UploadFailed(msg)
            | StorageError::DeleteFailed(msg)
            | StorageError::ConfigError(msg) => AppError::Storage(msg),
            StorageError::IoError(e) => AppError::Storage(format!("IO error: {}", e)),
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let retry_after = match app_error {
            AppError::RateLimited {
                retry_after_seconds,
            } => Some(*retry_after_seconds),
            _ => None,
        };

        // Hide details in production and for sensitive errors.
        let details = if is_production_env() || app_error.is_sensitive() {
            None
        } else {
            Some(app_error.to_string())
        };

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            details,
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
            retry_after,
        });

        let mut response = (status, body).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limited_response_carries_retry_after_header() {
        let response = HttpAppError(AppError::RateLimited {
            retry_after_seconds: 42,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get("Retry-After").unwrap(),
            &HeaderValue::from_static("42")
        );
    }

    #[tokio::test]
    async fn rate_limited_body_uses_machine_code_in_error_field() {
        let response = HttpAppError(AppError::RateLimited {
            retry_after_seconds: 7,
        })
        .into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"], "rate_limited");
        assert_eq!(body["retryAfter"], 7);
        assert_eq!(body["code"], "rate_limited");
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let response = HttpAppError(AppError::NotFound("upload abc".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("Retry-After").is_none());
    }
}
