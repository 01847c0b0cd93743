//! Error types module
//!
//! This module provides the core error types used throughout the textlens
//! application. All errors are unified under the `AppError` enum which can
//! represent database, storage, validation, rate limiting, and pipeline
//! errors.
//!
//! Extraction failures carry which stage of the fallback chain gave up so
//! callers can retry meaningfully; augmentation failures are deliberately
//! absent here because the augmentation adapter absorbs them (see
//! textlens-analysis).

use std::io;

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like rate limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "rate_limited")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("No recognizable text found in document")]
    NoTextFound,

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

// Error conversion implementations following Rust best practices
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// Reduces duplication in ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "database_error",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "storage_error",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "invalid_input",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "not_found",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "unauthorized",
            false,
            Some("Supply a valid subject identity"),
            false,
            LogLevel::Debug,
        ),
        AppError::Conflict(_) => (
            409,
            "conflict",
            true,
            Some("The pipeline stage is already in flight; poll the upload status"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "payload_too_large",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::RateLimited { .. } => (
            429,
            "rate_limited",
            true,
            Some("Wait for the indicated interval and retry"),
            false,
            LogLevel::Warn,
        ),
        AppError::NoTextFound => (
            500,
            "no_text_found",
            false,
            Some("Upload a text-based document"),
            false,
            LogLevel::Warn,
        ),
        AppError::OcrFailed(_) => (
            500,
            "ocr_failed",
            true,
            Some("Retry, or upload a clearer image"),
            true,
            LogLevel::Error,
        ),
        AppError::DownloadFailed(_) => (
            500,
            "download_failed",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            500,
            "internal_error",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "internal_error",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        // Sensitive variants never leak provider/internal detail to clients;
        // they still say which pipeline stage failed.
        match self {
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Storage(_) => "A storage error occurred".to_string(),
            AppError::OcrFailed(_) => "Text recognition failed for this image".to_string(),
            AppError::DownloadFailed(_) => "Fetching the uploaded file failed".to_string(),
            AppError::NoTextFound => {
                "No recognizable text could be extracted from this document".to_string()
            }
            // Clients match on this literal; the human-readable text travels
            // in `details` and `suggested_action` instead.
            AppError::RateLimited { .. } => "rate_limited".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429_with_code() {
        let err = AppError::RateLimited {
            retry_after_seconds: 12,
        };
        assert_eq!(err.http_status_code(), 429);
        assert_eq!(err.error_code(), "rate_limited");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "rate_limited");
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn sensitive_errors_hide_internal_detail() {
        let err = AppError::Storage("disk exploded at /var/lib".to_string());
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("/var/lib"));
    }

    #[test]
    fn extraction_errors_name_the_stage() {
        assert_eq!(AppError::NoTextFound.error_code(), "no_text_found");
        assert_eq!(
            AppError::OcrFailed("tesseract exited 1".into()).error_code(),
            "ocr_failed"
        );
        assert_eq!(
            AppError::DownloadFailed("timeout".into()).error_code(),
            "download_failed"
        );
    }
}
