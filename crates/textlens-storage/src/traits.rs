//! Storage abstraction trait
//!
//! This module defines the Storage trait that blob backends must implement.

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// The pipeline orchestrator works against this trait so the blob backend
/// can be swapped without touching extraction or analysis code.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a file and return (storage_key, url).
    ///
    /// The storage_key is the opaque reference persisted on the Upload; the
    /// url is where a client could fetch the raw bytes.
    async fn put(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)>;

    /// Fetch the raw bytes for a storage key.
    async fn get(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Public URL for a stored file.
    fn url_for(&self, storage_key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;
}
