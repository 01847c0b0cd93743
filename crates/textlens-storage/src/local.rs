use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/textlens/uploads")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys with path traversal sequences that could escape the
    /// base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(storage_key))
    }

    /// Generate an owner-scoped storage key. The uuid prefix keeps repeated
    /// uploads of the same filename from colliding.
    fn generate_key(owner_id: &str, filename: &str) -> String {
        let safe_owner: String = owner_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let safe_name: String = filename
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("uploads/{}/{}_{}", safe_owner, Uuid::new_v4(), safe_name)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        owner_id: &str,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = Self::generate_key(owner_id, filename);
        let path = self.key_to_path(&key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let url = self.url_for(&key);

        tracing::debug!(
            key = %key,
            size_bytes = size,
            "Local storage upload successful"
        );

        Ok((key, url))
    }

    async fn get(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn url_for(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/files".to_string())
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn put_then_get_round_trips_bytes() {
        let (_dir, storage) = storage().await;
        let (key, url) = storage
            .put("user-1", "report.pdf", "application/pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();
        assert!(key.starts_with("uploads/user-1/"));
        assert!(url.contains(&key));
        assert_eq!(storage.get(&key).await.unwrap(), b"%PDF-1.4");
        assert!(storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.get("../etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.get("/etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn unsafe_filename_characters_are_sanitized() {
        let (_dir, storage) = storage().await;
        let (key, _) = storage
            .put("user/1", "my report (v2).pdf", "application/pdf", vec![1])
            .await
            .unwrap();
        assert!(!key.contains('('));
        assert!(key.starts_with("uploads/user_1/"));
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.get("uploads/u/missing.pdf").await,
            Err(StorageError::NotFound(_))
        ));
        // delete is idempotent
        storage.delete("uploads/u/missing.pdf").await.unwrap();
    }
}
