//! Upload repository.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use textlens_core::models::{Upload, UploadStatus};

const UPLOAD_COLUMNS: &str =
    "id, owner_id, file_name, content_type, size_bytes, storage_key, status, created_at";

#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: &str,
        file_name: &str,
        content_type: &str,
        size_bytes: i64,
        storage_key: &str,
    ) -> Result<Upload> {
        let upload = sqlx::query_as::<Postgres, Upload>(&format!(
            r#"
            INSERT INTO uploads (owner_id, file_name, content_type, size_bytes, storage_key, status)
            VALUES ($1, $2, $3, $4, $5, 'uploaded')
            RETURNING {UPLOAD_COLUMNS}
            "#,
        ))
        .bind(owner_id)
        .bind(file_name)
        .bind(content_type)
        .bind(size_bytes)
        .bind(storage_key)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create upload")?;
        Ok(upload)
    }

    pub async fn get(&self, upload_id: Uuid) -> Result<Option<Upload>> {
        let upload = sqlx::query_as::<Postgres, Upload>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = $1",
        ))
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get upload")?;
        Ok(upload)
    }

    pub async fn list_by_owner(&self, owner_id: &str, limit: i64) -> Result<Vec<Upload>> {
        let uploads = sqlx::query_as::<Postgres, Upload>(&format!(
            r#"
            SELECT {UPLOAD_COLUMNS} FROM uploads
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list uploads")?;
        Ok(uploads)
    }

    /// Compare-and-swap status transition. Returns the updated row, or
    /// `None` when the upload was not in `from` (lost a race or an illegal
    /// jump).
    pub async fn transition_status(
        &self,
        upload_id: Uuid,
        from: UploadStatus,
        to: UploadStatus,
    ) -> Result<Option<Upload>> {
        if !from.can_transition_to(to) {
            anyhow::bail!("Illegal upload status transition: {from} -> {to}");
        }
        let upload = sqlx::query_as::<Postgres, Upload>(&format!(
            r#"
            UPDATE uploads SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING {UPLOAD_COLUMNS}
            "#,
        ))
        .bind(upload_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to transition upload status")?;
        Ok(upload)
    }

    /// Move a non-terminal upload to `error`. Terminal rows are left alone.
    pub async fn mark_error(&self, upload_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE uploads SET status = 'error'
            WHERE id = $1 AND status NOT IN ('done', 'error')
            "#,
        )
        .bind(upload_id)
        .execute(&self.pool)
        .await
        .context("Failed to mark upload as errored")?;
        Ok(())
    }
}
