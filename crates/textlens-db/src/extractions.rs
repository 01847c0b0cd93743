//! Extraction repository.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use textlens_core::models::{Extraction, ExtractionMethod};

const EXTRACTION_COLUMNS: &str = "id, upload_id, raw_text, method, status, created_at";

#[derive(Clone)]
pub struct ExtractionRepository {
    pool: PgPool,
}

impl ExtractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a finished extraction and move its upload to `extracted` in
    /// one transaction. Fails without writing anything when the upload is
    /// not in `extracting` anymore.
    pub async fn create_done(
        &self,
        upload_id: Uuid,
        raw_text: &str,
        method: ExtractionMethod,
    ) -> Result<Extraction> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let extraction = sqlx::query_as::<Postgres, Extraction>(&format!(
            r#"
            INSERT INTO extractions (upload_id, raw_text, method, status)
            VALUES ($1, $2, $3, 'done')
            RETURNING {EXTRACTION_COLUMNS}
            "#,
        ))
        .bind(upload_id)
        .bind(raw_text)
        .bind(method)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create extraction")?;

        let updated = sqlx::query(
            "UPDATE uploads SET status = 'extracted' WHERE id = $1 AND status = 'extracting'",
        )
        .bind(upload_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update upload status")?;

        if updated.rows_affected() == 0 {
            anyhow::bail!("Upload {upload_id} left the extracting state mid-stage");
        }

        tx.commit().await.context("Failed to commit extraction")?;
        Ok(extraction)
    }

    /// Record a failed extraction attempt with no text.
    pub async fn create_error(&self, upload_id: Uuid) -> Result<Extraction> {
        let extraction = sqlx::query_as::<Postgres, Extraction>(&format!(
            r#"
            INSERT INTO extractions (upload_id, raw_text, method, status)
            VALUES ($1, '', 'quick', 'error')
            RETURNING {EXTRACTION_COLUMNS}
            "#,
        ))
        .bind(upload_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to record errored extraction")?;
        Ok(extraction)
    }

    pub async fn get(&self, extraction_id: Uuid) -> Result<Option<Extraction>> {
        let extraction = sqlx::query_as::<Postgres, Extraction>(&format!(
            "SELECT {EXTRACTION_COLUMNS} FROM extractions WHERE id = $1",
        ))
        .bind(extraction_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get extraction")?;
        Ok(extraction)
    }

    /// Newest extraction for an upload, if any.
    pub async fn latest_for_upload(&self, upload_id: Uuid) -> Result<Option<Extraction>> {
        let extraction = sqlx::query_as::<Postgres, Extraction>(&format!(
            r#"
            SELECT {EXTRACTION_COLUMNS} FROM extractions
            WHERE upload_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        ))
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get latest extraction")?;
        Ok(extraction)
    }
}
