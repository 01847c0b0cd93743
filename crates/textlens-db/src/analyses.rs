//! Analysis repository.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use textlens_core::models::{Analysis, AnalysisMetadata, TextMetrics};

const ANALYSIS_COLUMNS: &str = "id, extraction_id, word_count, char_count, readability, \
                                suggestions, metadata, status, created_at";

#[derive(Clone)]
pub struct AnalysisRepository {
    pool: PgPool,
}

impl AnalysisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a finished analysis and move its upload to `done` in one
    /// transaction. Fails without writing anything when the upload is not
    /// in `analyzing` anymore.
    pub async fn create_done(
        &self,
        upload_id: Uuid,
        extraction_id: Uuid,
        metrics: &TextMetrics,
        suggestions: &[String],
        metadata: Option<&AnalysisMetadata>,
    ) -> Result<Analysis> {
        let metadata_json = metadata
            .map(serde_json::to_value)
            .transpose()
            .context("Failed to serialize analysis metadata")?;

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let analysis = sqlx::query_as::<Postgres, Analysis>(&format!(
            r#"
            INSERT INTO analyses (extraction_id, word_count, char_count, readability,
                                  suggestions, metadata, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'done')
            RETURNING {ANALYSIS_COLUMNS}
            "#,
        ))
        .bind(extraction_id)
        .bind(metrics.word_count)
        .bind(metrics.char_count)
        .bind(metrics.readability)
        .bind(suggestions)
        .bind(metadata_json)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create analysis")?;

        let updated = sqlx::query(
            "UPDATE uploads SET status = 'done' WHERE id = $1 AND status = 'analyzing'",
        )
        .bind(upload_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update upload status")?;

        if updated.rows_affected() == 0 {
            anyhow::bail!("Upload {upload_id} left the analyzing state mid-stage");
        }

        tx.commit().await.context("Failed to commit analysis")?;
        Ok(analysis)
    }

    pub async fn get(&self, analysis_id: Uuid) -> Result<Option<Analysis>> {
        let analysis = sqlx::query_as::<Postgres, Analysis>(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM analyses WHERE id = $1",
        ))
        .bind(analysis_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get analysis")?;
        Ok(analysis)
    }

    /// All analyses for a set of ids, in the order given. Missing ids are
    /// simply absent from the result; callers compare lengths.
    pub async fn get_many(&self, analysis_ids: &[Uuid]) -> Result<Vec<Analysis>> {
        let rows = sqlx::query_as::<Postgres, Analysis>(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM analyses WHERE id = ANY($1)",
        ))
        .bind(analysis_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get analyses")?;

        // Restore request order; ANY() gives no ordering guarantee.
        let mut ordered = Vec::with_capacity(rows.len());
        for id in analysis_ids {
            if let Some(a) = rows.iter().find(|a| a.id == *id) {
                ordered.push(a.clone());
            }
        }
        Ok(ordered)
    }

    pub async fn list_for_extraction(&self, extraction_id: Uuid) -> Result<Vec<Analysis>> {
        let rows = sqlx::query_as::<Postgres, Analysis>(&format!(
            r#"
            SELECT {ANALYSIS_COLUMNS} FROM analyses
            WHERE extraction_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(extraction_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list analyses")?;
        Ok(rows)
    }
}
