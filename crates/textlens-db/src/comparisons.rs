//! Comparison repository.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use textlens_core::models::{Comparison, ComparisonData};

const COMPARISON_COLUMNS: &str =
    "id, owner_id, name, description, analysis_ids, data, created_at";

#[derive(Clone)]
pub struct ComparisonRepository {
    pool: PgPool,
}

impl ComparisonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: &str,
        name: &str,
        description: Option<&str>,
        analysis_ids: &[Uuid],
        data: &ComparisonData,
    ) -> Result<Comparison> {
        let data_json = serde_json::to_value(data).context("Failed to serialize comparison data")?;
        let comparison = sqlx::query_as::<Postgres, Comparison>(&format!(
            r#"
            INSERT INTO comparisons (owner_id, name, description, analysis_ids, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COMPARISON_COLUMNS}
            "#,
        ))
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .bind(analysis_ids)
        .bind(data_json)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create comparison")?;
        Ok(comparison)
    }

    pub async fn get(&self, comparison_id: Uuid) -> Result<Option<Comparison>> {
        let comparison = sqlx::query_as::<Postgres, Comparison>(&format!(
            "SELECT {COMPARISON_COLUMNS} FROM comparisons WHERE id = $1",
        ))
        .bind(comparison_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get comparison")?;
        Ok(comparison)
    }

    pub async fn list_by_owner(&self, owner_id: &str, limit: i64) -> Result<Vec<Comparison>> {
        let rows = sqlx::query_as::<Postgres, Comparison>(&format!(
            r#"
            SELECT {COMPARISON_COLUMNS} FROM comparisons
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comparisons")?;
        Ok(rows)
    }

    /// Delete an owner's comparison. Returns whether a row was removed.
    pub async fn delete(&self, owner_id: &str, comparison_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comparisons WHERE id = $1 AND owner_id = $2")
            .bind(comparison_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comparison")?;
        Ok(result.rows_affected() > 0)
    }
}
