use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Deterministic content metrics computed from extracted text.
///
/// `readability` is a 0-100 proxy derived from average sentence length, not
/// a standard formula such as Flesch-Kincaid. The original product shipped
/// this simplification deliberately and clients calibrate against it, so it
/// is preserved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextMetrics {
    pub word_count: i64,
    pub char_count: i64,
    pub readability: f64,
}

impl TextMetrics {
    pub fn zero() -> Self {
        Self {
            word_count: 0,
            char_count: 0,
            readability: 0.0,
        }
    }
}

/// Optional enrichment produced by the AI augmentation adapter.
///
/// Modeled as an explicitly-typed struct with all fields optional rather
/// than an open JSON map, so the Analysis entity's shape stays checkable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_topics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_reading_time_minutes: Option<f64>,
}

impl AnalysisMetadata {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.tone.is_none()
            && self.key_topics.is_none()
            && self.estimated_reading_time_minutes.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Processing,
    Done,
}

impl Display for AnalysisStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AnalysisStatus::Processing => write!(f, "processing"),
            AnalysisStatus::Done => write!(f, "done"),
        }
    }
}

/// Computed metrics and suggestions derived from one Extraction.
///
/// Immutable once written; the store permits many per extraction and the
/// newest one is the "current" result shown to users.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Analysis {
    pub id: Uuid,
    pub extraction_id: Uuid,
    pub metrics: TextMetrics,
    /// Ordered, deduplicated, capped improvement suggestions.
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Analysis {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let metadata: Option<serde_json::Value> = row.try_get("metadata")?;
        let metadata = metadata
            .map(|v| serde_json::from_value(v).map_err(|e| sqlx::Error::ColumnDecode {
                index: "metadata".into(),
                source: Box::new(e),
            }))
            .transpose()?;
        Ok(Analysis {
            id: row.try_get("id")?,
            extraction_id: row.try_get("extraction_id")?,
            metrics: TextMetrics {
                word_count: row.try_get("word_count")?,
                char_count: row.try_get("char_count")?,
                readability: row.try_get("readability")?,
            },
            suggestions: row.try_get("suggestions")?,
            metadata,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
