use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Which extraction path produced the text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// PDF text-layer parser or one of its fallbacks.
    Pdf,
    /// OCR over image bytes.
    Ocr,
    /// Printable-byte-run heuristic (last-resort PDF fallback).
    Quick,
}

impl Display for ExtractionMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExtractionMethod::Pdf => write!(f, "pdf"),
            ExtractionMethod::Ocr => write!(f, "ocr"),
            ExtractionMethod::Quick => write!(f, "quick"),
        }
    }
}

impl FromStr for ExtractionMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(ExtractionMethod::Pdf),
            "ocr" => Ok(ExtractionMethod::Ocr),
            "quick" => Ok(ExtractionMethod::Quick),
            _ => Err(anyhow::anyhow!("Invalid extraction method: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Processing,
    Done,
    Error,
}

impl Display for ExtractionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExtractionStatus::Processing => write!(f, "processing"),
            ExtractionStatus::Done => write!(f, "done"),
            ExtractionStatus::Error => write!(f, "error"),
        }
    }
}

/// The plain-text result of processing one Upload.
///
/// `raw_text` is an empty string (never NULL) when nothing recognizable was
/// found; immutable after creation except for `status`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Extraction {
    pub id: Uuid,
    pub upload_id: Uuid,
    pub raw_text: String,
    pub method: ExtractionMethod,
    pub status: ExtractionStatus,
    pub created_at: DateTime<Utc>,
}
