use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Pipeline status of an uploaded file.
///
/// Transitions are monotonic along
/// `uploaded -> extracting -> extracted -> analyzing -> done`; `error` is
/// reachable from any non-terminal state and is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploaded,
    Extracting,
    Extracted,
    Analyzing,
    Done,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Done | UploadStatus::Error)
    }

    /// A stage is currently running for this upload. A second request
    /// against an active upload must be rejected, never double-run.
    pub fn is_active(&self) -> bool {
        matches!(self, UploadStatus::Extracting | UploadStatus::Analyzing)
    }

    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        if next == UploadStatus::Error {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (UploadStatus::Uploaded, UploadStatus::Extracting)
                | (UploadStatus::Extracting, UploadStatus::Extracted)
                | (UploadStatus::Extracted, UploadStatus::Analyzing)
                | (UploadStatus::Analyzing, UploadStatus::Done)
        )
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Uploaded => write!(f, "uploaded"),
            UploadStatus::Extracting => write!(f, "extracting"),
            UploadStatus::Extracted => write!(f, "extracted"),
            UploadStatus::Analyzing => write!(f, "analyzing"),
            UploadStatus::Done => write!(f, "done"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for UploadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(UploadStatus::Uploaded),
            "extracting" => Ok(UploadStatus::Extracting),
            "extracted" => Ok(UploadStatus::Extracted),
            "analyzing" => Ok(UploadStatus::Analyzing),
            "done" => Ok(UploadStatus::Done),
            "error" => Ok(UploadStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid upload status: {}", s)),
        }
    }
}

/// Extraction dispatch target, derived from the declared content type with
/// the file extension as a tiebreaker. Anything else is rejected at the
/// upload boundary before it reaches the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Image,
}

impl UploadKind {
    pub fn from_content_type(content_type: &str, file_name: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct == "application/pdf" {
            return Some(UploadKind::Pdf);
        }
        if ct.starts_with("image/") {
            return Some(UploadKind::Image);
        }
        let ext = file_name.rsplit('.').next().map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => Some(UploadKind::Pdf),
            Some("png" | "jpg" | "jpeg" | "webp" | "tif" | "tiff" | "bmp") => {
                Some(UploadKind::Image)
            }
            _ => None,
        }
    }
}

/// A stored user-submitted file awaiting or undergoing processing.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Upload {
    pub id: Uuid,
    pub owner_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Opaque pointer into the blob store; never interpreted by the pipeline.
    pub storage_key: String,
    pub status: UploadStatus,
    pub created_at: DateTime<Utc>,
}

impl Upload {
    pub fn kind(&self) -> Option<UploadKind> {
        UploadKind::from_content_type(&self.content_type, &self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_progresses_one_step_at_a_time() {
        use UploadStatus::*;
        assert!(Uploaded.can_transition_to(Extracting));
        assert!(Extracting.can_transition_to(Extracted));
        assert!(Extracted.can_transition_to(Analyzing));
        assert!(Analyzing.can_transition_to(Done));

        assert!(!Uploaded.can_transition_to(Extracted));
        assert!(!Uploaded.can_transition_to(Done));
        assert!(!Extracted.can_transition_to(Done));
        assert!(!Done.can_transition_to(Extracting));
    }

    #[test]
    fn error_is_reachable_from_non_terminal_states_only() {
        use UploadStatus::*;
        for s in [Uploaded, Extracting, Extracted, Analyzing] {
            assert!(s.can_transition_to(Error), "{s} -> error should be legal");
        }
        assert!(!Done.can_transition_to(Error));
        assert!(!Error.can_transition_to(Error));
        assert!(Error.is_terminal());
    }

    #[test]
    fn kind_dispatch_prefers_content_type_then_extension() {
        assert_eq!(
            UploadKind::from_content_type("application/pdf", "report.bin"),
            Some(UploadKind::Pdf)
        );
        assert_eq!(
            UploadKind::from_content_type("image/png", "scan"),
            Some(UploadKind::Image)
        );
        assert_eq!(
            UploadKind::from_content_type("application/octet-stream", "scan.JPEG"),
            Some(UploadKind::Image)
        );
        assert_eq!(
            UploadKind::from_content_type("application/zip", "archive.zip"),
            None
        );
    }
}
