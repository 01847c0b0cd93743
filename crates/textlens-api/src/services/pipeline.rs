//! Pipeline orchestration.
//!
//! Drives an upload through its two processing stages. Each stage claims
//! the upload with a compare-and-swap status transition before doing any
//! work, so a concurrent second request gets a Conflict instead of a
//! double-run. Stage results are committed together with the forward
//! status transition in one transaction (see textlens-db); any failure
//! after the claim moves the upload to `error` before the error surfaces.

use std::sync::Arc;
use std::time::Duration;

use textlens_analysis::{summarize, AugmentedAnalysis, Augmenter};
use textlens_core::models::{Analysis, Extraction, ExtractionStatus, Upload, UploadStatus};
use textlens_core::AppError;
use textlens_db::{AnalysisRepository, ExtractionRepository, UploadRepository};
use textlens_extract::TextExtractor;
use textlens_infra::retry_with_backoff;
use textlens_storage::{Storage, StorageError};
use tracing::{info, warn};
use uuid::Uuid;

const DOWNLOAD_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct PipelineService {
    storage: Arc<dyn Storage>,
    extractor: Arc<TextExtractor>,
    augmenter: Arc<Augmenter>,
    uploads: UploadRepository,
    extractions: ExtractionRepository,
    analyses: AnalysisRepository,
    download_timeout: Duration,
}

impl PipelineService {
    pub fn new(
        storage: Arc<dyn Storage>,
        extractor: Arc<TextExtractor>,
        augmenter: Arc<Augmenter>,
        uploads: UploadRepository,
        extractions: ExtractionRepository,
        analyses: AnalysisRepository,
        download_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            extractor,
            augmenter,
            uploads,
            extractions,
            analyses,
            download_timeout,
        }
    }

    /// Fetch an upload owned by `owner_id`. Other owners' uploads read as
    /// absent rather than forbidden.
    pub async fn owned_upload(&self, owner_id: &str, upload_id: Uuid) -> Result<Upload, AppError> {
        let upload = self
            .uploads
            .get(upload_id)
            .await?
            .filter(|u| u.owner_id == owner_id)
            .ok_or_else(|| AppError::NotFound(format!("Upload {upload_id} not found")))?;
        Ok(upload)
    }

    /// Run the extraction stage for an upload in `uploaded` state.
    pub async fn run_extraction(
        &self,
        owner_id: &str,
        upload_id: Uuid,
    ) -> Result<Extraction, AppError> {
        let upload = self.owned_upload(owner_id, upload_id).await?;

        let kind = upload.kind().ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Unsupported content type: {}",
                upload.content_type
            ))
        })?;

        self.claim(&upload, UploadStatus::Uploaded, UploadStatus::Extracting)
            .await?;

        match self.extract_inner(&upload, kind).await {
            Ok(extraction) => {
                info!(
                    upload_id = %upload_id,
                    extraction_id = %extraction.id,
                    method = %extraction.method,
                    text_len = extraction.raw_text.len(),
                    "Extraction completed"
                );
                Ok(extraction)
            }
            Err(e) => {
                // Leave a failed-extraction record behind, then move the
                // upload to error. Both are best-effort; `e` still surfaces.
                if let Err(record_err) = self.extractions.create_error(upload_id).await {
                    warn!(upload_id = %upload_id, error = %record_err,
                        "Failed to record errored extraction");
                }
                self.record_failure(upload_id, "extraction").await;
                Err(e)
            }
        }
    }

    async fn extract_inner(
        &self,
        upload: &Upload,
        kind: textlens_core::models::UploadKind,
    ) -> Result<Extraction, AppError> {
        let data = self.download(&upload.storage_key).await?;

        let extracted = self
            .extractor
            .extract(&data, kind)
            .await
            .map_err(AppError::from)?;

        for warning in &extracted.warnings {
            warn!(upload_id = %upload.id, warning, "Extraction fallback was taken");
        }

        let extraction = self
            .extractions
            .create_done(upload.id, &extracted.text, extracted.method)
            .await?;
        Ok(extraction)
    }

    /// Run the analysis stage against a finished extraction. The owning
    /// upload must be in `extracted` state.
    pub async fn run_analysis(
        &self,
        owner_id: &str,
        extraction_id: Uuid,
        use_ai: bool,
    ) -> Result<Analysis, AppError> {
        let extraction = self
            .extractions
            .get(extraction_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Extraction {extraction_id} not found")))?;

        let upload = self.owned_upload(owner_id, extraction.upload_id).await?;

        ensure_extraction_done(&extraction)?;

        self.claim(&upload, UploadStatus::Extracted, UploadStatus::Analyzing)
            .await?;

        match self.analyze_inner(&upload, &extraction, use_ai).await {
            Ok(analysis) => {
                info!(
                    upload_id = %upload.id,
                    analysis_id = %analysis.id,
                    word_count = analysis.metrics.word_count,
                    "Analysis completed"
                );
                Ok(analysis)
            }
            Err(e) => {
                self.record_failure(upload.id, "analysis").await;
                Err(e)
            }
        }
    }

    async fn analyze_inner(
        &self,
        upload: &Upload,
        extraction: &Extraction,
        use_ai: bool,
    ) -> Result<Analysis, AppError> {
        // Augmentation never fails; at worst it returns the local metrics.
        let augmented = if use_ai && self.augmenter.is_configured() {
            self.augmenter.augment(&extraction.raw_text).await
        } else {
            let local = summarize(&extraction.raw_text);
            AugmentedAnalysis {
                metrics: local.metrics,
                suggestions: local.suggestions,
                metadata: None,
            }
        };

        let analysis = self
            .analyses
            .create_done(
                upload.id,
                extraction.id,
                &augmented.metrics,
                &augmented.suggestions,
                augmented.metadata.as_ref(),
            )
            .await?;
        Ok(analysis)
    }

    /// Claim a stage via compare-and-swap. An in-flight stage is a
    /// Conflict; any other wrong state is an invalid request.
    async fn claim(
        &self,
        upload: &Upload,
        from: UploadStatus,
        to: UploadStatus,
    ) -> Result<(), AppError> {
        if upload.status.is_active() {
            return Err(AppError::Conflict(format!(
                "Upload {} is already being processed (status: {})",
                upload.id, upload.status
            )));
        }
        if upload.status != from {
            return Err(AppError::InvalidInput(format!(
                "Upload {} is in state {}, expected {}",
                upload.id, upload.status, from
            )));
        }

        let claimed = self.uploads.transition_status(upload.id, from, to).await?;
        if claimed.is_none() {
            // Another request won the race between our read and the swap.
            return Err(AppError::Conflict(format!(
                "Upload {} was claimed by a concurrent request",
                upload.id
            )));
        }
        Ok(())
    }

    async fn download(&self, storage_key: &str) -> Result<Vec<u8>, AppError> {
        retry_with_backoff("storage_download", DOWNLOAD_ATTEMPTS, || {
            fetch_with_timeout(self.storage.as_ref(), storage_key, self.download_timeout)
        })
        .await
        .map_err(|e| match e {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::DownloadFailed(other.to_string()),
        })
    }

    /// Best-effort move to `error` after a failed stage. The original error
    /// still surfaces to the caller even if this write fails.
    async fn record_failure(&self, upload_id: Uuid, stage: &str) {
        if let Err(e) = self.uploads.mark_error(upload_id).await {
            warn!(upload_id = %upload_id, stage, error = %e, "Failed to record error status");
        }
    }
}

/// Only finished extractions carry text worth analyzing; errored or
/// still-processing rows are rejected regardless of the upload's status.
fn ensure_extraction_done(extraction: &Extraction) -> Result<(), AppError> {
    if extraction.status != ExtractionStatus::Done {
        return Err(AppError::InvalidInput(format!(
            "Extraction {} is in state {}, expected done",
            extraction.id, extraction.status
        )));
    }
    Ok(())
}

/// Bound a blob fetch so a hung backend cannot stall the stage; elapsing
/// counts as a failed attempt for the surrounding retry loop.
async fn fetch_with_timeout(
    storage: &dyn Storage,
    storage_key: &str,
    timeout: Duration,
) -> Result<Vec<u8>, StorageError> {
    match tokio::time::timeout(timeout, storage.get(storage_key)).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::DownloadFailed(format!(
            "fetching {} timed out after {}s",
            storage_key,
            timeout.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Utc;
    use textlens_core::models::ExtractionMethod;
    use textlens_storage::StorageResult;

    struct StalledStorage;

    #[async_trait]
    impl Storage for StalledStorage {
        async fn put(
            &self,
            _owner_id: &str,
            _filename: &str,
            _content_type: &str,
            _data: Vec<u8>,
        ) -> StorageResult<(String, String)> {
            unimplemented!()
        }

        async fn get(&self, _storage_key: &str) -> StorageResult<Vec<u8>> {
            std::future::pending().await
        }

        async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
            unimplemented!()
        }

        fn url_for(&self, _storage_key: &str) -> String {
            unimplemented!()
        }

        async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
            unimplemented!()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_blob_fetch_times_out() {
        let storage = StalledStorage;
        let err = fetch_with_timeout(&storage, "owner/doc.pdf", Duration::from_secs(30))
            .await
            .unwrap_err();

        match err {
            StorageError::DownloadFailed(msg) => assert!(msg.contains("timed out after 30s")),
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
    }

    fn extraction_with_status(status: ExtractionStatus) -> Extraction {
        Extraction {
            id: Uuid::new_v4(),
            upload_id: Uuid::new_v4(),
            raw_text: String::new(),
            method: ExtractionMethod::Quick,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn errored_extraction_is_rejected_for_analysis() {
        let err = ensure_extraction_done(&extraction_with_status(ExtractionStatus::Error))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = ensure_extraction_done(&extraction_with_status(ExtractionStatus::Processing))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        assert!(ensure_extraction_done(&extraction_with_status(ExtractionStatus::Done)).is_ok());
    }
}
