//! Upload intake and status probe.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use textlens_core::models::{Upload, UploadKind, UploadStatus};
use textlens_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::identity::SubjectId;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub status: UploadStatus,
}

impl From<Upload> for UploadResponse {
    fn from(u: Upload) -> Self {
        Self {
            upload_id: u.id,
            file_name: u.file_name,
            content_type: u.content_type,
            size_bytes: u.size_bytes,
            status: u.status,
        }
    }
}

/// Upload plus pointers to its newest pipeline artifacts, for clients
/// re-checking state after a transport timeout.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatusResponse {
    #[serde(flatten)]
    pub upload: UploadResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_extraction_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_analysis_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_upload(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidInput("File field is missing a filename".into()))?;
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file field: {}", e)))?;
        file = Some((file_name, content_type, data.to_vec()));
        break;
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::InvalidInput("Missing 'file' field".to_string()))?;

    if data.is_empty() {
        return Err(AppError::InvalidInput("Uploaded file is empty".to_string()).into());
    }
    if data.len() > state.config.max_upload_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} byte limit",
            state.config.max_upload_size_bytes
        ))
        .into());
    }
    if UploadKind::from_content_type(&content_type, &file_name).is_none() {
        return Err(AppError::InvalidInput(format!(
            "Unsupported file type: {} ({})",
            content_type, file_name
        ))
        .into());
    }

    let size_bytes = data.len() as i64;
    let (storage_key, _url) = state
        .storage
        .put(&owner_id, &file_name, &content_type, data)
        .await?;

    let upload = match state
        .uploads
        .create(&owner_id, &file_name, &content_type, size_bytes, &storage_key)
        .await
    {
        Ok(upload) => upload,
        Err(e) => {
            // Don't leave an orphaned blob behind on a DB failure.
            let storage = state.storage.clone();
            let key = storage_key.clone();
            tokio::spawn(async move {
                if let Err(cleanup_err) = storage.delete(&key).await {
                    tracing::debug!(error = %cleanup_err, storage_key = %key,
                        "Failed to clean up blob after DB error");
                }
            });
            return Err(AppError::from(e).into());
        }
    };

    tracing::info!(
        upload_id = %upload.id,
        size_bytes,
        content_type = %upload.content_type,
        "Upload stored"
    );
    Ok(Json(upload.into()))
}

#[utoipa::path(
    get,
    path = "/api/v0/uploads/{id}",
    tag = "uploads",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 200, description = "Upload status", body = UploadStatusResponse),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadStatusResponse>, HttpAppError> {
    let upload = state.pipeline.owned_upload(&owner_id, id).await?;

    let latest_extraction = state
        .extractions
        .latest_for_upload(upload.id)
        .await
        .map_err(AppError::from)?;
    let latest_analysis_id = match &latest_extraction {
        Some(extraction) => state
            .analyses
            .list_for_extraction(extraction.id)
            .await
            .map_err(AppError::from)?
            .first()
            .map(|a| a.id),
        None => None,
    };

    Ok(Json(UploadStatusResponse {
        upload: upload.into(),
        latest_extraction_id: latest_extraction.map(|e| e.id),
        latest_analysis_id,
    }))
}
