//! Extraction stage endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use textlens_core::models::{Extraction, ExtractionMethod, UploadKind};
use textlens_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::identity::{extract_client_ip, SubjectId};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub upload_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub extraction_id: Uuid,
    pub method: ExtractionMethod,
}

#[utoipa::path(
    post,
    path = "/api/v0/extract",
    tag = "pipeline",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "Extraction completed", body = ExtractResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 409, description = "Stage already in flight", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
        (status = 500, description = "Extraction failed", body = ErrorResponse)
    )
)]
pub async fn extract(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, HttpAppError> {
    let upload = state.pipeline.owned_upload(&owner_id, body.upload_id).await?;

    // Separate budgets for the cheap parse path and the expensive OCR path.
    let ip = extract_client_ip(&headers, Some(&addr));
    let key = match upload.kind() {
        Some(UploadKind::Image) => format!("ocr:{ip}"),
        _ => format!("parse:{ip}"),
    };
    let decision = state
        .rate_limiter
        .check(
            &key,
            state.config.extract_rate_limit,
            Duration::from_secs(state.config.extract_rate_window_seconds),
        )
        .await;
    if !decision.allowed {
        return Err(AppError::RateLimited {
            retry_after_seconds: decision.retry_after_seconds,
        }
        .into());
    }

    let extraction = state
        .pipeline
        .run_extraction(&owner_id, body.upload_id)
        .await?;
    Ok(Json(ExtractResponse {
        extraction_id: extraction.id,
        method: extraction.method,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/extractions/{id}",
    tag = "pipeline",
    params(("id" = Uuid, Path, description = "Extraction id")),
    responses(
        (status = 200, description = "Extraction", body = Extraction),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_extraction(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    Path(id): Path<Uuid>,
) -> Result<Json<Extraction>, HttpAppError> {
    let extraction = state
        .extractions
        .get(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Extraction {id} not found")))?;

    // Ownership flows through the parent upload.
    state
        .pipeline
        .owned_upload(&owner_id, extraction.upload_id)
        .await?;

    Ok(Json(extraction))
}
