//! Analysis stage endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use textlens_core::models::Analysis;
use textlens_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::identity::SubjectId;
use crate::state::AppState;

fn default_use_ai() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub extraction_id: Uuid,
    /// Opt out of AI augmentation; local metrics are always computed.
    #[serde(default = "default_use_ai")]
    pub use_ai: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analysis_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v0/analyze",
    tag = "pipeline",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis completed", body = AnalyzeResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 404, description = "Extraction not found", body = ErrorResponse),
        (status = 409, description = "Stage already in flight", body = ErrorResponse),
        (status = 500, description = "Analysis failed", body = ErrorResponse)
    )
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, HttpAppError> {
    let analysis = state
        .pipeline
        .run_analysis(&owner_id, body.extraction_id, body.use_ai)
        .await?;
    Ok(Json(AnalyzeResponse {
        analysis_id: analysis.id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/analyses/{id}",
    tag = "pipeline",
    params(("id" = Uuid, Path, description = "Analysis id")),
    responses(
        (status = 200, description = "Analysis", body = Analysis),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    Path(id): Path<Uuid>,
) -> Result<Json<Analysis>, HttpAppError> {
    let analysis = state
        .analyses
        .get(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;

    let extraction = state
        .extractions
        .get(analysis.extraction_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;

    state
        .pipeline
        .owned_upload(&owner_id, extraction.upload_id)
        .await?;

    Ok(Json(analysis))
}
