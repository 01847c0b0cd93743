//! Owner-scoped comparison CRUD over finished analyses.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use textlens_core::models::{Comparison, ComparisonData};
use textlens_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::identity::SubjectId;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateComparisonRequest {
    pub name: String,
    pub description: Option<String>,
    pub analysis_ids: Vec<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/v0/comparisons",
    tag = "comparisons",
    request_body = CreateComparisonRequest,
    responses(
        (status = 200, description = "Comparison created", body = Comparison),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 404, description = "An analysis was not found", body = ErrorResponse)
    )
)]
pub async fn create_comparison(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    Json(body): Json<CreateComparisonRequest>,
) -> Result<Json<Comparison>, HttpAppError> {
    let name = body.name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(
            AppError::InvalidInput(format!("Name must be 1-{MAX_NAME_LEN} characters")).into(),
        );
    }
    if body.analysis_ids.len() < 2 {
        return Err(
            AppError::InvalidInput("A comparison needs at least two analyses".to_string()).into(),
        );
    }

    let analyses = state
        .analyses
        .get_many(&body.analysis_ids)
        .await
        .map_err(AppError::from)?;
    if analyses.len() != body.analysis_ids.len() {
        return Err(AppError::NotFound("One or more analyses were not found".to_string()).into());
    }

    // Every referenced analysis must belong to the caller.
    for analysis in &analyses {
        let extraction = state
            .extractions
            .get(analysis.extraction_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound("One or more analyses were not found".to_string())
            })?;
        state
            .pipeline
            .owned_upload(&owner_id, extraction.upload_id)
            .await
            .map_err(|_| AppError::NotFound("One or more analyses were not found".to_string()))?;
    }

    let data = ComparisonData::from_analyses(&analyses);
    let comparison = state
        .comparisons
        .create(
            &owner_id,
            name,
            body.description.as_deref(),
            &body.analysis_ids,
            &data,
        )
        .await
        .map_err(AppError::from)?;

    tracing::info!(
        comparison_id = %comparison.id,
        analyses = body.analysis_ids.len(),
        "Comparison created"
    );
    Ok(Json(comparison))
}

#[utoipa::path(
    get,
    path = "/api/v0/comparisons",
    tag = "comparisons",
    responses(
        (status = 200, description = "Comparisons, newest first", body = [Comparison]),
        (status = 401, description = "Missing subject identity", body = ErrorResponse)
    )
)]
pub async fn list_comparisons(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
) -> Result<Json<Vec<Comparison>>, HttpAppError> {
    let comparisons = state
        .comparisons
        .list_by_owner(&owner_id, DEFAULT_LIST_LIMIT)
        .await
        .map_err(AppError::from)?;
    Ok(Json(comparisons))
}

#[utoipa::path(
    get,
    path = "/api/v0/comparisons/{id}",
    tag = "comparisons",
    params(("id" = Uuid, Path, description = "Comparison id")),
    responses(
        (status = 200, description = "Comparison", body = Comparison),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_comparison(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    Path(id): Path<Uuid>,
) -> Result<Json<Comparison>, HttpAppError> {
    let comparison = state
        .comparisons
        .get(id)
        .await
        .map_err(AppError::from)?
        .filter(|c| c.owner_id == owner_id)
        .ok_or_else(|| AppError::NotFound(format!("Comparison {id} not found")))?;
    Ok(Json(comparison))
}

#[utoipa::path(
    delete,
    path = "/api/v0/comparisons/{id}",
    tag = "comparisons",
    params(("id" = Uuid, Path, description = "Comparison id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing subject identity", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_comparison(
    State(state): State<Arc<AppState>>,
    SubjectId(owner_id): SubjectId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let deleted = state
        .comparisons
        .delete(&owner_id, id)
        .await
        .map_err(AppError::from)?;
    if !deleted {
        return Err(AppError::NotFound(format!("Comparison {id} not found")).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
