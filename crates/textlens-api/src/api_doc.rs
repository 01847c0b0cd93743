//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use textlens_core::models::{
    Analysis, AnalysisMetadata, AnalysisStatus, Comparison, ComparisonData, Extraction,
    ExtractionMethod, ExtractionStatus, MetricRange, SuggestionFrequency, TextMetrics,
    ToneVariety, UploadStatus,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "textlens API",
        description = "Document upload, text extraction, and readability analysis pipeline"
    ),
    paths(
        handlers::health::health,
        handlers::uploads::create_upload,
        handlers::uploads::get_upload,
        handlers::extractions::extract,
        handlers::extractions::get_extraction,
        handlers::analyses::analyze,
        handlers::analyses::get_analysis,
        handlers::comparisons::create_comparison,
        handlers::comparisons::list_comparisons,
        handlers::comparisons::get_comparison,
        handlers::comparisons::delete_comparison,
    ),
    components(schemas(
        ErrorResponse,
        UploadStatus,
        Extraction,
        ExtractionMethod,
        ExtractionStatus,
        Analysis,
        AnalysisMetadata,
        AnalysisStatus,
        TextMetrics,
        Comparison,
        ComparisonData,
        MetricRange,
        SuggestionFrequency,
        ToneVariety,
        handlers::health::HealthResponse,
        handlers::uploads::UploadResponse,
        handlers::uploads::UploadStatusResponse,
        handlers::extractions::ExtractRequest,
        handlers::extractions::ExtractResponse,
        handlers::analyses::AnalyzeRequest,
        handlers::analyses::AnalyzeResponse,
        handlers::comparisons::CreateComparisonRequest,
    )),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "uploads", description = "File intake and status"),
        (name = "pipeline", description = "Extraction and analysis stages"),
        (name = "comparisons", description = "Cross-analysis aggregates")
    )
)]
pub struct ApiDoc;
