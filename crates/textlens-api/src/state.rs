//! Application state shared by all handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use textlens_analysis::Augmenter;
use textlens_core::Config;
use textlens_db::{
    AnalysisRepository, ComparisonRepository, ExtractionRepository, UploadRepository,
};
use textlens_extract::TextExtractor;
use textlens_infra::RateLimiter;
use textlens_storage::Storage;

use crate::services::pipeline::PipelineService;

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub uploads: UploadRepository,
    pub extractions: ExtractionRepository,
    pub analyses: AnalysisRepository,
    pub comparisons: ComparisonRepository,
    pub rate_limiter: RateLimiter,
    pub pipeline: PipelineService,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: PgPool,
        storage: Arc<dyn Storage>,
        extractor: Arc<TextExtractor>,
        augmenter: Arc<Augmenter>,
    ) -> Self {
        let uploads = UploadRepository::new(pool.clone());
        let extractions = ExtractionRepository::new(pool.clone());
        let analyses = AnalysisRepository::new(pool.clone());
        let comparisons = ComparisonRepository::new(pool.clone());

        let pipeline = PipelineService::new(
            storage.clone(),
            extractor,
            augmenter,
            uploads.clone(),
            extractions.clone(),
            analyses.clone(),
            Duration::from_secs(config.download_timeout_seconds),
        );

        Self {
            config,
            storage,
            uploads,
            extractions,
            analyses,
            comparisons,
            rate_limiter: RateLimiter::new(),
            pipeline,
        }
    }
}
