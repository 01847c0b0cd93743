mod api_doc;
mod error;
mod handlers;
mod identity;
mod services;
mod setup;
mod state;

use std::sync::Arc;
use std::time::Duration;

use textlens_analysis::Augmenter;
use textlens_core::Config;
use textlens_extract::TextExtractor;
use textlens_storage::LocalStorage;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    textlens_infra::telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let pool = textlens_db::create_pool(
        &config.database_url,
        config.db_max_connections,
        config.db_timeout_seconds,
    )
    .await?;

    let storage = LocalStorage::new(
        config.local_storage_path.clone(),
        config.local_storage_base_url.clone(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?;

    let extractor = TextExtractor::new(
        config.tesseract_path.clone(),
        Duration::from_secs(config.ocr_timeout_seconds),
    );
    let augmenter = Augmenter::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.ai_timeout_seconds),
    )?;

    let state = Arc::new(AppState::new(
        config.clone(),
        pool,
        Arc::new(storage),
        Arc::new(extractor),
        Arc::new(augmenter),
    ));

    let router = setup::routes::setup_routes(&config, state)?;
    setup::server::start_server(&config, router).await?;

    Ok(())
}
