//! Route configuration and setup

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use textlens_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

/// Multipart framing overhead allowance on top of the raw file cap.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let api = Router::new()
        .route("/uploads", post(handlers::uploads::create_upload))
        .route("/uploads/{id}", get(handlers::uploads::get_upload))
        .route("/extract", post(handlers::extractions::extract))
        .route(
            "/extractions/{id}",
            get(handlers::extractions::get_extraction),
        )
        .route("/analyze", post(handlers::analyses::analyze))
        .route("/analyses/{id}", get(handlers::analyses::get_analysis))
        .route(
            "/comparisons",
            post(handlers::comparisons::create_comparison)
                .get(handlers::comparisons::list_comparisons),
        )
        .route(
            "/comparisons/{id}",
            get(handlers::comparisons::get_comparison)
                .delete(handlers::comparisons::delete_comparison),
        );

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api/v0", api)
        .layer(RequestBodyLimitLayer::new(
            config.max_upload_size_bytes + BODY_LIMIT_SLACK,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers(Any)
    };
    Ok(cors)
}
