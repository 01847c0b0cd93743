//! Configuration module
//!
//! Environment-driven configuration for the API service and the pipeline's
//! external dependencies (blob storage, OCR engine, AI augmentation).

use std::env;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_OCR_TIMEOUT_SECS: u64 = 60;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_AI_TIMEOUT_SECS: u64 = 45;
const DEFAULT_EXTRACT_RATE_LIMIT: u32 = 10;
const DEFAULT_EXTRACT_RATE_WINDOW_SECS: u64 = 60;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Blob storage (local filesystem backend)
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub max_upload_size_bytes: usize,
    // OCR engine
    pub tesseract_path: String,
    pub ocr_timeout_seconds: u64,
    // Blob fetch
    pub download_timeout_seconds: u64,
    // AI augmentation (absent key disables augmentation; pipeline degrades
    // to local metrics)
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ai_timeout_seconds: u64,
    // Extraction/analysis entry-point throttle
    pub extract_rate_limit: u32,
    pub extract_rate_window_seconds: u64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let cors_origins = env_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Self {
            server_port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT),
            cors_origins,
            environment: env_or("ENVIRONMENT", "development"),
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS),
            local_storage_path: env_or("LOCAL_STORAGE_PATH", "./data/uploads"),
            local_storage_base_url: env_or(
                "LOCAL_STORAGE_BASE_URL",
                "http://localhost:3000/files",
            ),
            max_upload_size_bytes: env_parse(
                "MAX_UPLOAD_SIZE_BYTES",
                DEFAULT_MAX_UPLOAD_SIZE_BYTES,
            ),
            tesseract_path: env_or("TESSERACT_PATH", "tesseract"),
            ocr_timeout_seconds: env_parse("OCR_TIMEOUT_SECONDS", DEFAULT_OCR_TIMEOUT_SECS),
            download_timeout_seconds: env_parse(
                "DOWNLOAD_TIMEOUT_SECONDS",
                DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            ),
            gemini_api_key,
            gemini_model: env_or("GEMINI_MODEL", "gemini-1.5-flash"),
            ai_timeout_seconds: env_parse("AI_TIMEOUT_SECONDS", DEFAULT_AI_TIMEOUT_SECS),
            extract_rate_limit: env_parse("EXTRACT_RATE_LIMIT", DEFAULT_EXTRACT_RATE_LIMIT),
            extract_rate_window_seconds: env_parse(
                "EXTRACT_RATE_WINDOW_SECONDS",
                DEFAULT_EXTRACT_RATE_WINDOW_SECS,
            ),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }
}
