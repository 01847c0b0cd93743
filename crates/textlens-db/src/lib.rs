//! Database repositories for the processing pipeline.
//!
//! One repository per domain entity; all queries go through sqlx against
//! Postgres. Pipeline status transitions are written with compare-and-swap
//! updates so concurrent stage requests cannot double-run.

pub mod analyses;
pub mod comparisons;
pub mod extractions;
pub mod pool;
pub mod uploads;

pub use analyses::AnalysisRepository;
pub use comparisons::ComparisonRepository;
pub use extractions::ExtractionRepository;
pub use pool::create_pool;
pub use uploads::UploadRepository;
