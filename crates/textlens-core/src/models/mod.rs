//! Domain models for the textlens pipeline.
//!
//! Upload owns its Extractions, Extraction owns its Analyses, and all three
//! are tagged with the opaque subject id supplied by the identity boundary.

mod analysis;
mod comparison;
mod extraction;
mod upload;

pub use analysis::{Analysis, AnalysisMetadata, AnalysisStatus, TextMetrics};
pub use comparison::{
    Comparison, ComparisonData, MetricRange, SuggestionFrequency, ToneVariety,
};
pub use extraction::{Extraction, ExtractionMethod, ExtractionStatus};
pub use upload::{Upload, UploadKind, UploadStatus};
