//! Textlens Extract Library
//!
//! Turns raw uploaded bytes into plain text. PDFs run through an ordered
//! fallback chain of strategies (text-layer parser first, printable-byte
//! heuristic last); images run through a single OCR pass backed by a scoped
//! `tesseract` subprocess.

mod error;
mod extractor;
mod ocr;
mod strategy;

pub use error::ExtractError;
pub use extractor::{ExtractedText, TextExtractor};
pub use ocr::OcrEngine;
pub use strategy::{PdfTextStrategy, PrintableRunsStrategy, TextLayerStrategy};
