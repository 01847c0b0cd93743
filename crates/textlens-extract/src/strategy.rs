//! PDF extraction strategies.
//!
//! The fallback chain is an ordered list of strategies polymorphic over
//! `try_extract`; the chain loop in [`crate::TextExtractor`] iterates them
//! until the first non-empty success, replacing nested catch-and-retry
//! control flow with explicit result chaining.

use std::sync::LazyLock;

use regex::Regex;
use textlens_core::models::ExtractionMethod;

use crate::error::ExtractError;

/// Printable-byte fallback output cap, in characters.
const PRINTABLE_RUN_CAP: usize = 200_000;

/// Runs of 4+ printable ASCII or Latin-extended characters. Applied to a
/// lossy UTF-8 decode of the raw bytes, so malformed and scanned PDFs still
/// yield whatever readable fragments they contain.
static PRINTABLE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x20-\x7E\x{00A0}-\x{024F}]{4,}").expect("static regex"));

/// One step of the PDF fallback chain.
pub trait PdfTextStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Which extraction method a success through this strategy counts as.
    fn method(&self) -> ExtractionMethod;

    fn try_extract(&self, data: &[u8]) -> Result<String, ExtractError>;
}

/// Primary strategy: the PDF text layer, fast and accurate for text-based
/// PDFs. Internal parser errors (for example a dangling embedded-resource
/// reference) are non-fatal; the chain moves on.
pub struct TextLayerStrategy;

impl PdfTextStrategy for TextLayerStrategy {
    fn name(&self) -> &'static str {
        "pdf_text_layer"
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Pdf
    }

    fn try_extract(&self, data: &[u8]) -> Result<String, ExtractError> {
        // pdf-extract is known to panic on some malformed documents; a
        // panic here must count as a strategy failure, not kill the request.
        let parsed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(data)
        }))
        .map_err(|_| ExtractError::StrategyFailed("pdf text layer: parser panicked".to_string()))?;

        parsed.map_err(|e| ExtractError::StrategyFailed(format!("pdf text layer: {}", e)))
    }
}

/// Last-resort strategy: decode bytes permissively and keep runs of
/// printable characters. Guarantees *some* output for malformed PDFs; the
/// metrics engine's degenerate-input guard catches the garbage cases.
pub struct PrintableRunsStrategy;

impl PdfTextStrategy for PrintableRunsStrategy {
    fn name(&self) -> &'static str {
        "printable_runs"
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Quick
    }

    fn try_extract(&self, data: &[u8]) -> Result<String, ExtractError> {
        let decoded = String::from_utf8_lossy(data);
        let joined = PRINTABLE_RUN
            .find_iter(&decoded)
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(truncate_chars(&joined, PRINTABLE_RUN_CAP))
    }
}

fn truncate_chars(s: &str, cap: usize) -> String {
    if s.chars().count() <= cap {
        s.to_string()
    } else {
        s.chars().take(cap).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_runs_keeps_readable_fragments() {
        let mut data = vec![0u8, 1, 2, 3];
        data.extend_from_slice(b"Hello world from a broken PDF");
        data.extend_from_slice(&[0xFF, 0xFE, 0x00]);
        data.extend_from_slice(b"second fragment");
        data.extend_from_slice(&[0x07]);
        // runs shorter than 4 chars are dropped
        data.extend_from_slice(b"ab");

        let text = PrintableRunsStrategy.try_extract(&data).unwrap();
        assert!(text.contains("Hello world from a broken PDF"));
        assert!(text.contains("second fragment"));
        assert!(!text.contains("\nab"));
    }

    #[test]
    fn printable_runs_yields_empty_for_pure_binary() {
        let data: Vec<u8> = (0u8..8).cycle().take(256).collect();
        let text = PrintableRunsStrategy.try_extract(&data).unwrap();
        assert!(text.trim().is_empty());
    }

    #[test]
    fn text_layer_failure_is_soft() {
        let err = TextLayerStrategy.try_extract(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, ExtractError::StrategyFailed(_)));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "é".repeat(10);
        assert_eq!(truncate_chars(&s, 4).chars().count(), 4);
    }
}
