use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use textlens_core::models::{ExtractionMethod, UploadKind};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::ocr::OcrEngine;
use crate::strategy::{PdfTextStrategy, PrintableRunsStrategy, TextLayerStrategy};

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("static regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("static regex"));

/// Result of extracting text from one upload.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
    /// One entry per fallback-chain strategy that was tried and gave up
    /// before the winning one.
    pub warnings: Vec<String>,
}

/// Format-dispatched text extractor.
///
/// PDFs walk the fallback chain in order, first non-empty success wins;
/// images get exactly one OCR attempt.
pub struct TextExtractor {
    ocr: OcrEngine,
    pdf_chain: Vec<Box<dyn PdfTextStrategy>>,
}

impl TextExtractor {
    pub fn new(tesseract_path: impl Into<String>, ocr_timeout: Duration) -> Self {
        Self {
            ocr: OcrEngine::new(tesseract_path, ocr_timeout),
            // Strictly ordered: accurate text-layer parse first, permissive
            // printable-byte heuristic last. A staged-file parser slot sits
            // between them if one is ever added.
            pdf_chain: vec![
                Box::new(TextLayerStrategy),
                Box::new(PrintableRunsStrategy),
            ],
        }
    }

    #[cfg(test)]
    fn with_chain(chain: Vec<Box<dyn PdfTextStrategy>>) -> Self {
        Self {
            ocr: OcrEngine::new("tesseract", Duration::from_secs(5)),
            pdf_chain: chain,
        }
    }

    pub async fn extract(
        &self,
        data: &[u8],
        kind: UploadKind,
    ) -> Result<ExtractedText, ExtractError> {
        match kind {
            UploadKind::Pdf => self.extract_pdf(data),
            UploadKind::Image => self.extract_image(data).await,
        }
    }

    fn extract_pdf(&self, data: &[u8]) -> Result<ExtractedText, ExtractError> {
        let mut warnings = Vec::new();

        for strategy in &self.pdf_chain {
            match strategy.try_extract(data) {
                Ok(raw) => {
                    let text = normalize_whitespace(&raw);
                    if text.is_empty() {
                        debug!(strategy = strategy.name(), "Strategy produced no text");
                        warnings.push(format!("{}: produced no text", strategy.name()));
                        continue;
                    }
                    debug!(
                        strategy = strategy.name(),
                        text_len = text.len(),
                        "PDF text extracted"
                    );
                    return Ok(ExtractedText {
                        text,
                        method: strategy.method(),
                        warnings,
                    });
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Strategy failed, trying next");
                    warnings.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        Err(ExtractError::NoTextFound)
    }

    async fn extract_image(&self, data: &[u8]) -> Result<ExtractedText, ExtractError> {
        let text = self.ocr.recognize(data).await?;
        Ok(ExtractedText {
            text,
            method: ExtractionMethod::Ocr,
            warnings: Vec::new(),
        })
    }
}

/// Collapse runs of horizontal whitespace to a single space and multiple
/// blank lines to one, then trim.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = HORIZONTAL_WS.replace_all(text, " ");
    let collapsed = BLANK_LINES.replace_all(&collapsed, "\n");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStrategy;

    impl PdfTextStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn method(&self) -> ExtractionMethod {
            ExtractionMethod::Pdf
        }
        fn try_extract(&self, _data: &[u8]) -> Result<String, ExtractError> {
            Err(ExtractError::StrategyFailed("boom".to_string()))
        }
    }

    struct FixedStrategy(&'static str);

    impl PdfTextStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn method(&self) -> ExtractionMethod {
            ExtractionMethod::Quick
        }
        fn try_extract(&self, _data: &[u8]) -> Result<String, ExtractError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn chain_falls_through_to_next_strategy() {
        let extractor = TextExtractor::with_chain(vec![
            Box::new(FailingStrategy),
            Box::new(FixedStrategy("recovered text from fallback")),
        ]);
        let result = extractor.extract(b"whatever", UploadKind::Pdf).await.unwrap();
        assert_eq!(result.text, "recovered text from fallback");
        assert_eq!(result.method, ExtractionMethod::Quick);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("failing"));
    }

    #[tokio::test]
    async fn whitespace_only_success_is_not_a_success() {
        let extractor = TextExtractor::with_chain(vec![
            Box::new(FixedStrategy("   \n\t  \n ")),
            Box::new(FailingStrategy),
        ]);
        let err = extractor.extract(b"x", UploadKind::Pdf).await.unwrap_err();
        assert!(matches!(err, ExtractError::NoTextFound));
    }

    #[tokio::test]
    async fn exhausted_chain_is_no_text_found() {
        let extractor = TextExtractor::with_chain(vec![Box::new(FailingStrategy)]);
        let err = extractor.extract(b"x", UploadKind::Pdf).await.unwrap_err();
        assert!(matches!(err, ExtractError::NoTextFound));
    }

    #[tokio::test]
    async fn corrupted_pdf_with_tiny_fallback_yield_fails() {
        // Real chain: text layer fails on garbage, printable runs finds
        // almost nothing, normalization leaves nothing usable.
        let extractor = TextExtractor::new("tesseract", Duration::from_secs(5));
        let garbage: Vec<u8> = (0u8..16).cycle().take(512).collect();
        let err = extractor.extract(&garbage, UploadKind::Pdf).await.unwrap_err();
        assert!(matches!(err, ExtractError::NoTextFound));
    }

    #[test]
    fn normalize_collapses_spaces_and_blank_lines() {
        let input = "First   line\t with \t gaps\n\n\n  \nSecond line  ";
        assert_eq!(
            normalize_whitespace(input),
            "First line with gaps\nSecond line"
        );
    }

    #[test]
    fn normalize_of_empty_is_empty() {
        assert_eq!(normalize_whitespace("  \n \t "), "");
    }
}
