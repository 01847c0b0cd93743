use textlens_core::AppError;
use thiserror::Error;

/// Extraction errors surfaced to the pipeline orchestrator.
///
/// `StrategyFailed` never escapes the PDF fallback chain; it only travels
/// between a strategy and the chain loop, which logs it and tries the next
/// strategy.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Every strategy in the chain produced empty or whitespace-only text.
    #[error("no recognizable text found")]
    NoTextFound,

    /// The OCR engine failed; images have no fallback, so this is fatal for
    /// the request.
    #[error("OCR failed: {0}")]
    OcrFailed(String),

    /// A single strategy in the fallback chain failed (non-fatal).
    #[error("extraction strategy failed: {0}")]
    StrategyFailed(String),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::NoTextFound => AppError::NoTextFound,
            ExtractError::OcrFailed(msg) => AppError::OcrFailed(msg),
            ExtractError::StrategyFailed(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(ExtractError::NoTextFound),
            AppError::NoTextFound
        ));
        assert!(matches!(
            AppError::from(ExtractError::OcrFailed("exit 1".into())),
            AppError::OcrFailed(_)
        ));
        assert!(matches!(
            AppError::from(ExtractError::StrategyFailed("bad xref".into())),
            AppError::Internal(_)
        ));
    }
}
