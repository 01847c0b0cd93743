//! Deterministic text metrics.
//!
//! `summarize` is a pure function: no I/O, no clock, identical output for
//! identical input. The readability score is a deliberately simple proxy
//! over average sentence length, not a standard formula; see
//! [`textlens_core::models::TextMetrics`].

use std::sync::LazyLock;

use regex::Regex;
use textlens_core::models::TextMetrics;

pub const NON_TEXT_SUGGESTION: &str = "The uploaded file appears to be an image or contains non-text content. Please ensure you're uploading a text-based document.";
pub const SHORTEN_SENTENCES_SUGGESTION: &str = "Shorten long sentences for clarity.";
pub const SIMPLER_WORDS_SUGGESTION: &str =
    "Use simpler words and shorter sentences to improve readability.";
pub const ADD_CTA_SUGGESTION: &str = "Add a clear call-to-action.";

/// Inputs below these thresholds are treated as non-textual (OCR noise,
/// parser leftovers) and produce zero metrics instead of meaningless stats.
const MIN_TEXT_CHARS: usize = 50;
const MIN_TEXT_TOKENS: usize = 10;

const LONG_SENTENCE_AVG_WORDS: f64 = 20.0;
const LOW_READABILITY_THRESHOLD: f64 = 50.0;

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x{7F}-\x{9F}]").expect("static regex")
});
static PDF_STREAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)stream.*?endstream").expect("static regex"));
static BLOCK_COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("static regex"));
static SLASH_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[^/\n]*/").expect("static regex"));
static NON_PROSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\w\s.,!?;:()\[\]{}"'\-–—…]"#).expect("static regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static CTA_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(call to action|sign up|learn more|contact|buy now)\b")
        .expect("static regex")
});

/// Local metrics plus the suggestions they trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSummary {
    pub metrics: TextMetrics,
    pub suggestions: Vec<String>,
}

/// Strip control characters, binary/PDF-stream leftovers, and comment-like
/// slash runs, then collapse whitespace. Shared by the metrics engine and
/// the augmentation adapter's degenerate-input check.
pub fn clean_text(text: &str) -> String {
    let cleaned = CONTROL_CHARS.replace_all(text, "");
    let cleaned = PDF_STREAMS.replace_all(&cleaned, "");
    let cleaned = BLOCK_COMMENTS.replace_all(&cleaned, "");
    let cleaned = SLASH_RUNS.replace_all(&cleaned, "");
    let cleaned = NON_PROSE.replace_all(&cleaned, " ");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}

/// True when cleaned text is too short to produce meaningful statistics.
pub fn is_degenerate(clean: &str, min_chars: usize, min_tokens: usize) -> bool {
    clean.len() < min_chars || clean.split_whitespace().count() < min_tokens
}

/// Compute metrics and suggestions for pre-cleaned text.
fn compute(clean: &str) -> TextSummary {
    let word_count = clean.split_whitespace().count() as i64;
    let char_count = clean.len() as i64;
    let sentence_count = clean
        .chars()
        .filter(|c| matches!(c, '.' | '!' | '?'))
        .count()
        .max(1) as i64;
    let avg_words_per_sentence = word_count as f64 / sentence_count as f64;
    let readability = (100.0 - avg_words_per_sentence * 10.0).clamp(0.0, 100.0);

    // Evaluated independently, order fixed.
    let mut suggestions = Vec::new();
    if avg_words_per_sentence > LONG_SENTENCE_AVG_WORDS {
        suggestions.push(SHORTEN_SENTENCES_SUGGESTION.to_string());
    }
    if readability < LOW_READABILITY_THRESHOLD {
        suggestions.push(SIMPLER_WORDS_SUGGESTION.to_string());
    }
    if !CTA_PHRASES.is_match(clean) {
        suggestions.push(ADD_CTA_SUGGESTION.to_string());
    }

    TextSummary {
        metrics: TextMetrics {
            word_count,
            char_count,
            readability,
        },
        suggestions,
    }
}

/// Summarize raw extracted text: clean it, guard against degenerate input,
/// compute metrics and suggestions.
pub fn summarize(text: &str) -> TextSummary {
    let clean = clean_text(text);

    if is_degenerate(&clean, MIN_TEXT_CHARS, MIN_TEXT_TOKENS) {
        return TextSummary {
            metrics: TextMetrics::zero(),
            suggestions: vec![NON_TEXT_SUGGESTION.to_string()],
        };
    }

    compute(&clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_is_pure() {
        let text = "A reasonable piece of prose. It has several sentences in it! Does it also have a question? Sign up today to learn more about everything.";
        assert_eq!(summarize(text), summarize(text));
    }

    #[test]
    fn short_input_yields_zero_metrics_and_one_suggestion() {
        let summary = summarize("tiny");
        assert_eq!(summary.metrics, TextMetrics::zero());
        assert_eq!(summary.suggestions, vec![NON_TEXT_SUGGESTION.to_string()]);
    }

    #[test]
    fn binary_leftovers_are_stripped_before_measuring() {
        let mut text = String::from("stream\u{0000}\u{0001}BINARYJUNKBINARYJUNK endstream ");
        text.push_str(&"word ".repeat(5));
        let summary = summarize(&text);
        // After stripping the stream span only 5 short tokens remain.
        assert_eq!(summary.metrics, TextMetrics::zero());
    }

    #[test]
    fn well_punctuated_cta_text_fires_no_suggestions() {
        // Same shape as "Hello world. This is great! Buy now." padded past
        // the degenerate-input threshold: short sentences plus a CTA phrase.
        let text = "Hello world and welcome everyone. This update is truly great! Buy now to get the discount. We ship fast.";
        let summary = summarize(text);
        assert!(summary.suggestions.is_empty(), "{:?}", summary.suggestions);
        assert!(summary.metrics.readability >= LOW_READABILITY_THRESHOLD);
    }

    #[test]
    fn reference_scenario_word_and_sentence_math() {
        // "Hello world. This is great! Buy now." -> 7 words, 3 sentence
        // terminators, avg 2.33, readability 100 - 23.3 = 76.7.
        let summary = compute("Hello world. This is great! Buy now.");
        assert_eq!(summary.metrics.word_count, 7);
        assert_eq!(summary.metrics.char_count, 36);
        assert!((summary.metrics.readability - 76.666).abs() < 0.1);
        assert!(summary.suggestions.is_empty());
    }

    #[test]
    fn run_on_sentence_fires_all_three_suggestions_in_order() {
        let text = (0..30)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let summary = summarize(&text);
        assert_eq!(summary.metrics.word_count, 30);
        assert_eq!(summary.metrics.readability, 0.0);
        assert_eq!(
            summary.suggestions,
            vec![
                SHORTEN_SENTENCES_SUGGESTION.to_string(),
                SIMPLER_WORDS_SUGGESTION.to_string(),
                ADD_CTA_SUGGESTION.to_string(),
            ]
        );
    }

    #[test]
    fn readability_stays_in_bounds() {
        for sentence_words in [1usize, 5, 10, 30, 200] {
            let sentence = (0..sentence_words)
                .map(|i| format!("token{}", i))
                .collect::<Vec<_>>()
                .join(" ");
            let text = format!("{}. {}. {}.", sentence, sentence, sentence);
            let summary = summarize(&text);
            assert!(
                (0.0..=100.0).contains(&summary.metrics.readability),
                "readability out of range for {} words/sentence",
                sentence_words
            );
        }
    }

    #[test]
    fn cta_detection_is_case_insensitive() {
        let base = "This paragraph talks about many interesting things in several clear short sentences. It keeps going for a while. ";
        let without = summarize(&format!("{base}Nothing to click here."));
        let with = summarize(&format!("{base}Please SIGN UP for updates."));
        assert!(without.suggestions.contains(&ADD_CTA_SUGGESTION.to_string()));
        assert!(!with.suggestions.contains(&ADD_CTA_SUGGESTION.to_string()));
    }
}
