//! AI augmentation adapter.
//!
//! Wraps the local metrics engine with an optional call to an external
//! generative-text service (Gemini `generateContent`). The adapter's
//! contract is that no downstream failure is ever visible to the caller:
//! missing key, network error, non-2xx, timeout, and malformed replies all
//! degrade to the local [`summarize`] result.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use textlens_core::models::{AnalysisMetadata, TextMetrics};
use thiserror::Error;
use tracing::{debug, warn};

use crate::metrics::{self, clean_text, summarize, NON_TEXT_SUGGESTION};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Input truncation cap for the external call, in characters.
const AUGMENT_INPUT_CAP: usize = 30_000;

/// Degenerate-input bar for skipping the external call. Slightly higher
/// than the metrics engine's own bar: a borderline-short text still gets
/// local metrics but is not worth an API round trip.
const MIN_AUGMENT_CHARS: usize = 100;
const MIN_AUGMENT_TOKENS: usize = 20;

/// Caps on merged output.
const MAX_SUGGESTIONS: usize = 10;
const MAX_FALLBACK_SUGGESTIONS: usize = 8;

#[derive(Debug, Error)]
enum AugmentError {
    #[error("missing API key")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("empty response")]
    EmptyResponse,
}

/// Result of augmenting one extraction: local metrics possibly enriched by
/// the external model.
#[derive(Debug, Clone)]
pub struct AugmentedAnalysis {
    pub metrics: TextMetrics,
    pub suggestions: Vec<String>,
    pub metadata: Option<AnalysisMetadata>,
}

// generateContent request/response structures
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Fields the model is asked to return. Everything is optional because the
/// reply is free text that merely tends to contain this JSON object.
#[derive(Debug, Default)]
struct AiAnalysis {
    readability: Option<f64>,
    summary: Option<String>,
    key_topics: Option<Vec<String>>,
    tone: Option<String>,
    suggestions: Vec<String>,
    word_count: Option<i64>,
    estimated_reading_time: Option<f64>,
}

pub struct Augmenter {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl Augmenter {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            model: model.into(),
        })
    }

    /// Whether an external model is configured at all. Callers may use this
    /// to skip augmentation entirely; calling `augment` anyway is still
    /// safe.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Augment local metrics with the external model. Never fails: any
    /// problem on the external path degrades to the local summary.
    pub async fn augment(&self, raw_text: &str) -> AugmentedAnalysis {
        let clean = clean_text(raw_text);

        if metrics::is_degenerate(&clean, MIN_AUGMENT_CHARS, MIN_AUGMENT_TOKENS) {
            let local = summarize(raw_text);
            return AugmentedAnalysis {
                metrics: local.metrics,
                suggestions: local.suggestions,
                metadata: Some(AnalysisMetadata {
                    summary: Some(NON_TEXT_SUGGESTION.to_string()),
                    tone: Some("technical".to_string()),
                    key_topics: Some(vec![
                        "File Analysis".to_string(),
                        "Content Type".to_string(),
                        "Text Extraction".to_string(),
                    ]),
                    estimated_reading_time_minutes: Some(0.0),
                }),
            };
        }

        let ai = match self.call_model(&clean).await {
            Ok(reply) => parse_ai_reply(&reply),
            Err(e) => {
                // Required failure-containment boundary: the caller never
                // sees this error.
                warn!(error = %e, "AI augmentation failed, falling back to local analysis");
                None
            }
        };

        let local = summarize(raw_text);
        merge(local, ai)
    }

    async fn call_model(&self, clean_text: &str) -> Result<String, AugmentError> {
        let api_key = self.api_key.as_deref().ok_or(AugmentError::MissingApiKey)?;

        let input: String = clean_text.chars().take(AUGMENT_INPUT_CAP).collect();
        let prompt = build_prompt(&input);

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 2048,
            },
        };

        let response = self
            .http_client
            .post(format!(
                "{}/{}:generateContent?key={}",
                API_BASE, self.model, api_key
            ))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AugmentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(AugmentError::EmptyResponse)?;

        debug!(reply_len = text.len(), "AI augmentation reply received");
        Ok(text)
    }
}

fn build_prompt(input: &str) -> String {
    format!(
        r#"Analyze the following text and provide a comprehensive analysis. Return your response as valid JSON with the following structure:

{{
  "readability": number (0-100, where 100 is very easy to read),
  "summary": "1-2 sentence summary of the main content",
  "keyTopics": ["array", "of", "main", "topics"],
  "tone": "formal|informal|technical|conversational",
  "suggestions": ["array", "of", "actionable", "improvement", "suggestions"],
  "wordCount": number,
  "estimatedReadingTime": number (in minutes)
}}

Text to analyze:
{input}"#
    )
}

/// Interpret the model's free-text reply: first try the embedded JSON
/// object, then fall back to harvesting suggestion-looking lines.
fn parse_ai_reply(reply: &str) -> Option<AiAnalysis> {
    if let Some(parsed) = extract_json_object(reply) {
        return Some(parsed);
    }

    let suggestions: Vec<String> = reply
        .split(['\n', '•', '-'])
        .map(str::trim)
        .filter(|s| s.len() > 10 && s.len() < 200)
        .take(MAX_FALLBACK_SUGGESTIONS)
        .map(str::to_string)
        .collect();

    if suggestions.is_empty() {
        None
    } else {
        Some(AiAnalysis {
            suggestions,
            ..Default::default()
        })
    }
}

/// Locate the first `{...}` span in the reply and parse it leniently:
/// unexpected field types are ignored rather than rejected.
fn extract_json_object(reply: &str) -> Option<AiAnalysis> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(&reply[start..=end]).ok()?;
    let obj = value.as_object()?;

    let string_list = |v: &serde_json::Value| -> Option<Vec<String>> {
        v.as_array().map(|arr| {
            arr.iter()
                .filter_map(|x| x.as_str().map(str::to_string))
                .collect()
        })
    };

    Some(AiAnalysis {
        readability: obj.get("readability").and_then(|v| v.as_f64()),
        summary: obj
            .get("summary")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        key_topics: obj.get("keyTopics").and_then(&string_list),
        tone: obj.get("tone").and_then(|v| v.as_str()).map(str::to_string),
        suggestions: obj
            .get("suggestions")
            .and_then(&string_list)
            .unwrap_or_default(),
        word_count: obj.get("wordCount").and_then(|v| v.as_i64()),
        estimated_reading_time: obj.get("estimatedReadingTime").and_then(|v| v.as_f64()),
    })
}

/// Merge policy: AI word count and readability win when present, character
/// count is always local, suggestions are the deduplicated union with AI
/// entries first, capped.
fn merge(local: crate::metrics::TextSummary, ai: Option<AiAnalysis>) -> AugmentedAnalysis {
    let ai = match ai {
        Some(ai) => ai,
        None => {
            return AugmentedAnalysis {
                metrics: local.metrics,
                suggestions: local.suggestions,
                metadata: None,
            }
        }
    };

    let metrics = TextMetrics {
        word_count: ai.word_count.unwrap_or(local.metrics.word_count),
        char_count: local.metrics.char_count,
        readability: ai.readability.unwrap_or(local.metrics.readability),
    };

    let mut seen = HashSet::new();
    let suggestions: Vec<String> = ai
        .suggestions
        .into_iter()
        .chain(local.suggestions)
        .filter(|s| seen.insert(s.clone()))
        .take(MAX_SUGGESTIONS)
        .collect();

    let metadata = AnalysisMetadata {
        summary: ai.summary,
        tone: ai.tone,
        key_topics: ai.key_topics,
        estimated_reading_time_minutes: ai.estimated_reading_time,
    };
    let metadata = (!metadata.is_empty()).then_some(metadata);

    AugmentedAnalysis {
        metrics,
        suggestions,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::TextSummary;

    fn long_prose() -> String {
        "This document describes the quarterly planning process in detail. "
            .repeat(10)
    }

    #[tokio::test]
    async fn missing_api_key_degrades_to_local_result() {
        let augmenter =
            Augmenter::new(None, "gemini-1.5-flash", Duration::from_secs(5)).unwrap();
        let text = long_prose();
        let result = augmenter.augment(&text).await;
        let local = summarize(&text);

        assert_eq!(result.metrics, local.metrics);
        assert_eq!(result.suggestions, local.suggestions);
        assert!(result.metadata.is_none());
    }

    #[tokio::test]
    async fn degenerate_text_skips_the_external_call() {
        let augmenter =
            Augmenter::new(Some("key".to_string()), "gemini-1.5-flash", Duration::from_secs(5))
                .unwrap();
        let result = augmenter.augment("too short").await;

        assert_eq!(result.metrics.word_count, 0);
        assert_eq!(result.suggestions, vec![NON_TEXT_SUGGESTION.to_string()]);
        let metadata = result.metadata.expect("synthetic metadata");
        assert_eq!(metadata.tone.as_deref(), Some("technical"));
        assert_eq!(metadata.estimated_reading_time_minutes, Some(0.0));
    }

    #[test]
    fn json_object_is_located_inside_prose() {
        let reply = r#"Here is my analysis:
{"readability": 62.5, "summary": "A planning document.", "keyTopics": ["planning"], "tone": "formal", "suggestions": ["Tighten the intro."], "wordCount": 120, "estimatedReadingTime": 2}
Hope this helps!"#;
        let ai = parse_ai_reply(reply).unwrap();
        assert_eq!(ai.readability, Some(62.5));
        assert_eq!(ai.word_count, Some(120));
        assert_eq!(ai.tone.as_deref(), Some("formal"));
        assert_eq!(ai.suggestions, vec!["Tighten the intro.".to_string()]);
    }

    #[test]
    fn non_numeric_readability_is_ignored() {
        let reply = r#"{"readability": "pretty good", "suggestions": ["Use active voice here."]}"#;
        let ai = parse_ai_reply(reply).unwrap();
        assert_eq!(ai.readability, None);
        assert_eq!(ai.suggestions.len(), 1);
    }

    #[test]
    fn unparseable_reply_falls_back_to_line_harvesting() {
        let reply = "Thoughts:\n• Use shorter paragraphs throughout the text\n• ok\n• Consider adding section headings for scannability\n";
        let ai = parse_ai_reply(reply).unwrap();
        assert_eq!(ai.suggestions.len(), 2);
        assert!(ai.readability.is_none());
        // "ok" fails the 10-char lower bound
        assert!(!ai.suggestions.iter().any(|s| s == "ok"));
    }

    #[test]
    fn merge_prefers_ai_values_and_dedupes_suggestions() {
        let local = TextSummary {
            metrics: TextMetrics {
                word_count: 100,
                char_count: 640,
                readability: 55.0,
            },
            suggestions: vec![
                "Add a clear call-to-action.".to_string(),
                "Shorten long sentences for clarity.".to_string(),
            ],
        };
        let ai = AiAnalysis {
            readability: Some(70.0),
            word_count: Some(104),
            suggestions: vec![
                "Add a clear call-to-action.".to_string(),
                "Vary sentence openings.".to_string(),
            ],
            summary: Some("ok".to_string()),
            ..Default::default()
        };

        let merged = merge(local, Some(ai));
        assert_eq!(merged.metrics.word_count, 104);
        assert_eq!(merged.metrics.char_count, 640);
        assert_eq!(merged.metrics.readability, 70.0);
        assert_eq!(
            merged.suggestions,
            vec![
                "Add a clear call-to-action.".to_string(),
                "Vary sentence openings.".to_string(),
                "Shorten long sentences for clarity.".to_string(),
            ]
        );
        assert!(merged.metadata.is_some());
    }

    #[test]
    fn merge_caps_suggestions() {
        let local = TextSummary {
            metrics: TextMetrics {
                word_count: 1,
                char_count: 1,
                readability: 1.0,
            },
            suggestions: (0..6).map(|i| format!("local suggestion {i}")).collect(),
        };
        let ai = AiAnalysis {
            suggestions: (0..6).map(|i| format!("ai suggestion {i}")).collect(),
            ..Default::default()
        };
        let merged = merge(local, Some(ai));
        assert_eq!(merged.suggestions.len(), MAX_SUGGESTIONS);
        assert!(merged.suggestions[0].starts_with("ai "));
    }
}
