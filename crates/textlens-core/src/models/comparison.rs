use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Analysis, AnalysisMetadata};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuggestionFrequency {
    pub suggestion: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToneVariety {
    pub unique_tones: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_common_tone: Option<String>,
}

/// Aggregate statistics precomputed over a set of analyses at comparison
/// creation time, so listing comparisons never re-reads the analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonData {
    pub total_analyses: i64,
    pub avg_readability: f64,
    pub total_words: i64,
    pub readability_range: MetricRange,
    pub word_count_range: MetricRange,
    /// Suggestions appearing in more than one analysis, most frequent first,
    /// top five.
    pub common_suggestions: Vec<SuggestionFrequency>,
    pub tone_variety: ToneVariety,
}

impl ComparisonData {
    /// Aggregate over at least two analyses. Callers validate the minimum.
    pub fn from_analyses(analyses: &[Analysis]) -> Self {
        let n = analyses.len() as i64;
        let readabilities: Vec<f64> = analyses.iter().map(|a| a.metrics.readability).collect();
        let word_counts: Vec<i64> = analyses.iter().map(|a| a.metrics.word_count).collect();

        let avg_readability = readabilities.iter().sum::<f64>() / n as f64;

        Self {
            total_analyses: n,
            avg_readability,
            total_words: word_counts.iter().sum(),
            readability_range: MetricRange {
                min: readabilities.iter().copied().fold(f64::INFINITY, f64::min),
                max: readabilities
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max),
            },
            word_count_range: MetricRange {
                min: word_counts.iter().copied().min().unwrap_or(0) as f64,
                max: word_counts.iter().copied().max().unwrap_or(0) as f64,
            },
            common_suggestions: common_suggestions(analyses),
            tone_variety: tone_variety(analyses),
        }
    }
}

fn common_suggestions(analyses: &[Analysis]) -> Vec<SuggestionFrequency> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for a in analyses {
        for s in &a.suggestions {
            *counts.entry(s.as_str()).or_default() += 1;
        }
    }
    let mut repeated: Vec<SuggestionFrequency> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(suggestion, count)| SuggestionFrequency {
            suggestion: suggestion.to_string(),
            count,
        })
        .collect();
    repeated.sort_by(|a, b| b.count.cmp(&a.count).then(a.suggestion.cmp(&b.suggestion)));
    repeated.truncate(5);
    repeated
}

fn tone_variety(analyses: &[Analysis]) -> ToneVariety {
    let tones: Vec<String> = analyses
        .iter()
        .filter_map(|a| a.metadata.as_ref().and_then(|m: &AnalysisMetadata| m.tone.clone()))
        .map(|t| t.to_lowercase())
        .collect();

    let mut counts: HashMap<&str, i64> = HashMap::new();
    for t in &tones {
        *counts.entry(t.as_str()).or_default() += 1;
    }
    let most_common_tone = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(tone, _)| tone.to_string());

    ToneVariety {
        unique_tones: counts.len() as i64,
        most_common_tone,
    }
}

/// A named, owner-scoped grouping of two or more analyses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Comparison {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub analysis_ids: Vec<Uuid>,
    pub data: ComparisonData,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Comparison {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let data: serde_json::Value = row.try_get("data")?;
        let data = serde_json::from_value(data).map_err(|e| sqlx::Error::ColumnDecode {
            index: "data".into(),
            source: Box::new(e),
        })?;
        Ok(Comparison {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            analysis_ids: row.try_get("analysis_ids")?,
            data,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisStatus, TextMetrics};

    fn analysis(readability: f64, words: i64, suggestions: &[&str], tone: Option<&str>) -> Analysis {
        Analysis {
            id: Uuid::new_v4(),
            extraction_id: Uuid::new_v4(),
            metrics: TextMetrics {
                word_count: words,
                char_count: words * 5,
                readability,
            },
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            metadata: tone.map(|t| AnalysisMetadata {
                tone: Some(t.to_string()),
                ..Default::default()
            }),
            status: AnalysisStatus::Done,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn aggregates_ranges_and_averages() {
        let data = ComparisonData::from_analyses(&[
            analysis(80.0, 100, &[], None),
            analysis(40.0, 300, &[], None),
        ]);
        assert_eq!(data.total_analyses, 2);
        assert_eq!(data.avg_readability, 60.0);
        assert_eq!(data.total_words, 400);
        assert_eq!(data.readability_range.min, 40.0);
        assert_eq!(data.readability_range.max, 80.0);
        assert_eq!(data.word_count_range.min, 100.0);
        assert_eq!(data.word_count_range.max, 300.0);
    }

    #[test]
    fn common_suggestions_require_repetition() {
        let data = ComparisonData::from_analyses(&[
            analysis(50.0, 10, &["Shorten long sentences for clarity.", "only once"], None),
            analysis(50.0, 10, &["Shorten long sentences for clarity."], None),
        ]);
        assert_eq!(data.common_suggestions.len(), 1);
        assert_eq!(data.common_suggestions[0].count, 2);
        assert_eq!(
            data.common_suggestions[0].suggestion,
            "Shorten long sentences for clarity."
        );
    }

    #[test]
    fn tone_variety_is_case_insensitive() {
        let data = ComparisonData::from_analyses(&[
            analysis(50.0, 10, &[], Some("Formal")),
            analysis(50.0, 10, &[], Some("formal")),
            analysis(50.0, 10, &[], Some("technical")),
        ]);
        assert_eq!(data.tone_variety.unique_tones, 2);
        assert_eq!(data.tone_variety.most_common_tone.as_deref(), Some("formal"));
    }
}
