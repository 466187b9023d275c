//! Evidence scoring.
//!
//! Sends the user's evidence log to the judge in one batch, then normalizes
//! the answer: every item must be scored exactly once, scores are clamped to
//! `[0, 1]`, and the top items become highlights.
//!
//! Highlight order is score descending, then earliest `submitted_at`, then
//! input position, so equal inputs always produce equal highlights.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ai::{EvidenceJudge, EvidenceJudgment, JudgeRequest};
use crate::error::{AnalysisError, Result, ValidationError};
use crate::models::Evidence;

/// `[evidence]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceConfig {
    #[serde(default = "default_max_highlights")]
    pub max_highlights: usize,
}

fn default_max_highlights() -> usize {
    3
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            max_highlights: default_max_highlights(),
        }
    }
}

/// Normalized score for one evidence item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceScore {
    pub evidence_id: String,
    pub score: f64,
    pub rationale: String,
}

/// Scores in input order plus the highlighted subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvidences {
    pub scores: Vec<EvidenceScore>,
    pub highlights: Vec<Evidence>,
}

/// Evidence scoring adapter around an [`EvidenceJudge`].
pub struct EvidenceScorer<'a> {
    judge: &'a dyn EvidenceJudge,
    max_highlights: usize,
}

impl<'a> EvidenceScorer<'a> {
    pub fn new(judge: &'a dyn EvidenceJudge, config: &EvidenceConfig) -> Self {
        Self {
            judge,
            max_highlights: config.max_highlights,
        }
    }

    /// Score `evidences` against the vow and meaning statement.
    ///
    /// An empty slice returns empty results without calling the judge.
    ///
    /// # Errors
    /// - `Validation` if any evidence has blank content
    /// - `Analysis` if the judge fails or its answer does not cover every item
    pub async fn score(
        &self,
        evidences: &[Evidence],
        vow_content: Option<&str>,
        meaning_content: Option<&str>,
    ) -> Result<ScoredEvidences> {
        if evidences.is_empty() {
            return Ok(ScoredEvidences::default());
        }

        if let Some(pos) = evidences.iter().position(|e| e.content.trim().is_empty()) {
            return Err(ValidationError::InvalidValue {
                field: format!("evidences[{pos}].content"),
                message: "must not be empty".into(),
            }
            .into());
        }

        let judgments = self
            .judge
            .judge(&JudgeRequest {
                evidences,
                vow_content,
                meaning_content,
            })
            .await?;

        let scored = normalize_judgments(evidences, judgments, self.max_highlights).map_err(|e| {
            warn!(error = %e, evidence_count = evidences.len(), "discarding unusable judgment");
            e
        })?;

        debug!(
            evidence_count = evidences.len(),
            highlight_count = scored.highlights.len(),
            "scored evidence batch"
        );
        Ok(scored)
    }
}

/// Match judgments to evidence by 1-based index and build the final result.
pub fn normalize_judgments(
    evidences: &[Evidence],
    judgments: Vec<EvidenceJudgment>,
    max_highlights: usize,
) -> Result<ScoredEvidences, AnalysisError> {
    let mut slots: Vec<Option<EvidenceJudgment>> = vec![None; evidences.len()];

    for judgment in judgments {
        if judgment.index == 0 || judgment.index > evidences.len() {
            return Err(AnalysisError::Malformed(format!(
                "judgment index {} outside 1..={}",
                judgment.index,
                evidences.len()
            )));
        }
        if !judgment.score.is_finite() {
            return Err(AnalysisError::Malformed(format!(
                "non-numeric score for item {}",
                judgment.index
            )));
        }
        let slot = &mut slots[judgment.index - 1];
        if slot.is_some() {
            return Err(AnalysisError::Malformed(format!(
                "item {} scored more than once",
                judgment.index
            )));
        }
        *slot = Some(judgment);
    }

    let mut scores = Vec::with_capacity(evidences.len());
    for (i, (evidence, slot)) in evidences.iter().zip(slots).enumerate() {
        let judgment =
            slot.ok_or_else(|| AnalysisError::Malformed(format!("item {} was not scored", i + 1)))?;
        scores.push(EvidenceScore {
            evidence_id: evidence.id.clone(),
            score: judgment.score.clamp(0.0, 1.0),
            rationale: judgment.rationale.trim().to_string(),
        });
    }

    let highlights = select_highlights(evidences, &scores, max_highlights);
    Ok(ScoredEvidences { scores, highlights })
}

/// Pick up to `max` evidences by score, ties going to the earliest submission.
///
/// `scores` must be parallel to `evidences`.
pub fn select_highlights(
    evidences: &[Evidence],
    scores: &[EvidenceScore],
    max: usize,
) -> Vec<Evidence> {
    let mut order: Vec<usize> = (0..evidences.len().min(scores.len())).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .score
            .total_cmp(&scores[a].score)
            .then_with(|| evidences[a].submitted_at.cmp(&evidences[b].submitted_at))
            .then_with(|| a.cmp(&b))
    });

    order
        .into_iter()
        .take(max)
        .map(|i| {
            let mut evidence = evidences[i].clone();
            evidence.score = Some(scores[i].score);
            evidence.rationale = Some(scores[i].rationale.clone());
            evidence.is_highlight = true;
            evidence
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::ScriptedAi;
    use crate::error::ErrorKind;
    use chrono::{Duration, TimeZone, Utc};

    fn evidences(n: usize) -> Vec<Evidence> {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let mut e = Evidence::new(format!("Evidence {i}"), base + Duration::days(i as i64));
                e.id = format!("e{i}");
                e
            })
            .collect()
    }

    fn judgment(index: usize, score: f64) -> EvidenceJudgment {
        EvidenceJudgment {
            index,
            score,
            rationale: format!("reason {index}"),
        }
    }

    #[tokio::test]
    async fn test_empty_input_skips_judge() {
        let ai = ScriptedAi::new().with_uniform_score(0.5);
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let result = scorer.score(&[], Some("vow"), None).await.unwrap();
        assert!(result.scores.is_empty());
        assert!(result.highlights.is_empty());
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_batched_call() {
        let ai = ScriptedAi::new().with_uniform_score(0.5);
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let result = scorer.score(&evidences(6), None, None).await.unwrap();
        assert_eq!(ai.calls(), 1);
        assert_eq!(result.scores.len(), 6);
    }

    #[tokio::test]
    async fn test_highlights_capped_and_ordered() {
        let ai = ScriptedAi::new().with_judgments(vec![
            judgment(1, 0.2),
            judgment(2, 0.9),
            judgment(3, 0.7),
            judgment(4, 0.95),
            judgment(5, 0.1),
        ]);
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let result = scorer.score(&evidences(5), None, None).await.unwrap();

        let ids: Vec<&str> = result.highlights.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e1", "e2"]);
        assert!(result.highlights.iter().all(|e| e.is_highlight));
        assert_eq!(result.highlights[0].score, Some(0.95));
        assert_eq!(result.highlights[0].rationale.as_deref(), Some("reason 4"));
    }

    #[tokio::test]
    async fn test_ties_go_to_earliest_submission() {
        let mut input = evidences(4);
        // Submitted last but listed first.
        input[0].submitted_at = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();

        let ai = ScriptedAi::new().with_uniform_score(0.8);
        let config = EvidenceConfig { max_highlights: 2 };
        let scorer = EvidenceScorer::new(&ai, &config);
        let result = scorer.score(&input, None, None).await.unwrap();

        let ids: Vec<&str> = result.highlights.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn test_scores_are_clamped() {
        let ai = ScriptedAi::new().with_judgments(vec![judgment(1, 1.7), judgment(2, -0.4)]);
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let result = scorer.score(&evidences(2), None, None).await.unwrap();
        assert_eq!(result.scores[0].score, 1.0);
        assert_eq!(result.scores[1].score, 0.0);
    }

    #[tokio::test]
    async fn test_missing_item_is_analysis_failure() {
        let ai = ScriptedAi::new().with_judgments(vec![judgment(1, 0.5)]);
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let err = scorer.score(&evidences(2), None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Analysis);
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_analysis_failure() {
        let ai = ScriptedAi::new().with_judgments(vec![judgment(1, 0.5), judgment(3, 0.5)]);
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let err = scorer.score(&evidences(2), None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Analysis);
    }

    #[tokio::test]
    async fn test_duplicate_index_is_analysis_failure() {
        let ai = ScriptedAi::new().with_judgments(vec![judgment(1, 0.5), judgment(1, 0.6)]);
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let err = scorer.score(&evidences(1), None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Analysis);
    }

    #[tokio::test]
    async fn test_blank_content_is_validation_failure() {
        let mut input = evidences(2);
        input[1].content = " ".into();
        let ai = ScriptedAi::new().with_uniform_score(0.5);
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let err = scorer.score(&input, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_outage_returns_no_partial_result() {
        let ai = ScriptedAi::failing();
        let scorer = EvidenceScorer::new(&ai, &EvidenceConfig::default());
        let err = scorer.score(&evidences(3), None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Analysis);
    }

    #[test]
    fn test_select_highlights_fewer_than_max() {
        let input = evidences(2);
        let scores: Vec<EvidenceScore> = input
            .iter()
            .map(|e| EvidenceScore {
                evidence_id: e.id.clone(),
                score: 0.4,
                rationale: String::new(),
            })
            .collect();
        assert_eq!(select_highlights(&input, &scores, 3).len(), 2);
        assert!(select_highlights(&input, &scores, 0).is_empty());
    }
}
