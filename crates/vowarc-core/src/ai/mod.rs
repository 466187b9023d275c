//! AI capabilities the core depends on.
//!
//! Each capability is a trait with one production implementation
//! ([`OpenAiClient`]) and one scripted implementation for tests
//! ([`fake::ScriptedAi`]). Implementations return the model's answer parsed
//! into the raw types below; range checks and cross-referencing against the
//! request happen in the adapters that call them.

pub mod fake;
pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::models::{Evidence, MemoryType};
use crate::onboarding::OnboardingAnswers;

pub use openai::{AiConfig, OpenAiClient};

/// Meaning statement and vow as returned by the model, before trimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMeaning {
    #[serde(default, alias = "meaning_statement")]
    pub meaning_statement: String,
    #[serde(default)]
    pub vow: String,
}

/// Input for one batched evidence judgment.
#[derive(Debug, Clone, Copy)]
pub struct JudgeRequest<'a> {
    pub evidences: &'a [Evidence],
    pub vow_content: Option<&'a str>,
    pub meaning_content: Option<&'a str>,
}

/// One scored line of the model's answer. `index` is 1-based into
/// [`JudgeRequest::evidences`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceJudgment {
    pub index: usize,
    pub score: f64,
    #[serde(default)]
    pub rationale: String,
}

/// One memory candidate as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMemory {
    pub content: String,
    #[serde(alias = "memory_type")]
    pub memory_type: MemoryType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(alias = "confidence_score", alias = "confidenceScore")]
    pub confidence: f64,
}

/// Input for mirror feedback on a single check-in.
#[derive(Debug, Clone, Copy)]
pub struct MirrorRequest<'a> {
    pub checkin_text: &'a str,
    pub vow_content: Option<&'a str>,
    pub meaning_content: Option<&'a str>,
}

/// Free-text generation: onboarding meaning/vow and check-in mirror feedback.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_meaning(
        &self,
        answers: &OnboardingAnswers,
    ) -> Result<GeneratedMeaning, AnalysisError>;

    async fn generate_mirror_feedback(
        &self,
        request: &MirrorRequest<'_>,
    ) -> Result<String, AnalysisError>;
}

/// Scores how well each piece of evidence reflects the user's vow.
#[async_trait]
pub trait EvidenceJudge: Send + Sync {
    /// One call for the whole batch.
    async fn judge(
        &self,
        request: &JudgeRequest<'_>,
    ) -> Result<Vec<EvidenceJudgment>, AnalysisError>;
}

/// Pulls durable facts out of a check-in transcript.
#[async_trait]
pub trait MemoryExtractor: Send + Sync {
    async fn extract(&self, transcript: &str) -> Result<Vec<ExtractedMemory>, AnalysisError>;
}

/// Everything the service needs from the AI side.
pub trait AiCapabilities: TextGenerator + EvidenceJudge + MemoryExtractor {
    fn as_generator(&self) -> &dyn TextGenerator;
    fn as_judge(&self) -> &dyn EvidenceJudge;
    fn as_extractor(&self) -> &dyn MemoryExtractor;
}

impl<T> AiCapabilities for T
where
    T: TextGenerator + EvidenceJudge + MemoryExtractor,
{
    fn as_generator(&self) -> &dyn TextGenerator {
        self
    }

    fn as_judge(&self) -> &dyn EvidenceJudge {
        self
    }

    fn as_extractor(&self) -> &dyn MemoryExtractor {
        self
    }
}
