//! Scripted AI capabilities for tests and offline runs.
//!
//! Responses are fixed at construction. Capabilities without a scripted
//! response fail with [`AnalysisError::Malformed`], and [`ScriptedAi::failing`]
//! makes every call fail as if the service were down.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    EvidenceJudge, EvidenceJudgment, ExtractedMemory, GeneratedMeaning, JudgeRequest,
    MemoryExtractor, MirrorRequest, TextGenerator,
};
use crate::error::AnalysisError;
use crate::onboarding::OnboardingAnswers;

/// How the fake answers a judge request.
#[derive(Debug, Clone)]
enum JudgeScript {
    Fixed(Vec<EvidenceJudgment>),
    /// Score every item with the same value.
    Uniform(f64),
}

#[derive(Debug, Default)]
pub struct ScriptedAi {
    meaning: Option<GeneratedMeaning>,
    mirror: Option<String>,
    judgments: Option<JudgeScript>,
    memories: Option<Vec<ExtractedMemory>>,
    failing: bool,
    calls: AtomicUsize,
}

impl ScriptedAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with [`AnalysisError::Unreachable`].
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_meaning(mut self, meaning_statement: &str, vow: &str) -> Self {
        self.meaning = Some(GeneratedMeaning {
            meaning_statement: meaning_statement.to_string(),
            vow: vow.to_string(),
        });
        self
    }

    pub fn with_mirror(mut self, feedback: &str) -> Self {
        self.mirror = Some(feedback.to_string());
        self
    }

    pub fn with_judgments(mut self, judgments: Vec<EvidenceJudgment>) -> Self {
        self.judgments = Some(JudgeScript::Fixed(judgments));
        self
    }

    pub fn with_uniform_score(mut self, score: f64) -> Self {
        self.judgments = Some(JudgeScript::Uniform(score));
        self
    }

    pub fn with_memories(mut self, memories: Vec<ExtractedMemory>) -> Self {
        self.memories = Some(memories);
        self
    }

    /// Number of calls made across all capabilities.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            Err(AnalysisError::Unreachable("scripted outage".into()))
        } else {
            Ok(())
        }
    }

    fn unscripted(capability: &str) -> AnalysisError {
        AnalysisError::Malformed(format!("no scripted {capability} response"))
    }
}

#[async_trait]
impl TextGenerator for ScriptedAi {
    async fn generate_meaning(
        &self,
        _answers: &OnboardingAnswers,
    ) -> Result<GeneratedMeaning, AnalysisError> {
        self.begin()?;
        self.meaning.clone().ok_or_else(|| Self::unscripted("meaning"))
    }

    async fn generate_mirror_feedback(
        &self,
        _request: &MirrorRequest<'_>,
    ) -> Result<String, AnalysisError> {
        self.begin()?;
        self.mirror.clone().ok_or_else(|| Self::unscripted("mirror"))
    }
}

#[async_trait]
impl EvidenceJudge for ScriptedAi {
    async fn judge(
        &self,
        request: &JudgeRequest<'_>,
    ) -> Result<Vec<EvidenceJudgment>, AnalysisError> {
        self.begin()?;
        match &self.judgments {
            Some(JudgeScript::Fixed(judgments)) => Ok(judgments.clone()),
            Some(JudgeScript::Uniform(score)) => Ok((1..=request.evidences.len())
                .map(|index| EvidenceJudgment {
                    index,
                    score: *score,
                    rationale: "scripted".into(),
                })
                .collect()),
            None => Err(Self::unscripted("judge")),
        }
    }
}

#[async_trait]
impl MemoryExtractor for ScriptedAi {
    async fn extract(&self, _transcript: &str) -> Result<Vec<ExtractedMemory>, AnalysisError> {
        self.begin()?;
        self.memories.clone().ok_or_else(|| Self::unscripted("memories"))
    }
}
