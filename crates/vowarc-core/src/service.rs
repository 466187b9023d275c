//! Request-level operations shared by the HTTP server and the CLI.
//!
//! [`VowArc`] wires the storage and AI collaborators to the analysis modules.
//! Each method is one request: authenticated operations resolve the user
//! first so that a bad token never reaches the AI or storage writes.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::ai::AiCapabilities;
use crate::api::{
    AcceptContractResponse, AnalyzeEvidencesRequest, AnalyzeEvidencesResponse,
    Day21DecisionRequest, Day21DecisionResponse, ExtractMemoriesRequest, ExtractMemoriesResponse,
    GenerateMeaningRequest, GenerateMeaningResponse, MirrorFeedbackRequest,
    MirrorFeedbackResponse,
};
use crate::contract::{self, Day21Decision};
use crate::error::{AuthError, CoreError, Result};
use crate::evidence::EvidenceScorer;
use crate::memory::{self, MemorySource};
use crate::mirror;
use crate::onboarding::{self, OnboardingAnswers};
use crate::report::{CommitmentReport, ReportBuilder};
use crate::storage::{Config, Storage};

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty());
    let header = header.ok_or(AuthError::MissingToken)?;

    let (scheme, token) = header
        .split_once(char::is_whitespace)
        .ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

fn log_failure(operation: &str, err: &CoreError) {
    error!(operation, kind = err.kind().as_str(), error = %err, "request failed");
}

#[derive(Clone)]
pub struct VowArc {
    storage: Arc<dyn Storage>,
    ai: Arc<dyn AiCapabilities>,
    config: Arc<Config>,
}

impl VowArc {
    pub fn new(storage: Arc<dyn Storage>, ai: Arc<dyn AiCapabilities>, config: Config) -> Self {
        Self {
            storage,
            ai,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve an `Authorization` header to a user id.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<String> {
        let token = bearer_token(header)?;
        match self.storage.user_id_for_token(token).await? {
            Some(user_id) => Ok(user_id),
            None => {
                debug!("rejected unknown bearer token");
                Err(AuthError::InvalidToken.into())
            }
        }
    }

    pub async fn analyze_evidences(
        &self,
        mut request: AnalyzeEvidencesRequest,
    ) -> Result<AnalyzeEvidencesResponse> {
        for evidence in request.evidences.iter_mut().filter(|e| e.id.is_empty()) {
            evidence.id = uuid::Uuid::new_v4().to_string();
        }

        let scorer = EvidenceScorer::new(self.ai.as_judge(), &self.config.evidence);
        let scored = scorer
            .score(
                &request.evidences,
                request.vow_content.as_deref(),
                request.meaning_content.as_deref(),
            )
            .await
            .inspect_err(|e| log_failure("analyze_evidences", e))?;

        Ok(AnalyzeEvidencesResponse {
            success: true,
            scores: scored.scores,
            highlights: scored.highlights,
        })
    }

    /// Generate and persist the meaning statement and vow.
    ///
    /// A storage failure after a successful generation is reported as
    /// `Persistence`, never as `Analysis`.
    pub async fn generate_meaning(
        &self,
        user_id: &str,
        request: GenerateMeaningRequest,
        now: DateTime<Utc>,
    ) -> Result<GenerateMeaningResponse> {
        let answers = OnboardingAnswers {
            why: request.why,
            pain: request.pain,
            ideal: request.ideal,
        };
        let generated = onboarding::generate_meaning_and_vow(self.ai.as_generator(), &answers)
            .await
            .inspect_err(|e| log_failure("generate_meaning", e))?;

        self.storage
            .save_meaning_and_vow(user_id, &generated.meaning_statement, &generated.vow, now)
            .await
            .map_err(CoreError::from)
            .inspect_err(|e| log_failure("generate_meaning", e))?;

        info!(user_id, "meaning statement and vow saved");
        Ok(GenerateMeaningResponse {
            success: true,
            meaning_statement: generated.meaning_statement,
            vow: generated.vow,
        })
    }

    /// Extract memories from a check-in and store them in one batch.
    pub async fn extract_memories(
        &self,
        user_id: &str,
        request: ExtractMemoriesRequest,
        now: DateTime<Utc>,
    ) -> Result<ExtractMemoriesResponse> {
        let checkin_id = request.checkin_id.trim();
        if checkin_id.is_empty() {
            return Err(CoreError::empty_field("checkinId"));
        }

        let memories = memory::extract_memories(
            self.ai.as_extractor(),
            &request.transcript,
            user_id,
            MemorySource::checkin(checkin_id),
            &self.config.memory,
            now,
        )
        .await
        .inspect_err(|e| log_failure("extract_memories", e))?;

        if !memories.is_empty() {
            self.storage
                .insert_memories(&memories)
                .await
                .map_err(CoreError::from)
                .inspect_err(|e| log_failure("extract_memories", e))?;
        }

        info!(user_id, checkin_id, count = memories.len(), "memories stored");
        Ok(ExtractMemoriesResponse {
            success: true,
            count: memories.len(),
        })
    }

    pub async fn generate_mirror_feedback(
        &self,
        request: MirrorFeedbackRequest,
    ) -> Result<MirrorFeedbackResponse> {
        let feedback = mirror::generate_mirror_feedback(
            self.ai.as_generator(),
            &request.checkin_text,
            request.vow_content.as_deref(),
            request.meaning_content.as_deref(),
        )
        .await
        .inspect_err(|e| log_failure("generate_mirror_feedback", e))?;

        Ok(MirrorFeedbackResponse {
            success: true,
            mirror_feedback: feedback,
        })
    }

    pub async fn accept_contract(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AcceptContractResponse> {
        let accepted = contract::accept_contract(self.storage.as_ref(), user_id, now)
            .await
            .inspect_err(|e| log_failure("accept_contract", e))?;
        Ok(AcceptContractResponse {
            success: true,
            current_phase: accepted.current_phase,
            trial_start_date: accepted.trial_start_date,
        })
    }

    pub async fn day21_report(&self, user_id: &str, now: DateTime<Utc>) -> Result<CommitmentReport> {
        ReportBuilder::new(self.storage.as_ref(), self.ai.as_judge(), &self.config)
            .build(user_id, now)
            .await
            .inspect_err(|e| log_failure("day21_report", e))
    }

    pub async fn day21_decision(
        &self,
        user_id: &str,
        request: Day21DecisionRequest,
        now: DateTime<Utc>,
    ) -> Result<Day21DecisionResponse> {
        let decision = Day21Decision::parse(&request.decision, request.vow.as_deref())?;
        let phase = contract::apply_day21_decision(self.storage.as_ref(), user_id, &decision, now)
            .await
            .inspect_err(|e| log_failure("day21_decision", e))?;
        Ok(Day21DecisionResponse {
            success: true,
            current_phase: phase,
        })
    }
}
