//! Request and response bodies of the HTTP surface.
//!
//! All bodies are camelCase JSON. Successful responses carry
//! `"success": true`; failures are an [`ErrorBody`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::evidence::EvidenceScore;
use crate::models::{Evidence, Phase};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeEvidencesRequest {
    #[serde(default)]
    pub evidences: Vec<Evidence>,
    #[serde(default)]
    pub vow_content: Option<String>,
    #[serde(default)]
    pub meaning_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeEvidencesResponse {
    pub success: bool,
    pub scores: Vec<EvidenceScore>,
    pub highlights: Vec<Evidence>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMeaningRequest {
    #[serde(default)]
    pub why: String,
    #[serde(default)]
    pub pain: String,
    #[serde(default)]
    pub ideal: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMeaningResponse {
    pub success: bool,
    pub meaning_statement: String,
    pub vow: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractMemoriesRequest {
    #[serde(default)]
    pub checkin_id: String,
    #[serde(default)]
    pub transcript: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractMemoriesResponse {
    pub success: bool,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorFeedbackRequest {
    #[serde(default)]
    pub checkin_text: String,
    #[serde(default)]
    pub vow_content: Option<String>,
    #[serde(default)]
    pub meaning_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorFeedbackResponse {
    pub success: bool,
    pub mirror_feedback: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptContractResponse {
    pub success: bool,
    pub current_phase: Phase,
    pub trial_start_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Day21DecisionRequest {
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub vow: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Day21DecisionResponse {
    pub success: bool,
    pub current_phase: Phase,
}

/// Failure body: a stable `error` code and a message fit for end users.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl From<&CoreError> for ErrorBody {
    fn from(err: &CoreError) -> Self {
        Self {
            error: err.kind().as_str().to_string(),
            message: err.public_message(),
        }
    }
}
