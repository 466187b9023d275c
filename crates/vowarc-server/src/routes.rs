//! Endpoint handlers.
//!
//! Authenticated handlers resolve the bearer token before looking at the
//! body, so a bad token is answered with 401 even when the body is invalid.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use vowarc_core::api::{
    AcceptContractResponse, AnalyzeEvidencesRequest, AnalyzeEvidencesResponse,
    Day21DecisionRequest, Day21DecisionResponse, ExtractMemoriesRequest, ExtractMemoriesResponse,
    GenerateMeaningRequest, GenerateMeaningResponse, MirrorFeedbackRequest,
    MirrorFeedbackResponse,
};
use vowarc_core::{CommitmentReport, ValidationError};

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        ApiError::from(ValidationError::InvalidValue {
            field: "body".into(),
            message: rejection.body_text(),
        })
    })
}

async fn user_id(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    // A header with non-visible ASCII is treated like a missing one.
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    Ok(state.authenticate(header).await?)
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

/// POST /analyze-evidences
pub async fn analyze_evidences(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeEvidencesRequest>, JsonRejection>,
) -> ApiResult<AnalyzeEvidencesResponse> {
    let request = body(payload)?;
    Ok(Json(state.analyze_evidences(request).await?))
}

/// POST /generate-mirror-feedback
pub async fn generate_mirror_feedback(
    State(state): State<AppState>,
    payload: Result<Json<MirrorFeedbackRequest>, JsonRejection>,
) -> ApiResult<MirrorFeedbackResponse> {
    let request = body(payload)?;
    Ok(Json(state.generate_mirror_feedback(request).await?))
}

/// POST /generate-meaning
pub async fn generate_meaning(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateMeaningRequest>, JsonRejection>,
) -> ApiResult<GenerateMeaningResponse> {
    let user_id = user_id(&state, &headers).await?;
    let request = body(payload)?;
    Ok(Json(state.generate_meaning(&user_id, request, Utc::now()).await?))
}

/// POST /extract-memories
pub async fn extract_memories(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ExtractMemoriesRequest>, JsonRejection>,
) -> ApiResult<ExtractMemoriesResponse> {
    let user_id = user_id(&state, &headers).await?;
    let request = body(payload)?;
    Ok(Json(state.extract_memories(&user_id, request, Utc::now()).await?))
}

/// POST /accept-contract
pub async fn accept_contract(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<AcceptContractResponse> {
    let user_id = user_id(&state, &headers).await?;
    Ok(Json(state.accept_contract(&user_id, Utc::now()).await?))
}

/// GET /day21-report
pub async fn day21_report(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<CommitmentReport> {
    let user_id = user_id(&state, &headers).await?;
    Ok(Json(state.day21_report(&user_id, Utc::now()).await?))
}

/// POST /day21-decision
pub async fn day21_decision(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Day21DecisionRequest>, JsonRejection>,
) -> ApiResult<Day21DecisionResponse> {
    let user_id = user_id(&state, &headers).await?;
    let request = body(payload)?;
    Ok(Json(state.day21_decision(&user_id, request, Utc::now()).await?))
}
