//! HTTP surface for VowArc.
//!
//! Thin axum layer over [`vowarc_core::VowArc`]: handlers parse JSON, pull the
//! bearer token out of the `Authorization` header, and map core errors onto
//! status codes.

pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vowarc_core::VowArc;

pub use error::ApiError;

/// State shared across handlers.
pub type AppState = VowArc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Unauthenticated analysis
        .route("/analyze-evidences", post(routes::analyze_evidences))
        .route("/generate-mirror-feedback", post(routes::generate_mirror_feedback))
        // Bearer-authenticated
        .route("/generate-meaning", post(routes::generate_meaning))
        .route("/extract-memories", post(routes::extract_memories))
        .route("/accept-contract", post(routes::accept_contract))
        .route("/day21-report", get(routes::day21_report))
        .route("/day21-decision", post(routes::day21_decision))
        // Health check
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
