//! # VowArc Core Library
//!
//! Core logic for VowArc, a self-commitment journaling coach. A user turns
//! three onboarding answers into a Vow, runs a 21-day trial of daily check-ins
//! and evidence, and decides on Day 21 whether to continue, revise, or exit.
//!
//! ## Architecture
//!
//! - **Metrics**: pure Small Wins rates and tier selection ([`stats`])
//! - **Analysis adapters**: evidence scoring, memory extraction, meaning/vow
//!   and mirror feedback generation over the AI capability traits in [`ai`]
//! - **Report**: the Day 21 Commitment Report ([`report`])
//! - **Storage**: SQLite persistence and TOML configuration ([`storage`])
//! - **Service**: request-level operations used by the server and CLI
//!
//! ## Key Components
//!
//! - [`VowArc`]: Request-level service facade
//! - [`ReportBuilder`]: Day 21 report orchestration
//! - [`Database`]: SQLite storage collaborator
//! - [`Config`]: Application configuration management

pub mod ai;
pub mod api;
pub mod contract;
pub mod error;
pub mod evidence;
pub mod memory;
pub mod mirror;
pub mod models;
pub mod onboarding;
pub mod report;
pub mod service;
pub mod stats;
pub mod storage;

pub use ai::{AiCapabilities, AiConfig, OpenAiClient};
pub use contract::{accept_contract, apply_day21_decision, Day21Decision};
pub use error::{
    AnalysisError, AuthError, ConfigError, CoreError, DatabaseError, ErrorKind, ValidationError,
};
pub use evidence::{EvidenceConfig, EvidenceScorer, ScoredEvidences};
pub use memory::{extract_memories, memory_expiration, MemoryConfig};
pub use models::{CheckIn, Commitment, Evidence, Memory, MemoryType, Phase, User};
pub use onboarding::{generate_meaning_and_vow, OnboardingAnswers};
pub use report::{CommitmentReport, RecommendedPath, ReportBuilder, ReportConfig};
pub use service::VowArc;
pub use stats::{compute_small_wins, MetricsConfig, SmallWinsCounts, SmallWinsMetrics, Tier};
pub use storage::{Config, Database, Storage};
