mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, ServerConfig};
pub use database::Database;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

use crate::error::{ConfigError, DatabaseError};
use crate::models::{CheckIn, Commitment, Evidence, MeaningStatement, Memory, Phase, User, Vow};

/// Returns `~/.config/vowarc[-dev]/` based on VOWARC_ENV.
///
/// Set VOWARC_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("VOWARC_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("vowarc-dev")
    } else {
        base_dir.join("vowarc")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// The storage collaborator as seen by the core.
///
/// Every method is one independent request; no transaction spans calls.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Resolve a bearer token to its user id.
    async fn user_id_for_token(&self, token: &str) -> Result<Option<String>, DatabaseError>;

    async fn user(&self, user_id: &str) -> Result<Option<User>, DatabaseError>;

    /// Set phase to trial and `trial_start_date` to `started_at`.
    /// Returns false when the user does not exist.
    async fn start_trial(
        &self,
        user_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;

    /// Returns false when the user does not exist.
    async fn set_phase(&self, user_id: &str, phase: Phase) -> Result<bool, DatabaseError>;

    async fn current_vow(&self, user_id: &str) -> Result<Option<Vow>, DatabaseError>;

    async fn current_meaning(&self, user_id: &str)
        -> Result<Option<MeaningStatement>, DatabaseError>;

    /// Overwrite both texts together, or neither.
    async fn save_meaning_and_vow(
        &self,
        user_id: &str,
        meaning_statement: &str,
        vow: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    /// Overwrite the current vow only.
    async fn save_vow(&self, user_id: &str, vow: &str, at: DateTime<Utc>)
        -> Result<(), DatabaseError>;

    /// Check-ins dated within `from..=to`.
    async fn checkins_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CheckIn>, DatabaseError>;

    /// Evidence submitted within `from..to`, oldest first.
    async fn evidences_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Evidence>, DatabaseError>;

    /// Number of evidence rows submitted within `from..to`.
    async fn count_evidences_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32, DatabaseError>;

    async fn commitments(&self, user_id: &str) -> Result<Vec<Commitment>, DatabaseError>;

    /// Batch insert.
    async fn insert_memories(&self, memories: &[Memory]) -> Result<(), DatabaseError>;

    /// Memories not yet expired at `now`, newest first.
    async fn active_memories(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Memory>, DatabaseError>;
}
