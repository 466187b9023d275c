//! Memory extraction from check-in transcripts.
//!
//! The extractor proposes facts; this module turns them into unsaved
//! [`Memory`] rows with clamped confidence, normalized tags, and an
//! expiration computed from the memory type alone.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::ai::MemoryExtractor;
use crate::error::{ConfigError, CoreError, Result};
use crate::models::{Memory, MemoryType};

/// `[memory]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// How long a short-term memory stays in context.
    #[serde(default = "default_short_term_horizon_days")]
    pub short_term_horizon_days: u32,
}

fn default_short_term_horizon_days() -> u32 {
    14
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term_horizon_days: default_short_term_horizon_days(),
        }
    }
}

/// Longest accepted short-term horizon, ten years.
pub const MAX_SHORT_TERM_HORIZON_DAYS: u32 = 3650;

impl MemoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (1..=MAX_SHORT_TERM_HORIZON_DAYS).contains(&self.short_term_horizon_days) {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key: "memory.short_term_horizon_days".into(),
                message: format!(
                    "{} is outside 1..={MAX_SHORT_TERM_HORIZON_DAYS}",
                    self.short_term_horizon_days
                ),
            })
        }
    }

    pub fn horizon(&self) -> Duration {
        // A zero horizon would make short-term memories expire at creation.
        Duration::days(i64::from(self.short_term_horizon_days.max(1)))
    }
}

/// Expiration for a memory created at `now`.
///
/// Milestones never expire; short-term memories expire `horizon` after
/// creation.
///
/// # Errors
/// `Internal` if `now + horizon` is not representable.
pub fn memory_expiration(
    memory_type: MemoryType,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Result<Option<DateTime<Utc>>> {
    match memory_type {
        MemoryType::Milestone => Ok(None),
        MemoryType::ShortTerm => now
            .checked_add_signed(horizon)
            .map(Some)
            .ok_or_else(|| {
                CoreError::Internal(format!("memory expiration overflows: {now} + {horizon}"))
            }),
    }
}

/// Provenance of extracted memories, e.g. `("checkin", checkin_id)`.
#[derive(Debug, Clone, Copy)]
pub struct MemorySource<'a> {
    pub source_type: &'a str,
    pub source_id: &'a str,
}

impl<'a> MemorySource<'a> {
    pub fn checkin(checkin_id: &'a str) -> Self {
        Self {
            source_type: "checkin",
            source_id: checkin_id,
        }
    }
}

fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Extract unsaved memories from a transcript.
///
/// Candidates with blank content are dropped. Persisting the result is the
/// caller's job.
///
/// # Errors
/// - `Validation` if the transcript is blank (no AI call is made)
/// - `Analysis` if the extractor fails or answers with an unusable shape
pub async fn extract_memories(
    extractor: &dyn MemoryExtractor,
    transcript: &str,
    user_id: &str,
    source: MemorySource<'_>,
    config: &MemoryConfig,
    now: DateTime<Utc>,
) -> Result<Vec<Memory>> {
    if transcript.trim().is_empty() {
        return Err(CoreError::empty_field("transcript"));
    }

    let candidates = extractor.extract(transcript).await?;
    let candidate_count = candidates.len();

    let horizon = config.horizon();
    let memories = candidates
        .into_iter()
        .filter(|c| !c.content.trim().is_empty())
        .map(|c| -> Result<Memory> {
            let expires_at = memory_expiration(c.memory_type, now, horizon)?;
            Ok(Memory {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                content: c.content.trim().to_string(),
                memory_type: c.memory_type,
                source_type: source.source_type.to_string(),
                source_id: source.source_id.to_string(),
                tags: normalize_tags(c.tags),
                confidence_score: if c.confidence.is_finite() {
                    c.confidence.clamp(0.0, 1.0)
                } else {
                    0.0
                },
                created_at: now,
                expires_at,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        user_id,
        candidate_count,
        kept = memories.len(),
        "extracted memories"
    );
    Ok(memories)
}
