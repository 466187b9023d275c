//! Row types shared by storage, the AI adapters, and the HTTP surface.
//!
//! Field names serialize in camelCase for the client; the SQLite layer maps
//! them to snake_case columns itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Where a user is in the three-month arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Onboarding,
    Trial,
    Active,
    Completed,
    Exited,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Onboarding => "onboarding",
            Phase::Trial => "trial",
            Phase::Active => "active",
            Phase::Completed => "completed",
            Phase::Exited => "exited",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onboarding" => Ok(Phase::Onboarding),
            "trial" => Ok(Phase::Trial),
            "active" => Ok(Phase::Active),
            "completed" => Ok(Phase::Completed),
            "exited" => Ok(Phase::Exited),
            other => Err(ValidationError::InvalidValue {
                field: "current_phase".to_string(),
                message: format!("unknown phase '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub current_phase: Phase,
    pub trial_start_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One daily check-in. At most one per user per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub transcript: String,
    /// Whether the user ran their If-Then plan that day. `None` when not asked.
    pub if_then_executed: Option<bool>,
    pub mirror_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user-submitted claim of progress toward the vow.
///
/// `score`, `rationale` and `is_highlight` are filled in transiently by the
/// evidence scorer; callers decide whether to persist them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    #[serde(default)]
    pub id: String,
    pub content: String,
    #[serde(alias = "submitted_at", alias = "createdAt", alias = "created_at")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default)]
    pub is_highlight: bool,
}

impl Evidence {
    pub fn new(content: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            submitted_at,
            score: None,
            rationale: None,
            is_highlight: false,
        }
    }
}

/// A concrete promise tracked for the commitment completion rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    ShortTerm,
    Milestone,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::ShortTerm => "short_term",
            MemoryType::Milestone => "milestone",
        }
    }
}

impl FromStr for MemoryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_term" => Ok(MemoryType::ShortTerm),
            "milestone" => Ok(MemoryType::Milestone),
            other => Err(ValidationError::InvalidValue {
                field: "memory_type".to_string(),
                message: format!("unknown memory type '{other}'"),
            }),
        }
    }
}

/// A fact about the user derived from a check-in.
///
/// Never mutated after creation. Expired rows are filtered at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub memory_type: MemoryType,
    pub source_type: String,
    pub source_id: String,
    pub tags: BTreeSet<String>,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Memory {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// The current vow text. One per user; updates overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vow {
    pub user_id: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// The current meaning statement. One per user; updates overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeaningStatement {
    pub user_id: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}
