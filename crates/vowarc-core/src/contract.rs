//! Phase transitions: accepting the 21-day contract and the Day 21 decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, Result, ValidationError};
use crate::models::Phase;
use crate::storage::Storage;

fn user_not_found(user_id: &str) -> CoreError {
    ValidationError::NotFound {
        entity: "user".into(),
        id: user_id.to_string(),
    }
    .into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAcceptance {
    pub current_phase: Phase,
    pub trial_start_date: DateTime<Utc>,
}

/// Move the user into the trial phase starting at `now`.
///
/// Accepting again restarts the trial from the new date.
pub async fn accept_contract(
    storage: &dyn Storage,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<ContractAcceptance> {
    if !storage.start_trial(user_id, now).await? {
        return Err(user_not_found(user_id));
    }
    info!(user_id, trial_start = %now, "contract accepted");
    Ok(ContractAcceptance {
        current_phase: Phase::Trial,
        trial_start_date: now,
    })
}

/// The user's choice after reading the Day 21 report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Day21Decision {
    Continue,
    /// Replace the vow with new text and continue.
    Revise { vow: String },
    Exit,
}

impl Day21Decision {
    /// Build from the wire form `{decision, vow?}`.
    pub fn parse(decision: &str, vow: Option<&str>) -> Result<Self> {
        match decision.trim() {
            "continue" => Ok(Day21Decision::Continue),
            "revise" => {
                let vow = vow.map(str::trim).unwrap_or_default();
                if vow.is_empty() {
                    return Err(CoreError::empty_field("vow"));
                }
                Ok(Day21Decision::Revise {
                    vow: vow.to_string(),
                })
            }
            "exit" => Ok(Day21Decision::Exit),
            "" => Err(CoreError::empty_field("decision")),
            other => Err(ValidationError::InvalidValue {
                field: "decision".into(),
                message: format!("expected continue, revise or exit, got '{other}'"),
            }
            .into()),
        }
    }

    pub fn target_phase(&self) -> Phase {
        match self {
            Day21Decision::Continue | Day21Decision::Revise { .. } => Phase::Active,
            Day21Decision::Exit => Phase::Exited,
        }
    }
}

/// Apply the decision and return the user's new phase.
///
/// A revised vow is written before the phase changes.
pub async fn apply_day21_decision(
    storage: &dyn Storage,
    user_id: &str,
    decision: &Day21Decision,
    now: DateTime<Utc>,
) -> Result<Phase> {
    if storage.user(user_id).await?.is_none() {
        return Err(user_not_found(user_id));
    }

    if let Day21Decision::Revise { vow } = decision {
        if vow.trim().is_empty() {
            return Err(CoreError::empty_field("vow"));
        }
        storage.save_vow(user_id, vow.trim(), now).await?;
    }

    let phase = decision.target_phase();
    if !storage.set_phase(user_id, phase).await? {
        return Err(user_not_found(user_id));
    }
    info!(user_id, phase = %phase, "day 21 decision applied");
    Ok(phase)
}
