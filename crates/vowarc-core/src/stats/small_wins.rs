//! Small Wins adherence metrics.
//!
//! Four behavioral rates are tracked over the trial window:
//! - **Check-in rate**: days with a check-in / days elapsed
//! - **If-Then rate**: check-ins where the If-Then plan ran / days elapsed
//! - **Evidence rate**: evidence submitted / evidence expected
//! - **Commitment rate**: commitments completed / commitments made
//!
//! Their arithmetic mean selects a [`Tier`] through a configurable threshold
//! table. Everything here is pure.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ConfigError;
use crate::models::{CheckIn, Commitment};

/// Raw counts over a measurement window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallWinsCounts {
    pub checkin_count: u32,
    pub checkin_total: u32,
    pub checkin_streak: u32,
    pub if_then_count: u32,
    pub if_then_total: u32,
    pub evidence_count: u32,
    pub evidence_expected: u32,
    pub commitment_completed: u32,
    pub commitment_total: u32,
}

/// Rates derived from [`SmallWinsCounts`]. Every rate is in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallWinsMetrics {
    pub checkin_rate: f64,
    pub checkin_count: u32,
    pub checkin_total: u32,
    pub checkin_streak: u32,
    pub if_then_count: u32,
    pub if_then_total: u32,
    pub if_then_rate: f64,
    pub evidence_count: u32,
    pub evidence_rate: f64,
    pub evidence_expected: u32,
    pub commitment_completed: u32,
    pub commitment_total: u32,
    pub commitment_rate: f64,
    pub average_rate: f64,
}

/// `count / total`, 0 when `total` is 0, clamped to 1 when `count > total`.
///
/// Late or duplicate submissions can push a count past its expectation; that
/// reads as full adherence rather than a data error.
pub fn rate(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(count) / f64::from(total)).clamp(0.0, 1.0)
}

/// Arithmetic mean of the four component rates.
pub fn average_rate(rates: [f64; 4]) -> f64 {
    rates.iter().sum::<f64>() / rates.len() as f64
}

/// Compute the Small Wins metrics for a set of raw counts.
pub fn compute_small_wins(counts: &SmallWinsCounts) -> SmallWinsMetrics {
    let checkin_rate = rate(counts.checkin_count, counts.checkin_total);
    let if_then_rate = rate(counts.if_then_count, counts.if_then_total);
    let evidence_rate = rate(counts.evidence_count, counts.evidence_expected);
    let commitment_rate = rate(counts.commitment_completed, counts.commitment_total);

    SmallWinsMetrics {
        checkin_rate,
        checkin_count: counts.checkin_count,
        checkin_total: counts.checkin_total,
        checkin_streak: counts.checkin_streak,
        if_then_count: counts.if_then_count,
        if_then_total: counts.if_then_total,
        if_then_rate,
        evidence_count: counts.evidence_count,
        evidence_rate,
        evidence_expected: counts.evidence_expected,
        commitment_completed: counts.commitment_completed,
        commitment_total: counts.commitment_total,
        commitment_rate,
        average_rate: average_rate([checkin_rate, if_then_rate, evidence_rate, commitment_rate]),
    }
}

/// Discrete adherence level, ordered low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    Medium,
    High,
}

/// Display copy attached to a tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCopy {
    pub label: String,
    pub message: String,
}

/// Tier cutoffs and copy, loaded from the `[metrics]` config section.
///
/// `average < low_below` is Low, `average < medium_below` is Medium,
/// anything else is High.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_low_below")]
    pub low_below: f64,
    #[serde(default = "default_medium_below")]
    pub medium_below: f64,
    #[serde(default = "default_low_copy")]
    pub low: TierCopy,
    #[serde(default = "default_medium_copy")]
    pub medium: TierCopy,
    #[serde(default = "default_high_copy")]
    pub high: TierCopy,
}

fn default_low_below() -> f64 {
    0.3
}
fn default_medium_below() -> f64 {
    0.6
}
fn default_low_copy() -> TierCopy {
    TierCopy {
        label: "Finding your footing".into(),
        message: "The habit has not taken hold yet. Smaller, clearer steps may help.".into(),
    }
}
fn default_medium_copy() -> TierCopy {
    TierCopy {
        label: "Building momentum".into(),
        message: "You are showing up more often than not. Adjust what is not working.".into(),
    }
}
fn default_high_copy() -> TierCopy {
    TierCopy {
        label: "Living the vow".into(),
        message: "Your actions match your words. Keep the rhythm going.".into(),
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            low_below: default_low_below(),
            medium_below: default_medium_below(),
            low: default_low_copy(),
            medium: default_medium_copy(),
            high: default_high_copy(),
        }
    }
}

/// Tier plus the copy shown with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAssessment {
    pub tier: Tier,
    pub average_rate: f64,
    pub label: String,
    pub message: String,
}

impl MetricsConfig {
    /// Thresholds must satisfy `0 <= low_below <= medium_below <= 1`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = (0.0..=1.0).contains(&self.low_below)
            && (0.0..=1.0).contains(&self.medium_below)
            && self.low_below <= self.medium_below;
        if ordered {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key: "metrics".to_string(),
                message: format!(
                    "thresholds must satisfy 0 <= low_below ({}) <= medium_below ({}) <= 1",
                    self.low_below, self.medium_below
                ),
            })
        }
    }

    pub fn tier_for(&self, average_rate: f64) -> Tier {
        if average_rate < self.low_below {
            Tier::Low
        } else if average_rate < self.medium_below {
            Tier::Medium
        } else {
            Tier::High
        }
    }

    pub fn copy_for(&self, tier: Tier) -> &TierCopy {
        match tier {
            Tier::Low => &self.low,
            Tier::Medium => &self.medium,
            Tier::High => &self.high,
        }
    }

    pub fn assess(&self, metrics: &SmallWinsMetrics) -> TierAssessment {
        let tier = self.tier_for(metrics.average_rate);
        let copy = self.copy_for(tier);
        TierAssessment {
            tier,
            average_rate: metrics.average_rate,
            label: copy.label.clone(),
            message: copy.message.clone(),
        }
    }
}

/// The slice of calendar the trial is measured over, in UTC dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialWindow {
    pub start: NaiveDate,
    /// Last day counted, inclusive. Never after "today".
    pub end: NaiveDate,
    /// 1-based day of the trial, capped at the window length.
    pub days_elapsed: u32,
}

impl TrialWindow {
    /// `None` when the trial has not started yet.
    pub fn new(
        trial_start: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        window_days: u32,
    ) -> Option<Self> {
        let start = trial_start?.date_naive();
        let today = now.date_naive();
        if start > today || window_days == 0 {
            return None;
        }

        let elapsed = (today - start).num_days() + 1;
        let days_elapsed = elapsed.min(i64::from(window_days)) as u32;
        let end = start + Duration::days(i64::from(days_elapsed) - 1);

        Some(Self {
            start,
            end,
            days_elapsed,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Consecutive check-in days ending at `today`, or at yesterday when today
/// has no check-in yet.
pub fn checkin_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(d) => d,
            None => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(d) => cursor = d,
            None => break,
        }
    }
    streak
}

impl SmallWinsCounts {
    /// Derive raw counts from stored activity.
    ///
    /// Check-ins outside the window are ignored. `evidence_count` must already
    /// be restricted to the window by the caller.
    pub fn from_activity(
        window: Option<TrialWindow>,
        checkins: &[CheckIn],
        evidence_count: u32,
        commitments: &[Commitment],
    ) -> Self {
        let commitment_total = commitments.len() as u32;
        let commitment_completed = commitments.iter().filter(|c| c.completed).count() as u32;

        let Some(window) = window else {
            return Self {
                commitment_completed,
                commitment_total,
                ..Self::default()
            };
        };

        let in_window: Vec<&CheckIn> = checkins
            .iter()
            .filter(|c| window.contains(c.date))
            .collect();
        let days: BTreeSet<NaiveDate> = in_window.iter().map(|c| c.date).collect();

        // One check-in per day, so count days rather than rows.
        let if_then_days: BTreeSet<NaiveDate> = in_window
            .iter()
            .filter(|c| c.if_then_executed == Some(true))
            .map(|c| c.date)
            .collect();

        Self {
            checkin_count: days.len() as u32,
            checkin_total: window.days_elapsed,
            checkin_streak: checkin_streak(&days, window.end),
            if_then_count: if_then_days.len() as u32,
            if_then_total: window.days_elapsed,
            evidence_count,
            evidence_expected: window.days_elapsed,
            commitment_completed,
            commitment_total,
        }
    }
}
