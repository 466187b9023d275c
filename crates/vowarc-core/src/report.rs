//! Day 21 Commitment Report.
//!
//! Pulls the user's trial activity from storage, computes Small Wins metrics
//! and scores the evidence log in two concurrent branches, then attaches an
//! advisory recommended path. Reports are built on demand and never stored.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::EvidenceJudge;
use crate::error::{CoreError, Result, ValidationError};
use crate::evidence::{EvidenceScore, EvidenceScorer};
use crate::models::Evidence;
use crate::stats::{
    compute_small_wins, SmallWinsCounts, SmallWinsMetrics, Tier, TierAssessment, TrialWindow,
};
use crate::storage::{Config, Storage};

/// `[report]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_trial_window_days")]
    pub trial_window_days: u32,
}

fn default_trial_window_days() -> u32 {
    21
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            trial_window_days: default_trial_window_days(),
        }
    }
}

/// Suggested next step after the trial. The user makes the actual decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedPath {
    Continue,
    ReviseVow,
    Exit,
}

impl RecommendedPath {
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::High => RecommendedPath::Continue,
            Tier::Medium => RecommendedPath::ReviseVow,
            Tier::Low => RecommendedPath::Exit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentReport {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    /// 1-based trial day, `None` before the contract is accepted.
    pub trial_day: Option<u32>,
    pub metrics: SmallWinsMetrics,
    pub tier: TierAssessment,
    pub scores: Vec<EvidenceScore>,
    pub highlights: Vec<Evidence>,
    pub vow: Option<String>,
    pub meaning_statement: Option<String>,
    pub recommended_path: RecommendedPath,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Submission-time range `[from, to)` covered by `window`, never past `now`.
pub fn evidence_range(window: &TrialWindow, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start_of_day(window.start);
    let to = start_of_day(window.end) + Duration::days(1);
    (from, to.min(now))
}

pub struct ReportBuilder<'a> {
    storage: &'a dyn Storage,
    judge: &'a dyn EvidenceJudge,
    config: &'a Config,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(storage: &'a dyn Storage, judge: &'a dyn EvidenceJudge, config: &'a Config) -> Self {
        Self {
            storage,
            judge,
            config,
        }
    }

    /// Build the report for `user_id` as of `now`.
    ///
    /// # Errors
    /// - `Validation` if the user does not exist
    /// - `Persistence` if any read fails
    /// - `Analysis` if evidence scoring fails; no partial report is returned
    pub async fn build(&self, user_id: &str, now: DateTime<Utc>) -> Result<CommitmentReport> {
        let user = self.storage.user(user_id).await?.ok_or_else(|| {
            CoreError::from(ValidationError::NotFound {
                entity: "user".into(),
                id: user_id.to_string(),
            })
        })?;

        let (vow, meaning) = tokio::try_join!(
            self.storage.current_vow(user_id),
            self.storage.current_meaning(user_id),
        )?;
        let vow = vow.map(|v| v.content);
        let meaning = meaning.map(|m| m.content);

        let window = TrialWindow::new(
            user.trial_start_date,
            now,
            self.config.report.trial_window_days,
        );
        if window.is_none() {
            debug!(user_id, "trial not started; report covers commitments only");
        }

        let metrics_branch = async {
            let (checkins, evidence_count) = match &window {
                Some(w) => {
                    let (from, to) = evidence_range(w, now);
                    tokio::try_join!(
                        self.storage.checkins_between(user_id, w.start, w.end),
                        self.storage.count_evidences_between(user_id, from, to),
                    )?
                }
                None => (Vec::new(), 0),
            };
            let commitments = self.storage.commitments(user_id).await?;
            let counts =
                SmallWinsCounts::from_activity(window, &checkins, evidence_count, &commitments);
            Ok::<_, CoreError>(compute_small_wins(&counts))
        };

        let scoring_branch = async {
            let evidences = match &window {
                Some(w) => {
                    let (from, to) = evidence_range(w, now);
                    self.storage.evidences_between(user_id, from, to).await?
                }
                None => Vec::new(),
            };
            let scorer = EvidenceScorer::new(self.judge, &self.config.evidence);
            scorer
                .score(&evidences, vow.as_deref(), meaning.as_deref())
                .await
        };

        let (metrics, scored) = tokio::try_join!(metrics_branch, scoring_branch).map_err(|e| {
            warn!(user_id, error = %e, "day 21 report failed");
            e
        })?;

        let tier = self.config.metrics.assess(&metrics);
        let recommended_path = RecommendedPath::for_tier(tier.tier);

        info!(
            user_id,
            tier = ?tier.tier,
            average_rate = metrics.average_rate,
            highlights = scored.highlights.len(),
            "built day 21 report"
        );

        Ok(CommitmentReport {
            user_id: user.id,
            generated_at: now,
            trial_day: window.map(|w| w.days_elapsed),
            metrics,
            tier,
            scores: scored.scores,
            highlights: scored.highlights,
            vow,
            meaning_statement: meaning,
            recommended_path,
        })
    }
}
