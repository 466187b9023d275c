use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::Path;
use vowarc_core::stats::{
    compute_small_wins, SmallWinsCounts, SmallWinsMetrics, TierAssessment, TrialWindow,
};
use vowarc_core::report::evidence_range;
use vowarc_core::Config;

use super::open_database;

#[derive(Args)]
pub struct CountsArgs {
    #[arg(long, default_value_t = 0)]
    checkin_count: u32,
    #[arg(long, default_value_t = 0)]
    checkin_total: u32,
    #[arg(long, default_value_t = 0)]
    checkin_streak: u32,
    #[arg(long, default_value_t = 0)]
    if_then_count: u32,
    #[arg(long, default_value_t = 0)]
    if_then_total: u32,
    #[arg(long, default_value_t = 0)]
    evidence_count: u32,
    #[arg(long, default_value_t = 0)]
    evidence_expected: u32,
    #[arg(long, default_value_t = 0)]
    commitment_completed: u32,
    #[arg(long, default_value_t = 0)]
    commitment_total: u32,
}

impl From<CountsArgs> for SmallWinsCounts {
    fn from(a: CountsArgs) -> Self {
        SmallWinsCounts {
            checkin_count: a.checkin_count,
            checkin_total: a.checkin_total,
            checkin_streak: a.checkin_streak,
            if_then_count: a.if_then_count,
            if_then_total: a.if_then_total,
            evidence_count: a.evidence_count,
            evidence_expected: a.evidence_expected,
            commitment_completed: a.commitment_completed,
            commitment_total: a.commitment_total,
        }
    }
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// Compute metrics and tier from raw counts
    SmallWins(CountsArgs),
    /// Compute metrics from a user's stored trial activity (no AI call)
    User {
        /// User id
        user_id: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput {
    metrics: SmallWinsMetrics,
    tier: TierAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    trial_day: Option<u32>,
}

pub fn run(action: StatsAction, db_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    let (metrics, trial_day) = match action {
        StatsAction::SmallWins(args) => (compute_small_wins(&SmallWinsCounts::from(args)), None),
        StatsAction::User { user_id } => {
            let db = open_database(db_path)?;
            let user = db
                .get_user(&user_id)?
                .ok_or_else(|| format!("user not found: {user_id}"))?;

            let now = Utc::now();
            let window = TrialWindow::new(user.trial_start_date, now, config.report.trial_window_days);
            let (checkins, evidence_count) = match &window {
                Some(w) => {
                    let (from, to) = evidence_range(w, now);
                    (
                        db.list_checkins(&user_id, w.start, w.end)?,
                        db.count_evidences(&user_id, from, to)?,
                    )
                }
                None => (Vec::new(), 0),
            };
            let commitments = db.list_commitments(&user_id)?;
            let counts = SmallWinsCounts::from_activity(window, &checkins, evidence_count, &commitments);
            (compute_small_wins(&counts), window.map(|w| w.days_elapsed))
        }
    };

    let output = StatsOutput {
        tier: config.metrics.assess(&metrics),
        metrics,
        trial_day,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
