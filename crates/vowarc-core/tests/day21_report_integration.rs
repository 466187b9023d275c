//! Integration tests for the Day 21 report.
//!
//! Runs the full flow from stored trial activity to the Commitment Report
//! against an in-memory database and scripted AI.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use vowarc_core::ai::fake::ScriptedAi;
use vowarc_core::ai::EvidenceJudgment;
use vowarc_core::{Config, Database, ErrorKind, RecommendedPath, ReportBuilder, Tier};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, day).unwrap()
}

/// Seven days into a trial: 5 check-ins, 3 with the If-Then plan executed,
/// 2 pieces of evidence, and 1 open commitment.
fn seed_week(db: &Database) -> String {
    let user = db.create_user(at(1, 8)).unwrap();
    db.update_trial_start(&user.id, at(1, 9)).unwrap();
    db.upsert_meaning_and_vow(&user.id, "I want to feel strong", "I move every day", at(1, 9))
        .unwrap();

    for (day, executed) in [(1, true), (2, false), (4, true), (5, false), (7, true)] {
        db.record_checkin(&user.id, date(day), "Checked in", Some(executed), at(day, 21))
            .unwrap();
    }
    db.record_evidence(&user.id, "Walked to work", at(2, 9)).unwrap();
    db.record_evidence(&user.id, "Did 20 push-ups", at(5, 18)).unwrap();
    db.add_commitment(&user.id, "Sign up for a class", at(1, 10))
        .unwrap();

    user.id
}

#[tokio::test]
async fn test_first_week_report_is_medium() {
    let db = Database::open_memory().unwrap();
    let user_id = seed_week(&db);

    let ai = ScriptedAi::new().with_judgments(vec![
        EvidenceJudgment {
            index: 1,
            score: 0.6,
            rationale: "Small but real".into(),
        },
        EvidenceJudgment {
            index: 2,
            score: 0.9,
            rationale: "Directly on the vow".into(),
        },
    ]);
    let config = Config::default();

    let report = ReportBuilder::new(&db, &ai, &config)
        .build(&user_id, at(7, 22))
        .await
        .unwrap();

    let m = &report.metrics;
    assert_eq!((m.checkin_count, m.checkin_total), (5, 7));
    assert_eq!((m.if_then_count, m.if_then_total), (3, 7));
    assert!((m.if_then_rate - 3.0 / 7.0).abs() < 1e-9);
    assert_eq!((m.evidence_count, m.evidence_expected), (2, 7));
    assert_eq!((m.commitment_completed, m.commitment_total), (0, 1));
    assert_eq!(m.checkin_streak, 1);
    assert!((m.average_rate - 0.357).abs() < 0.001);

    assert_eq!(report.tier.tier, Tier::Medium);
    assert_eq!(report.recommended_path, RecommendedPath::ReviseVow);
    assert_eq!(report.trial_day, Some(7));
    assert_eq!(report.vow.as_deref(), Some("I move every day"));
    assert_eq!(report.meaning_statement.as_deref(), Some("I want to feel strong"));

    assert_eq!(ai.calls(), 1);
    assert_eq!(report.scores.len(), 2);
    assert_eq!(report.highlights[0].content, "Did 20 push-ups");
    assert!(report.highlights.iter().all(|e| e.is_highlight));
}

#[tokio::test]
async fn test_consistent_trial_is_high() {
    let db = Database::open_memory().unwrap();
    let user = db.create_user(at(1, 8)).unwrap();
    db.update_trial_start(&user.id, at(1, 9)).unwrap();

    for day in 1..=21 {
        db.record_checkin(&user.id, date(day), "Done", Some(true), at(day, 20))
            .unwrap();
        db.record_evidence(&user.id, &format!("Day {day} workout"), at(day, 19))
            .unwrap();
    }
    let c = db.add_commitment(&user.id, "Train daily", at(1, 9)).unwrap();
    db.complete_commitment(&c.id).unwrap();

    let ai = ScriptedAi::new().with_uniform_score(0.8);
    let config = Config::default();
    let report = ReportBuilder::new(&db, &ai, &config)
        .build(&user.id, at(25, 9))
        .await
        .unwrap();

    assert_eq!(report.trial_day, Some(21));
    assert_eq!(report.metrics.checkin_streak, 21);
    assert_eq!(report.metrics.average_rate, 1.0);
    assert_eq!(report.tier.tier, Tier::High);
    assert_eq!(report.recommended_path, RecommendedPath::Continue);
    assert_eq!(report.scores.len(), 21);
    assert_eq!(report.highlights.len(), 3);
    // Equal scores: earliest submissions win.
    assert_eq!(report.highlights[0].content, "Day 1 workout");
}

#[tokio::test]
async fn test_activity_after_window_is_ignored() {
    let db = Database::open_memory().unwrap();
    let user = db.create_user(at(1, 8)).unwrap();
    db.update_trial_start(&user.id, at(1, 9)).unwrap();
    db.record_evidence(&user.id, "Inside", at(3, 9)).unwrap();
    db.record_evidence(&user.id, "After the trial", at(23, 9)).unwrap();
    db.record_checkin(&user.id, date(24), "Late", Some(true), at(24, 9))
        .unwrap();

    let ai = ScriptedAi::new().with_uniform_score(0.5);
    let config = Config::default();
    let report = ReportBuilder::new(&db, &ai, &config)
        .build(&user.id, at(28, 9))
        .await
        .unwrap();

    assert_eq!(report.metrics.evidence_count, 1);
    assert_eq!(report.metrics.checkin_count, 0);
    assert_eq!(report.scores.len(), 1);
}

#[tokio::test]
async fn test_scorer_failure_fails_report() {
    let db = Database::open_memory().unwrap();
    let user_id = seed_week(&db);

    let ai = ScriptedAi::failing();
    let config = Config::default();
    let err = ReportBuilder::new(&db, &ai, &config)
        .build(&user_id, at(7, 22))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Analysis);
}

#[tokio::test]
async fn test_shorter_configured_window() {
    let db = Database::open_memory().unwrap();
    let user_id = seed_week(&db);

    let ai = ScriptedAi::new().with_uniform_score(0.5);
    let mut config = Config::default();
    config.report.trial_window_days = 3;

    let report = ReportBuilder::new(&db, &ai, &config)
        .build(&user_id, at(7, 22) + Duration::days(1))
        .await
        .unwrap();

    assert_eq!(report.trial_day, Some(3));
    assert_eq!(report.metrics.checkin_total, 3);
    assert_eq!(report.metrics.checkin_count, 2);
    assert_eq!(report.metrics.evidence_count, 1);
}
