use chrono::Utc;
use clap::Subcommand;
use std::path::Path;

use super::{open_database, parse_date};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Record (or replace) the check-in for a day
    Checkin {
        user_id: String,
        /// Check-in transcript
        transcript: String,
        /// Day of the check-in, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Whether the If-Then plan was executed
        #[arg(long)]
        if_then: Option<bool>,
    },
    /// Submit a piece of evidence
    Evidence {
        user_id: String,
        content: String,
    },
    /// Add a commitment
    Commit {
        user_id: String,
        content: String,
    },
    /// Mark a commitment as completed
    Complete {
        commitment_id: String,
    },
    /// List commitments for a user
    Commitments {
        user_id: String,
    },
}

pub fn run(action: ActivityAction, db_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(db_path)?;
    let now = Utc::now();

    match action {
        ActivityAction::Checkin {
            user_id,
            transcript,
            date,
            if_then,
        } => {
            if transcript.trim().is_empty() {
                return Err("transcript must not be empty".into());
            }
            let date = parse_date(date.as_deref())?;
            let checkin = db.record_checkin(&user_id, date, transcript.trim(), if_then, now)?;
            println!("{}", serde_json::to_string_pretty(&checkin)?);
        }
        ActivityAction::Evidence { user_id, content } => {
            if content.trim().is_empty() {
                return Err("evidence content must not be empty".into());
            }
            let evidence = db.record_evidence(&user_id, content.trim(), now)?;
            println!("{}", serde_json::to_string_pretty(&evidence)?);
        }
        ActivityAction::Commit { user_id, content } => {
            let commitment = db.add_commitment(&user_id, content.trim(), now)?;
            println!("{}", serde_json::to_string_pretty(&commitment)?);
        }
        ActivityAction::Complete { commitment_id } => {
            if !db.complete_commitment(&commitment_id)? {
                return Err(format!("commitment not found: {commitment_id}").into());
            }
            println!("ok");
        }
        ActivityAction::Commitments { user_id } => {
            let list = db.list_commitments(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
    }
    Ok(())
}
