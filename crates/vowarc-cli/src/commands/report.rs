use chrono::Utc;
use clap::Subcommand;
use std::path::Path;
use vowarc_core::{Config, OpenAiClient, ReportBuilder};

use super::{open_database, runtime};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Build the Day 21 Commitment Report (calls the AI to score evidence)
    Day21 {
        user_id: String,
    },
}

pub fn run(action: ReportAction, db_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ReportAction::Day21 { user_id } => {
            let config = Config::load_or_default();
            let db = open_database(db_path)?;
            let ai = OpenAiClient::new(config.ai.clone())?;

            let report = runtime()?.block_on(async {
                ReportBuilder::new(&db, &ai, &config)
                    .build(&user_id, Utc::now())
                    .await
            })?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
