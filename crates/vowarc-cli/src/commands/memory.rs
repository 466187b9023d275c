use chrono::Utc;
use clap::Subcommand;
use std::path::Path;

use super::open_database;

#[derive(Subcommand)]
pub enum MemoryAction {
    /// List memories that have not expired
    List {
        user_id: String,
    },
}

pub fn run(action: MemoryAction, db_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(db_path)?;

    match action {
        MemoryAction::List { user_id } => {
            let memories = db.list_active_memories(&user_id, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&memories)?);
        }
    }
    Ok(())
}
