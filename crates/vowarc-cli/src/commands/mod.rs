pub mod activity;
pub mod config;
pub mod memory;
pub mod report;
pub mod stats;
pub mod user;

use std::error::Error;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use vowarc_core::{Config, Database};

/// Open the database at `path`, or the configured default.
pub fn open_database(path: Option<&Path>) -> Result<Database, Box<dyn Error>> {
    let db = match path {
        Some(p) => Database::open_at(p)?,
        None => Database::open_at(&Config::load_or_default().database_path()?)?,
    };
    Ok(db)
}

/// Runtime for the async core operations.
pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn Error>> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Parse `YYYY-MM-DD`, defaulting to today (UTC).
pub fn parse_date(value: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
    match value {
        Some(s) => Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))?),
        None => Ok(Utc::now().date_naive()),
    }
}
