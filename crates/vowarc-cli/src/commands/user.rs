use chrono::Utc;
use clap::Subcommand;
use serde_json::json;
use std::path::Path;
use vowarc_core::contract::{accept_contract, apply_day21_decision, Day21Decision};

use super::{open_database, runtime};

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user and print its id and bearer token
    Create,
    /// Issue an additional bearer token
    Token {
        user_id: String,
    },
    /// Revoke a bearer token
    RevokeToken {
        token: String,
    },
    /// Show a user with their current vow and meaning statement
    Show {
        user_id: String,
    },
    /// Set the vow and meaning statement directly
    SetVow {
        user_id: String,
        /// Vow text
        #[arg(long)]
        vow: String,
        /// Meaning statement text
        #[arg(long)]
        meaning: String,
    },
    /// Accept the contract and start (or restart) the trial today
    AcceptContract {
        user_id: String,
    },
    /// Record the Day 21 decision
    Decide {
        user_id: String,
        /// continue, revise or exit
        decision: String,
        /// New vow text (required for revise)
        #[arg(long)]
        vow: Option<String>,
    },
}

pub fn run(action: UserAction, db_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(db_path)?;
    let now = Utc::now();

    match action {
        UserAction::Create => {
            let user = db.create_user(now)?;
            let token = db.issue_token(&user.id, now)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "userId": user.id, "token": token }))?
            );
        }
        UserAction::Token { user_id } => {
            if db.get_user(&user_id)?.is_none() {
                return Err(format!("user not found: {user_id}").into());
            }
            println!("{}", db.issue_token(&user_id, now)?);
        }
        UserAction::RevokeToken { token } => {
            if !db.revoke_token(&token)? {
                return Err("unknown token".into());
            }
            println!("ok");
        }
        UserAction::Show { user_id } => {
            let user = db
                .get_user(&user_id)?
                .ok_or_else(|| format!("user not found: {user_id}"))?;
            let vow = db.get_vow(&user_id)?.map(|v| v.content);
            let meaning = db.get_meaning(&user_id)?.map(|m| m.content);
            let out = json!({
                "user": user,
                "vow": vow,
                "meaningStatement": meaning,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        UserAction::SetVow {
            user_id,
            vow,
            meaning,
        } => {
            if vow.trim().is_empty() || meaning.trim().is_empty() {
                return Err("vow and meaning must not be empty".into());
            }
            if db.get_user(&user_id)?.is_none() {
                return Err(format!("user not found: {user_id}").into());
            }
            db.upsert_meaning_and_vow(&user_id, meaning.trim(), vow.trim(), now)?;
            println!("ok");
        }
        UserAction::AcceptContract { user_id } => {
            let accepted = runtime()?.block_on(accept_contract(&db, &user_id, now))?;
            println!("{}", serde_json::to_string_pretty(&accepted)?);
        }
        UserAction::Decide {
            user_id,
            decision,
            vow,
        } => {
            let decision = Day21Decision::parse(&decision, vow.as_deref())?;
            let phase = runtime()?.block_on(apply_day21_decision(&db, &user_id, &decision, now))?;
            println!("phase: {phase}");
        }
    }
    Ok(())
}
