//! SQLite-backed storage collaborator.
//!
//! Provides persistent storage for:
//! - Users, their phase, and hashed bearer tokens
//! - Check-ins, evidence, and commitments
//! - Extracted memories
//! - The current vow and meaning statement per user
//!
//! The connection sits behind a `std::sync::Mutex` that is held for one
//! statement batch at a time and never across an `.await`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{migrations, Storage};
use crate::error::DatabaseError;
use crate::models::{
    CheckIn, Commitment, Evidence, MeaningStatement, Memory, MemoryType, Phase, User, Vow,
};

// === Helper Functions ===

/// Fixed-width UTC timestamps so text comparison orders correctly.
fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(table: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(table, format!("bad timestamp '{value}': {e}")))
}

fn parse_date(table: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| corrupt(table, format!("bad date '{value}': {e}")))
}

fn corrupt(table: &str, message: String) -> DatabaseError {
    DatabaseError::CorruptRow {
        table: table.to_string(),
        message,
    }
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// Rows are read as raw text first and decoded afterwards so decoding errors
// surface as `CorruptRow` instead of a generic rusqlite error.

struct RawUser {
    id: String,
    current_phase: String,
    trial_start_date: Option<String>,
    created_at: String,
}

impl RawUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            current_phase: row.get(1)?,
            trial_start_date: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn decode(self) -> Result<User, DatabaseError> {
        Ok(User {
            current_phase: self
                .current_phase
                .parse::<Phase>()
                .map_err(|e| corrupt("users", e.to_string()))?,
            trial_start_date: self
                .trial_start_date
                .as_deref()
                .map(|s| parse_ts("users", s))
                .transpose()?,
            created_at: parse_ts("users", &self.created_at)?,
            id: self.id,
        })
    }
}

struct RawCheckIn {
    id: String,
    user_id: String,
    date: String,
    transcript: String,
    if_then_executed: Option<bool>,
    mirror_feedback: Option<String>,
    created_at: String,
}

impl RawCheckIn {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            transcript: row.get(3)?,
            if_then_executed: row.get(4)?,
            mirror_feedback: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn decode(self) -> Result<CheckIn, DatabaseError> {
        Ok(CheckIn {
            date: parse_date("checkins", &self.date)?,
            created_at: parse_ts("checkins", &self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            transcript: self.transcript,
            if_then_executed: self.if_then_executed,
            mirror_feedback: self.mirror_feedback,
        })
    }
}

struct RawMemory {
    id: String,
    user_id: String,
    content: String,
    memory_type: String,
    source_type: String,
    source_id: String,
    tags: String,
    confidence_score: f64,
    created_at: String,
    expires_at: Option<String>,
}

impl RawMemory {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            content: row.get(2)?,
            memory_type: row.get(3)?,
            source_type: row.get(4)?,
            source_id: row.get(5)?,
            tags: row.get(6)?,
            confidence_score: row.get(7)?,
            created_at: row.get(8)?,
            expires_at: row.get(9)?,
        })
    }

    fn decode(self) -> Result<Memory, DatabaseError> {
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags)
            .map_err(|e| corrupt("memories", format!("bad tags: {e}")))?;
        Ok(Memory {
            memory_type: self
                .memory_type
                .parse::<MemoryType>()
                .map_err(|e| corrupt("memories", e.to_string()))?,
            created_at: parse_ts("memories", &self.created_at)?,
            expires_at: self
                .expires_at
                .as_deref()
                .map(|s| parse_ts("memories", s))
                .transpose()?,
            id: self.id,
            user_id: self.user_id,
            content: self.content,
            source_type: self.source_type,
            source_id: self.source_id,
            tags,
            confidence_score: self.confidence_score,
        })
    }
}

/// SQLite database for VowArc rows.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave SQLite itself inconsistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // === Users and tokens ===

    pub fn create_user(&self, now: DateTime<Utc>) -> Result<User, DatabaseError> {
        let user = User {
            id: new_id(),
            current_phase: Phase::Onboarding,
            trial_start_date: None,
            created_at: now,
        };
        self.conn().execute(
            "INSERT INTO users (id, current_phase, trial_start_date, created_at)
             VALUES (?1, ?2, NULL, ?3)",
            params![user.id, user.current_phase.as_str(), format_ts(now)],
        )?;
        Ok(user)
    }

    /// Issue a new bearer token for `user_id`. Only its hash is stored.
    pub fn issue_token(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, DatabaseError> {
        let token = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        self.conn().execute(
            "INSERT INTO auth_tokens (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![hash_token(&token), user_id, format_ts(now)],
        )?;
        Ok(token)
    }

    pub fn revoke_token(&self, token: &str) -> Result<bool, DatabaseError> {
        let n = self.conn().execute(
            "DELETE FROM auth_tokens WHERE token_hash = ?1",
            params![hash_token(token)],
        )?;
        Ok(n > 0)
    }

    pub fn find_user_id_by_token(&self, token: &str) -> Result<Option<String>, DatabaseError> {
        let id = self
            .conn()
            .query_row(
                "SELECT user_id FROM auth_tokens WHERE token_hash = ?1",
                params![hash_token(token)],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        let raw = self
            .conn()
            .query_row(
                "SELECT id, current_phase, trial_start_date, created_at FROM users WHERE id = ?1",
                params![user_id],
                RawUser::from_row,
            )
            .optional()?;
        raw.map(RawUser::decode).transpose()
    }

    pub fn update_trial_start(
        &self,
        user_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn().execute(
            "UPDATE users SET current_phase = ?2, trial_start_date = ?3 WHERE id = ?1",
            params![user_id, Phase::Trial.as_str(), format_ts(started_at)],
        )?;
        Ok(n > 0)
    }

    pub fn update_phase(&self, user_id: &str, phase: Phase) -> Result<bool, DatabaseError> {
        let n = self.conn().execute(
            "UPDATE users SET current_phase = ?2 WHERE id = ?1",
            params![user_id, phase.as_str()],
        )?;
        Ok(n > 0)
    }

    // === Vow and meaning statement ===

    pub fn get_vow(&self, user_id: &str) -> Result<Option<Vow>, DatabaseError> {
        let row = self
            .conn()
            .query_row(
                "SELECT content, updated_at FROM vows WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(content, updated_at)| {
            Ok(Vow {
                user_id: user_id.to_string(),
                content,
                updated_at: parse_ts("vows", &updated_at)?,
            })
        })
        .transpose()
    }

    pub fn get_meaning(&self, user_id: &str) -> Result<Option<MeaningStatement>, DatabaseError> {
        let row = self
            .conn()
            .query_row(
                "SELECT content, updated_at FROM meaning_statements WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(content, updated_at)| {
            Ok(MeaningStatement {
                user_id: user_id.to_string(),
                content,
                updated_at: parse_ts("meaning_statements", &updated_at)?,
            })
        })
        .transpose()
    }

    pub fn upsert_vow(
        &self,
        user_id: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn().execute(
            "INSERT INTO vows (user_id, content, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            params![user_id, content, format_ts(at)],
        )?;
        Ok(())
    }

    pub fn upsert_meaning_and_vow(
        &self,
        user_id: &str,
        meaning_statement: &str,
        vow: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO meaning_statements (user_id, content, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            params![user_id, meaning_statement, format_ts(at)],
        )?;
        tx.execute(
            "INSERT INTO vows (user_id, content, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            params![user_id, vow, format_ts(at)],
        )?;
        tx.commit()?;
        Ok(())
    }

    // === Activity ===

    /// Record the check-in for `date`, replacing an earlier one on the same day.
    pub fn record_checkin(
        &self,
        user_id: &str,
        date: NaiveDate,
        transcript: &str,
        if_then_executed: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<CheckIn, DatabaseError> {
        let id = new_id();
        let date_str = date.format("%Y-%m-%d").to_string();
        self.conn().execute(
            "INSERT INTO checkins (id, user_id, date, transcript, if_then_executed, mirror_feedback, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
             ON CONFLICT(user_id, date) DO UPDATE SET
                transcript = excluded.transcript,
                if_then_executed = excluded.if_then_executed",
            params![id, user_id, date_str, transcript, if_then_executed, format_ts(now)],
        )?;

        let raw = self.conn().query_row(
            "SELECT id, user_id, date, transcript, if_then_executed, mirror_feedback, created_at
             FROM checkins WHERE user_id = ?1 AND date = ?2",
            params![user_id, date_str],
            RawCheckIn::from_row,
        )?;
        raw.decode()
    }

    pub fn list_checkins(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CheckIn>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, date, transcript, if_then_executed, mirror_feedback, created_at
             FROM checkins
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let rows = stmt.query_map(
            params![
                user_id,
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string()
            ],
            RawCheckIn::from_row,
        )?;

        let mut checkins = Vec::new();
        for row in rows {
            checkins.push(row?.decode()?);
        }
        Ok(checkins)
    }

    pub fn record_evidence(
        &self,
        user_id: &str,
        content: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<Evidence, DatabaseError> {
        let evidence = Evidence::new(content, submitted_at);
        self.conn().execute(
            "INSERT INTO evidences (id, user_id, content, submitted_at) VALUES (?1, ?2, ?3, ?4)",
            params![evidence.id, user_id, evidence.content, format_ts(submitted_at)],
        )?;
        Ok(evidence)
    }

    pub fn list_evidences(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Evidence>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, content, submitted_at FROM evidences
             WHERE user_id = ?1 AND submitted_at >= ?2 AND submitted_at < ?3
             ORDER BY submitted_at, id",
        )?;
        let rows = stmt.query_map(params![user_id, format_ts(from), format_ts(to)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut evidences = Vec::new();
        for row in rows {
            let (id, content, submitted_at) = row?;
            evidences.push(Evidence {
                id,
                content,
                submitted_at: parse_ts("evidences", &submitted_at)?,
                score: None,
                rationale: None,
                is_highlight: false,
            });
        }
        Ok(evidences)
    }

    pub fn count_evidences(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32, DatabaseError> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM evidences
             WHERE user_id = ?1 AND submitted_at >= ?2 AND submitted_at < ?3",
            params![user_id, format_ts(from), format_ts(to)],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    pub fn add_commitment(
        &self,
        user_id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Commitment, DatabaseError> {
        let commitment = Commitment {
            id: new_id(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            completed: false,
            created_at: now,
        };
        self.conn().execute(
            "INSERT INTO commitments (id, user_id, content, completed, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![commitment.id, user_id, content, format_ts(now)],
        )?;
        Ok(commitment)
    }

    pub fn complete_commitment(&self, commitment_id: &str) -> Result<bool, DatabaseError> {
        let n = self.conn().execute(
            "UPDATE commitments SET completed = 1 WHERE id = ?1",
            params![commitment_id],
        )?;
        Ok(n > 0)
    }

    pub fn list_commitments(&self, user_id: &str) -> Result<Vec<Commitment>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, content, completed, created_at FROM commitments
             WHERE user_id = ?1 ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut commitments = Vec::new();
        for row in rows {
            let (id, user_id, content, completed, created_at) = row?;
            commitments.push(Commitment {
                id,
                user_id,
                content,
                completed,
                created_at: parse_ts("commitments", &created_at)?,
            });
        }
        Ok(commitments)
    }

    // === Memories ===

    pub fn insert_memory_batch(&self, memories: &[Memory]) -> Result<(), DatabaseError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO memories
                    (id, user_id, content, memory_type, source_type, source_id, tags,
                     confidence_score, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for m in memories {
                let tags = serde_json::to_string(&m.tags)
                    .map_err(|e| DatabaseError::QueryFailed(format!("encode tags: {e}")))?;
                stmt.execute(params![
                    m.id,
                    m.user_id,
                    m.content,
                    m.memory_type.as_str(),
                    m.source_type,
                    m.source_id,
                    tags,
                    m.confidence_score,
                    format_ts(m.created_at),
                    m.expires_at.map(format_ts),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_active_memories(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Memory>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, content, memory_type, source_type, source_id, tags,
                    confidence_score, created_at, expires_at
             FROM memories
             WHERE user_id = ?1 AND (expires_at IS NULL OR expires_at > ?2)
             ORDER BY created_at DESC, id",
        )?;
        let rows = stmt.query_map(params![user_id, format_ts(now)], RawMemory::from_row)?;

        let mut memories = Vec::new();
        for row in rows {
            memories.push(row?.decode()?);
        }
        Ok(memories)
    }
}

#[async_trait]
impl Storage for Database {
    async fn user_id_for_token(&self, token: &str) -> Result<Option<String>, DatabaseError> {
        self.find_user_id_by_token(token)
    }

    async fn user(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        self.get_user(user_id)
    }

    async fn start_trial(
        &self,
        user_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        self.update_trial_start(user_id, started_at)
    }

    async fn set_phase(&self, user_id: &str, phase: Phase) -> Result<bool, DatabaseError> {
        self.update_phase(user_id, phase)
    }

    async fn current_vow(&self, user_id: &str) -> Result<Option<Vow>, DatabaseError> {
        self.get_vow(user_id)
    }

    async fn current_meaning(
        &self,
        user_id: &str,
    ) -> Result<Option<MeaningStatement>, DatabaseError> {
        self.get_meaning(user_id)
    }

    async fn save_meaning_and_vow(
        &self,
        user_id: &str,
        meaning_statement: &str,
        vow: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.upsert_meaning_and_vow(user_id, meaning_statement, vow, at)
    }

    async fn save_vow(
        &self,
        user_id: &str,
        vow: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.upsert_vow(user_id, vow, at)
    }

    async fn checkins_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CheckIn>, DatabaseError> {
        self.list_checkins(user_id, from, to)
    }

    async fn evidences_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Evidence>, DatabaseError> {
        self.list_evidences(user_id, from, to)
    }

    async fn count_evidences_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32, DatabaseError> {
        self.count_evidences(user_id, from, to)
    }

    async fn commitments(&self, user_id: &str) -> Result<Vec<Commitment>, DatabaseError> {
        self.list_commitments(user_id)
    }

    async fn insert_memories(&self, memories: &[Memory]) -> Result<(), DatabaseError> {
        self.insert_memory_batch(memories)
    }

    async fn active_memories(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Memory>, DatabaseError> {
        self.list_active_memories(user_id, now)
    }
}
