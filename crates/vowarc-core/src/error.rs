//! Core error types for vowarc-core.
//!
//! Every operation surfaces exactly one terminal outcome: a value or a single
//! [`CoreError`]. The top-level variants map one-to-one onto the failure
//! classes callers act on (fix the input, re-authenticate, retry the AI call,
//! retry the write, or give up).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vowarc-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or malformed input. User-correctable.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Missing, malformed, or rejected bearer token.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The AI capability failed or returned unusable output.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// The storage collaborator failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure class, used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Analysis,
    Persistence,
    Internal,
}

impl ErrorKind {
    /// Stable identifier sent to clients in the `error` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_failure",
            ErrorKind::Auth => "auth_failure",
            ErrorKind::Analysis => "analysis_failure",
            ErrorKind::Persistence => "persistence_failure",
            ErrorKind::Internal => "internal_failure",
        }
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Auth(_) => ErrorKind::Auth,
            CoreError::Analysis(_) => ErrorKind::Analysis,
            CoreError::Persistence(_) => ErrorKind::Persistence,
            CoreError::Config(_) | CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message that is safe to show an end user.
    ///
    /// Validation and auth failures are specific; everything else is generic
    /// and the detail stays in the operator logs.
    pub fn public_message(&self) -> String {
        match self {
            CoreError::Validation(e) => e.to_string(),
            CoreError::Auth(e) => e.to_string(),
            CoreError::Analysis(_) => {
                "The analysis could not be completed. Please try again later.".to_string()
            }
            CoreError::Persistence(_) => {
                "Your data could not be saved. Please try again later.".to_string()
            }
            CoreError::Config(_) | CoreError::Internal(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }

    pub fn empty_field(field: &str) -> Self {
        CoreError::Validation(ValidationError::EmptyField(field.to_string()))
    }
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Required field missing or blank
    #[error("'{0}' is required and must not be empty")]
    EmptyField(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
}

/// Bearer token errors.
#[derive(Error, Debug, PartialEq)]
pub enum AuthError {
    #[error("Missing authorization token")]
    MissingToken,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Failures of the AI capability.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("AI service unreachable: {0}")]
    Unreachable(String),

    /// The service answered with a non-success status
    #[error("AI service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The service answered but the payload cannot be used
    #[error("Malformed AI output: {0}")]
    Malformed(String),

    /// API key environment variable is not set
    #[error("AI credentials not configured (set {env_var})")]
    CredentialsNotConfigured { env_var: String },
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AnalysisError::Malformed(err.to_string())
        } else {
            AnalysisError::Unreachable(err.to_string())
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Stored value could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(CoreError::empty_field("why").kind(), ErrorKind::Validation);
        assert_eq!(CoreError::from(AuthError::MissingToken).kind(), ErrorKind::Auth);
        assert_eq!(
            CoreError::from(AnalysisError::Malformed("x".into())).kind(),
            ErrorKind::Analysis
        );
        assert_eq!(CoreError::from(DatabaseError::Locked).kind(), ErrorKind::Persistence);
        assert_eq!(CoreError::Internal("boom".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn public_message_hides_internal_detail() {
        let err = CoreError::from(DatabaseError::QueryFailed("no such table: vows".into()));
        assert!(!err.public_message().contains("vows"));

        let err = CoreError::from(AnalysisError::Status {
            status: 500,
            message: "upstream stack trace".into(),
        });
        assert!(!err.public_message().contains("stack trace"));

        let err = CoreError::Internal("secret".into());
        assert!(!err.public_message().contains("secret"));
    }

    #[test]
    fn public_message_is_specific_for_user_errors() {
        let err = CoreError::empty_field("transcript");
        assert!(err.public_message().contains("transcript"));

        let err = CoreError::from(AuthError::InvalidToken);
        assert_eq!(err.public_message(), "Invalid or expired token");
    }
}
