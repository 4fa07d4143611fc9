//! Error Types
//!
//! One enum per layer. The command layer flattens them to strings.

use thiserror::Error;

/// Result of a persistence backend call
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Result of a checklist store operation
pub type ChecklistResult<T> = Result<T, ChecklistError>;

/// Result of a trip directory operation
pub type TripResult<T> = Result<T, TripError>;

/// Result of loading or saving configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures reported by a [`PersistenceService`](crate::repository::PersistenceService)
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no row with id {id} in {table}")]
    NotFound { table: String, id: String },

    #[error("row encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid row: {0}")]
    InvalidRow(String),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failures of [`ChecklistStore`](crate::store::ChecklistStore) operations
#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error("failed to load checklists: {0}")]
    Load(#[source] PersistenceError),

    #[error("member name already exists: {0}")]
    DuplicateName(String),

    #[error("member name must not be empty")]
    EmptyName,

    #[error("no checklist for member {0}")]
    NotFound(String),

    #[error("no member selected")]
    NoSelection,

    #[error("checklist for member {0} has not been saved yet")]
    NotPersisted(String),

    #[error("no option at section {section}, option {option}")]
    IndexOutOfRange { section: usize, option: usize },

    #[error("no checklists loaded")]
    NotLoaded,

    #[error("checklists were loaded for {expected}, not {actual}")]
    OwnerMismatch { expected: String, actual: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Failures of [`TripDirectory`](crate::trips::TripDirectory) operations
#[derive(Debug, Error)]
pub enum TripError {
    #[error("trip title must not be empty")]
    EmptyTitle,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Failures while reading or writing [`AppConfig`](crate::config::AppConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}
