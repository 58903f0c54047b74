//! Error types for usergate-store

use thiserror::Error;
use usergate_core::{ConfigError, ValidationError};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Store unreachable, credentials rejected, or the pool gave up
    #[error("connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Malformed statement, constraint violation, or undecodable row
    #[error("query error: {0}")]
    Query(#[source] sqlx::Error),

    #[error("not found: {resource} '{key}'")]
    NotFound { resource: &'static str, key: String },

    /// Batch input rejected before any round trip
    #[error("invalid input at index {index}: {source}")]
    Validation {
        index: usize,
        #[source]
        source: ValidationError,
    },

    /// Insert `index` failed; the whole batch was rolled back
    #[error("batch rolled back after insert {index} failed: {source}")]
    BatchRolledBack {
        index: usize,
        #[source]
        source: Box<StoreError>,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub fn not_found(resource: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            key: key.into(),
        }
    }

    /// True for failures of the store itself rather than of a statement.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::BatchRolledBack { source, .. } => source.is_connection(),
            _ => false,
        }
    }
}

/// SQLSTATE classes for connection exceptions (`08`) and invalid
/// authorization (`28`). SQLite reports numeric result codes instead, which
/// never have five characters with a leading zero class.
fn is_connection_sqlstate(code: &str) -> bool {
    code.len() == 5 && (code.starts_with("08") || code.starts_with("28"))
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let connection = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(db) => db.code().is_some_and(|code| is_connection_sqlstate(&code)),
            _ => false,
        };

        if connection {
            Self::Connection(err)
        } else {
            Self::Query(err)
        }
    }
}
