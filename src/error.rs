//! Error types for the lead pipeline core.
//!
//! Errors are classified by where they arise:
//! - InvalidInput: precondition violations, rejected before any query is built
//! - NotFound: the record is missing or belongs to another owner
//! - Config: the startup configuration could not be loaded or failed validation
//! - Db: storage-layer failures, wrapped from the database module

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

impl CoreError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Returns true if this error is a caller-side precondition violation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, CoreError::InvalidInput { .. })
    }

    /// Returns true if the referenced record does not exist for this owner.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}
