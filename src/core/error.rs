use crate::storage::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure taxonomy shared by operation-level errors and item-level rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Malformed or missing field; nothing was changed.
    InvalidInput,
    /// Referenced event or runner is absent.
    NotFound,
    /// Version mismatch on a conditional write; retry with fresh data.
    Conflict,
    /// Uniqueness or referential rule broken.
    ConstraintViolation,
    /// The document store failed to serve the request.
    StoreUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::ConstraintViolation => "constraint_violation",
            Self::StoreUnavailable => "store_unavailable",
        };
        write!(f, "{label}")
    }
}

/// Operation-level failure. Aborts the whole operation before (or instead of) a write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type Result<T> = std::result::Result<T, RaceError>;

impl RaceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

impl From<StoreError> for RaceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::VersionConflict { .. } => Self::Conflict(format!(
                "{err}; re-fetch the document and resubmit"
            )),
            StoreError::DuplicateId { .. } => Self::Conflict(err.to_string()),
            StoreError::InvalidMutation { .. }
            | StoreError::Unavailable(_)
            | StoreError::Snapshot(_) => Self::StoreUnavailable(err.to_string()),
        }
    }
}
