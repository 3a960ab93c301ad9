//! Error types for revision tracking operations

use crate::RevisionKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("{0:?} revision requires non-empty content")]
    EmptyContent(RevisionKind),

    #[error("{0:?} revision requires previous or new properties")]
    MissingProperties(RevisionKind),

    #[error("{0:?} revision requires a move id")]
    MissingMoveId(RevisionKind),

    #[error("{kind:?} is not a {expected} revision kind")]
    KindMismatch {
        kind: RevisionKind,
        expected: &'static str,
    },

    #[error("Invalid author: {0}")]
    InvalidAuthor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RevisionError>;
