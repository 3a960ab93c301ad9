//! Error types for document model operations

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocModelError {
    #[error("Abstract numbering definition not found: {0}")]
    AbstractNumNotFound(u32),

    #[error("Numbering instance not found: {0}")]
    NumberingInstanceNotFound(u32),

    #[error("Invalid list level: {0} (expected 0-8)")]
    InvalidLevel(u8),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
