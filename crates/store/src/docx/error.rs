//! Error types for DOCX operations

use thiserror::Error;

/// Errors that can occur while reading or writing WordprocessingML parts
#[derive(Debug, Error)]
pub enum DocxError {
    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Invalid part structure
    #[error("Invalid DOCX structure: {0}")]
    InvalidStructure(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Document model error
    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    /// Revision construction error
    #[error("Revision error: {0}")]
    Revision(#[from] revisions::RevisionError),
}

impl From<quick_xml::Error> for DocxError {
    fn from(err: quick_xml::Error) -> Self {
        DocxError::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DocxError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DocxError::XmlParse(format!("Attribute error: {}", err))
    }
}

/// Result type for DOCX operations
pub type DocxResult<T> = std::result::Result<T, DocxError>;
