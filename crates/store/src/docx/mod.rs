//! WordprocessingML Import/Export Module
//!
//! This module reads and writes the parts of an Office Open XML (ECMA-376)
//! package that the tracked-changes engine touches:
//!
//! - `word/document.xml` paragraphs - insertions, deletions, moves and
//!   property changes (w:ins, w:del, w:moveFrom, w:moveTo, w:rPrChange, ...)
//! - `word/numbering.xml` - list definitions (w:abstractNum, w:num)
//!
//! Numbering is written back through a selective merge so that markup the
//! model does not understand survives a load/save cycle untouched.

mod error;
mod reader;
mod properties_io;
mod lists;
mod numbering_writer;
mod merge;
mod track_changes;
mod track_changes_writer;

pub use error::{DocxError, DocxResult};
pub use reader::XmlParser;
pub use lists::NumberingParser;
pub use numbering_writer::NumberingWriter;
pub use merge::{MergeSchema, MergeSource, RawChild, RawPart, SelectiveFidelityMerger};
pub use track_changes::{parse_date, TrackChangesParser};
pub use track_changes_writer::{cell_marker_name, change_element_names, TrackChangesWriter};

/// XML namespaces used in DOCX files
pub mod namespaces {
    /// Main WordprocessingML namespace
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Relationships namespace
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
}
