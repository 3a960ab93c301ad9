//! Store - WordprocessingML I/O for tracked changes and numbering
//!
//! This crate handles the wire side of the tracked-changes engine:
//! serializing and parsing tracked paragraphs, reading and writing the
//! numbering part, and merging an edited numbering registry back into the
//! part it was loaded from without disturbing untouched markup.

pub mod docx;

// Re-export DOCX functionality
pub use docx::{
    namespaces, DocxError, DocxResult, MergeSchema, MergeSource, NumberingParser,
    NumberingWriter, RawPart, SelectiveFidelityMerger, TrackChangesParser, TrackChangesWriter,
};
