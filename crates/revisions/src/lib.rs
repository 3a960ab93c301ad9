//! Revision Tracking System (Track Changes)
//!
//! This crate implements the tracked-changes engine:
//! - Revisions for insertions, deletions, moves, property and table changes
//! - A registry assigning stable ids and answering categorized queries
//! - A prefix/suffix diff that turns text replacement into granular edits
//! - Accept/reject of tracked changes over paragraph content

mod revision;
mod registry;
mod error;
mod diff;
mod content;
mod transform;
mod selector;
mod commands;
mod settings;

pub use revision::*;
pub use registry::*;
pub use error::*;
pub use diff::*;
pub use content::*;
pub use transform::*;
pub use selector::*;
pub use commands::*;
pub use settings::*;
