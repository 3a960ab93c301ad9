//! Document Model - inline content, property bags and definition tables
//!
//! This crate provides the content types that tracked changes wrap
//! (runs and hyperlinks), the property bags recorded by property-change
//! revisions, and the numbering definition table together with its
//! modification tracking and consolidation.

mod error;
mod properties;
mod run;
mod hyperlink;
mod node;
pub mod list;
pub mod consolidate;

pub use error::*;
pub use properties::*;
pub use run::*;
pub use hyperlink::*;
pub use node::*;
pub use list::*;
pub use consolidate::*;
