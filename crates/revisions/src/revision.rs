//! Revision model - Core types for tracking document changes

use crate::{Result, RevisionError};
use chrono::{DateTime, Utc};
use doc_model::{InlineContent, PropertyMap};
use serde::{Deserialize, Serialize};

/// Identifier of a revision, unique within one registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RevisionId(pub u64);

impl RevisionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse grouping of revision kinds used by queries and selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RevisionCategory {
    /// Insertions and deletions
    Content,
    /// Run, paragraph and numbering property changes
    Formatting,
    /// Moves and section property changes
    Structural,
    /// Every table-level change
    Table,
}

/// Type of revision (change)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RevisionKind {
    Insert,
    Delete,
    RunPropertyChange,
    ParagraphPropertyChange,
    TablePropertyChange,
    TableExceptionPropertyChange,
    TableRowPropertyChange,
    TableCellPropertyChange,
    SectionPropertyChange,
    MoveFrom,
    MoveTo,
    TableCellInsert,
    TableCellDelete,
    TableCellMerge,
    NumberingChange,
}

impl RevisionKind {
    /// Every kind, in declaration order
    pub const ALL: [RevisionKind; 15] = [
        RevisionKind::Insert,
        RevisionKind::Delete,
        RevisionKind::RunPropertyChange,
        RevisionKind::ParagraphPropertyChange,
        RevisionKind::TablePropertyChange,
        RevisionKind::TableExceptionPropertyChange,
        RevisionKind::TableRowPropertyChange,
        RevisionKind::TableCellPropertyChange,
        RevisionKind::SectionPropertyChange,
        RevisionKind::MoveFrom,
        RevisionKind::MoveTo,
        RevisionKind::TableCellInsert,
        RevisionKind::TableCellDelete,
        RevisionKind::TableCellMerge,
        RevisionKind::NumberingChange,
    ];

    pub fn category(&self) -> RevisionCategory {
        match self {
            RevisionKind::Insert | RevisionKind::Delete => RevisionCategory::Content,
            RevisionKind::RunPropertyChange
            | RevisionKind::ParagraphPropertyChange
            | RevisionKind::NumberingChange => RevisionCategory::Formatting,
            RevisionKind::MoveFrom | RevisionKind::MoveTo | RevisionKind::SectionPropertyChange => {
                RevisionCategory::Structural
            }
            RevisionKind::TablePropertyChange
            | RevisionKind::TableExceptionPropertyChange
            | RevisionKind::TableRowPropertyChange
            | RevisionKind::TableCellPropertyChange
            | RevisionKind::TableCellInsert
            | RevisionKind::TableCellDelete
            | RevisionKind::TableCellMerge => RevisionCategory::Table,
        }
    }

    /// Kinds that wrap inserted, deleted or moved content
    pub fn is_content_change(&self) -> bool {
        matches!(
            self,
            RevisionKind::Insert | RevisionKind::Delete | RevisionKind::MoveFrom | RevisionKind::MoveTo
        )
    }

    /// Kinds that record a property bag
    pub fn is_property_change(&self) -> bool {
        matches!(
            self,
            RevisionKind::RunPropertyChange
                | RevisionKind::ParagraphPropertyChange
                | RevisionKind::TablePropertyChange
                | RevisionKind::TableExceptionPropertyChange
                | RevisionKind::TableRowPropertyChange
                | RevisionKind::TableCellPropertyChange
                | RevisionKind::SectionPropertyChange
                | RevisionKind::NumberingChange
        )
    }

    pub fn is_move(&self) -> bool {
        matches!(self, RevisionKind::MoveFrom | RevisionKind::MoveTo)
    }

    /// Cell-level structure markers
    pub fn is_table_cell_marker(&self) -> bool {
        matches!(
            self,
            RevisionKind::TableCellInsert | RevisionKind::TableCellDelete | RevisionKind::TableCellMerge
        )
    }

    /// Get a display name for the revision kind
    pub fn display_name(&self) -> &'static str {
        match self {
            RevisionKind::Insert => "Inserted",
            RevisionKind::Delete => "Deleted",
            RevisionKind::RunPropertyChange => "Formatted",
            RevisionKind::ParagraphPropertyChange => "Formatted Paragraph",
            RevisionKind::TablePropertyChange => "Formatted Table",
            RevisionKind::TableExceptionPropertyChange => "Formatted Table Exception",
            RevisionKind::TableRowPropertyChange => "Formatted Table Row",
            RevisionKind::TableCellPropertyChange => "Formatted Table Cell",
            RevisionKind::SectionPropertyChange => "Formatted Section",
            RevisionKind::MoveFrom => "Moved From",
            RevisionKind::MoveTo => "Moved To",
            RevisionKind::TableCellInsert => "Inserted Cell",
            RevisionKind::TableCellDelete => "Deleted Cell",
            RevisionKind::TableCellMerge => "Merged Cell",
            RevisionKind::NumberingChange => "Changed Numbering",
        }
    }
}

/// Run-level format change on one item of a wrapper's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedChange {
    /// Index into the wrapper's `content`
    pub index: usize,
    pub revision: Revision,
}

/// A single revision (tracked change)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Assigned by the registry; 0 until registered
    pub id: RevisionId,
    /// Author who made this change
    pub author: String,
    /// When the change was made
    pub date: DateTime<Utc>,
    pub kind: RevisionKind,
    /// Affected content; for property changes this is the formatted content
    pub content: Vec<InlineContent>,
    pub previous_properties: Option<PropertyMap>,
    pub new_properties: Option<PropertyMap>,
    /// Shared by the two halves of a move
    pub move_id: Option<String>,
    pub move_location: Option<String>,
    /// Deleted text is a field instruction
    pub field_instruction: bool,
    /// Format changes on runs that are also inside this wrapper
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_changes: Vec<NestedChange>,
}

impl Revision {
    fn blank(kind: RevisionKind, author: impl Into<String>, content: Vec<InlineContent>) -> Self {
        Self {
            id: RevisionId::default(),
            author: author.into(),
            date: Utc::now(),
            kind,
            content,
            previous_properties: None,
            new_properties: None,
            move_id: None,
            move_location: None,
            field_instruction: false,
            nested_changes: Vec::new(),
        }
    }

    fn content_change(
        kind: RevisionKind,
        author: impl Into<String>,
        content: Vec<InlineContent>,
    ) -> Result<Self> {
        if content.is_empty() {
            return Err(RevisionError::EmptyContent(kind));
        }
        Ok(Self::blank(kind, author, content))
    }

    fn move_half(
        kind: RevisionKind,
        author: impl Into<String>,
        move_id: impl Into<String>,
        content: Vec<InlineContent>,
    ) -> Result<Self> {
        let move_id = move_id.into();
        if move_id.is_empty() {
            return Err(RevisionError::MissingMoveId(kind));
        }
        let mut revision = Self::content_change(kind, author, content)?;
        revision.move_id = Some(move_id);
        Ok(revision)
    }

    /// Create a new insertion revision
    pub fn insert(author: impl Into<String>, content: Vec<InlineContent>) -> Result<Self> {
        Self::content_change(RevisionKind::Insert, author, content)
    }

    /// Create a new deletion revision
    pub fn delete(author: impl Into<String>, content: Vec<InlineContent>) -> Result<Self> {
        Self::content_change(RevisionKind::Delete, author, content)
    }

    /// Source half of a move
    pub fn move_from(
        author: impl Into<String>,
        move_id: impl Into<String>,
        content: Vec<InlineContent>,
    ) -> Result<Self> {
        Self::move_half(RevisionKind::MoveFrom, author, move_id, content)
    }

    /// Destination half of a move
    pub fn move_to(
        author: impl Into<String>,
        move_id: impl Into<String>,
        content: Vec<InlineContent>,
    ) -> Result<Self> {
        Self::move_half(RevisionKind::MoveTo, author, move_id, content)
    }

    /// Create a property change of any property kind.
    ///
    /// `content` holds the affected content, already carrying the new formatting.
    pub fn property_change(
        kind: RevisionKind,
        author: impl Into<String>,
        content: Vec<InlineContent>,
        previous: Option<PropertyMap>,
        new: Option<PropertyMap>,
    ) -> Result<Self> {
        if !kind.is_property_change() {
            return Err(RevisionError::KindMismatch {
                kind,
                expected: "property change",
            });
        }
        if previous.is_none() && new.is_none() {
            return Err(RevisionError::MissingProperties(kind));
        }
        let mut revision = Self::blank(kind, author, content);
        revision.previous_properties = previous;
        revision.new_properties = new;
        Ok(revision)
    }

    /// Table cell insert/delete/merge marker
    pub fn table_cell(kind: RevisionKind, author: impl Into<String>) -> Result<Self> {
        if !kind.is_table_cell_marker() {
            return Err(RevisionError::KindMismatch {
                kind,
                expected: "table cell",
            });
        }
        Ok(Self::blank(kind, author, Vec::new()))
    }

    /// Set a specific date
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Mark deleted text as a field instruction
    pub fn with_field_instruction(mut self, field_instruction: bool) -> Self {
        self.field_instruction = field_instruction;
        self
    }

    /// Name the location of a move (`w:name` of the move range)
    pub fn with_move_location(mut self, location: impl Into<String>) -> Self {
        self.move_location = Some(location.into());
        self
    }

    /// Attach a format change to `content[index]`
    pub fn with_nested_change(mut self, index: usize, revision: Revision) -> Self {
        self.nested_changes.push(NestedChange { index, revision });
        self
    }

    /// Format change attached to `content[index]`, if any
    pub fn nested_change(&self, index: usize) -> Option<&Revision> {
        self.nested_changes
            .iter()
            .find(|nested| nested.index == index)
            .map(|nested| &nested.revision)
    }

    pub fn category(&self) -> RevisionCategory {
        self.kind.category()
    }

    /// Concatenated text of the wrapped content
    pub fn text(&self) -> String {
        self.content.iter().map(|c| c.text()).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
