//! Paragraph content that may contain revision wrappers

use crate::{Revision, RevisionKind};
use doc_model::{Hyperlink, InlineContent, ParagraphProperties, Run};
use serde::{Deserialize, Serialize};

/// One item of a paragraph's ordered content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentItem {
    Run(Run),
    Hyperlink(Hyperlink),
    /// A tracked change wrapping inline content
    Revision(Revision),
}

impl ContentItem {
    pub fn as_revision(&self) -> Option<&Revision> {
        match self {
            ContentItem::Revision(revision) => Some(revision),
            _ => None,
        }
    }

    pub fn is_revision(&self) -> bool {
        matches!(self, ContentItem::Revision(_))
    }

    /// Text as it reads with every revision shown
    pub fn text(&self) -> String {
        match self {
            ContentItem::Run(run) => run.text.clone(),
            ContentItem::Hyperlink(link) => link.text(),
            ContentItem::Revision(revision) => revision.text(),
        }
    }
}

impl From<InlineContent> for ContentItem {
    fn from(content: InlineContent) -> Self {
        match content {
            InlineContent::Run(run) => ContentItem::Run(run),
            InlineContent::Hyperlink(link) => ContentItem::Hyperlink(link),
        }
    }
}

impl From<Run> for ContentItem {
    fn from(run: Run) -> Self {
        ContentItem::Run(run)
    }
}

impl From<Hyperlink> for ContentItem {
    fn from(link: Hyperlink) -> Self {
        ContentItem::Hyperlink(link)
    }
}

impl From<Revision> for ContentItem {
    fn from(revision: Revision) -> Self {
        ContentItem::Revision(revision)
    }
}

/// A paragraph with tracked content and an optional pending
/// paragraph-level property change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackedParagraph {
    /// Current (new) paragraph properties
    pub properties: ParagraphProperties,
    /// Pending `ParagraphPropertyChange` holding the previous properties
    pub property_change: Option<Revision>,
    pub content: Vec<ContentItem>,
}

impl TrackedParagraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: Vec<ContentItem>) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    pub fn push(&mut self, item: impl Into<ContentItem>) {
        self.content.push(item.into());
    }

    /// Revision wrappers in content order
    pub fn revisions(&self) -> impl Iterator<Item = &Revision> {
        self.content.iter().filter_map(ContentItem::as_revision)
    }

    /// Number of wrappers of a kind, including the paragraph-level change
    pub fn count_of_kind(&self, kind: RevisionKind) -> usize {
        let pending = self
            .property_change
            .as_ref()
            .filter(|r| r.kind == kind)
            .map_or(0, |_| 1);
        self.revisions().filter(|r| r.kind == kind).count() + pending
    }

    /// Text with every revision shown
    pub fn text(&self) -> String {
        self.content.iter().map(ContentItem::text).collect()
    }
}
