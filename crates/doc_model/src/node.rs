//! Inline content - the closed set of items a revision can wrap

use crate::{Hyperlink, Run};
use serde::{Deserialize, Serialize};

/// An inline item: either a text run or a hyperlink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InlineContent {
    Run(Run),
    Hyperlink(Hyperlink),
}

impl InlineContent {
    /// Plain text of this item
    pub fn text(&self) -> String {
        match self {
            InlineContent::Run(run) => run.text.clone(),
            InlineContent::Hyperlink(link) => link.text(),
        }
    }

    /// Runs directly contained in this item
    pub fn runs(&self) -> &[Run] {
        match self {
            InlineContent::Run(run) => std::slice::from_ref(run),
            InlineContent::Hyperlink(link) => &link.runs,
        }
    }

    /// True when the item carries no text at all
    pub fn is_empty(&self) -> bool {
        self.runs().iter().all(|r| r.is_empty())
    }
}

impl From<Run> for InlineContent {
    fn from(run: Run) -> Self {
        InlineContent::Run(run)
    }
}

impl From<Hyperlink> for InlineContent {
    fn from(link: Hyperlink) -> Self {
        InlineContent::Hyperlink(link)
    }
}
