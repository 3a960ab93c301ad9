//! Hyperlink - wraps text runs with a link target

use crate::Run;
use serde::{Deserialize, Serialize};

/// Target of a hyperlink as stored in the part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HyperlinkTarget {
    /// External target, resolved through a part relationship (`r:id`)
    Relationship(String),
    /// Internal bookmark (`w:anchor`)
    Anchor(String),
}

/// A hyperlink containing one or more runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub target: HyperlinkTarget,
    /// Optional tooltip (`w:tooltip`)
    pub tooltip: Option<String>,
    pub runs: Vec<Run>,
}

impl Hyperlink {
    /// Create a hyperlink to an external relationship
    pub fn external(relationship_id: impl Into<String>, runs: Vec<Run>) -> Self {
        Self {
            target: HyperlinkTarget::Relationship(relationship_id.into()),
            tooltip: None,
            runs,
        }
    }

    /// Create a hyperlink to a bookmark
    pub fn internal(anchor: impl Into<String>, runs: Vec<Run>) -> Self {
        Self {
            target: HyperlinkTarget::Anchor(anchor.into()),
            tooltip: None,
            runs,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperlink_text() {
        let link = Hyperlink::external("rId5", vec![Run::new("click "), Run::new("here")]);
        assert_eq!(link.text(), "click here");
        assert!(matches!(link.target, HyperlinkTarget::Relationship(ref id) if id == "rId5"));
    }
}
