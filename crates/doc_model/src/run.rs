//! Text run - a contiguous span of text with consistent formatting

use crate::CharacterProperties;
use serde::{Deserialize, Serialize};

/// A text run - contiguous text with consistent formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// The text content of this run
    pub text: String,
    /// Direct formatting
    #[serde(default)]
    pub properties: CharacterProperties,
}

impl Run {
    /// Create a new run with text content
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            properties: CharacterProperties::default(),
        }
    }

    /// Create a new run with direct formatting
    pub fn with_properties(text: impl Into<String>, properties: CharacterProperties) -> Self {
        Self {
            text: text.into(),
            properties,
        }
    }

    /// A run with the same formatting and different text
    pub fn with_same_format(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            properties: self.properties.clone(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
