//! Prefix/suffix text diff used to turn whole-text replacement into
//! granular tracked edits.
//!
//! This is not an LCS diff: it finds one common prefix and one
//! common suffix and reports everything in between as a single deletion
//! followed by a single insertion.

use serde::{Deserialize, Serialize};

/// Kind of a diff segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    Equal,
    Delete,
    Insert,
}

/// A run of text with the same diff kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    pub kind: DiffKind,
    pub text: String,
}

impl DiffSegment {
    pub fn equal(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Equal,
            text: text.into(),
        }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Delete,
            text: text.into(),
        }
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Insert,
            text: text.into(),
        }
    }
}

/// Minimal-edit diff between two strings
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffEngine;

impl DiffEngine {
    /// Diff `old` against `new`, producing at most four segments.
    ///
    /// Prefix and suffix are measured in chars and never overlap:
    /// `prefix + suffix <= min(old.len(), new.len())`.
    pub fn diff(old: &str, new: &str) -> Vec<DiffSegment> {
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();

        let prefix = old_chars
            .iter()
            .zip(new_chars.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let suffix = old_chars[prefix..]
            .iter()
            .rev()
            .zip(new_chars[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        let slice = |chars: &[char]| chars.iter().collect::<String>();

        let mut segments = Vec::with_capacity(4);
        if prefix > 0 {
            segments.push(DiffSegment::equal(slice(&old_chars[..prefix])));
        }
        let deleted = &old_chars[prefix..old_chars.len() - suffix];
        if !deleted.is_empty() {
            segments.push(DiffSegment::delete(slice(deleted)));
        }
        let inserted = &new_chars[prefix..new_chars.len() - suffix];
        if !inserted.is_empty() {
            segments.push(DiffSegment::insert(slice(inserted)));
        }
        if suffix > 0 {
            segments.push(DiffSegment::equal(slice(&old_chars[old_chars.len() - suffix..])));
        }
        segments
    }

    /// True when the diff kept some text in place.
    ///
    /// Without a common region there is nothing to gain from granular
    /// tracking and the caller should replace the whole unit.
    pub fn has_common_region(segments: &[DiffSegment]) -> bool {
        segments.iter().any(|s| s.kind == DiffKind::Equal)
    }

    /// Rebuild the old text from equal and delete segments
    pub fn old_text(segments: &[DiffSegment]) -> String {
        segments
            .iter()
            .filter(|s| s.kind != DiffKind::Insert)
            .map(|s| s.text.as_str())
            .collect()
    }

    /// Rebuild the new text from equal and insert segments
    pub fn new_text(segments: &[DiffSegment]) -> String {
        segments
            .iter()
            .filter(|s| s.kind != DiffKind::Delete)
            .map(|s| s.text.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_fix() {
        assert_eq!(
            DiffEngine::diff("word  word", "word word"),
            vec![
                DiffSegment::equal("word "),
                DiffSegment::delete(" "),
                DiffSegment::equal("word"),
            ]
        );
    }

    #[test]
    fn test_infix_replace() {
        assert_eq!(
            DiffEngine::diff("The quick fox", "The slow fox"),
            vec![
                DiffSegment::equal("The "),
                DiffSegment::delete("quick"),
                DiffSegment::insert("slow"),
                DiffSegment::equal(" fox"),
            ]
        );
    }

    #[test]
    fn test_nothing_in_common() {
        let segments = DiffEngine::diff("abc", "xyz");
        assert_eq!(segments, vec![DiffSegment::delete("abc"), DiffSegment::insert("xyz")]);
        assert!(!DiffEngine::has_common_region(&segments));
    }

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(DiffEngine::diff("same", "same"), vec![DiffSegment::equal("same")]);
        assert!(DiffEngine::diff("", "").is_empty());
        assert_eq!(DiffEngine::diff("", "new"), vec![DiffSegment::insert("new")]);
        assert_eq!(DiffEngine::diff("old", ""), vec![DiffSegment::delete("old")]);
    }

    #[test]
    fn test_append_and_truncate() {
        assert_eq!(
            DiffEngine::diff("Hello", "Hello world"),
            vec![DiffSegment::equal("Hello"), DiffSegment::insert(" world")]
        );
        assert_eq!(
            DiffEngine::diff("Hello world", "Hello"),
            vec![DiffSegment::equal("Hello"), DiffSegment::delete(" world")]
        );
    }

    #[test]
    fn test_prefix_and_suffix_do_not_overlap() {
        // "aa" -> "aaa": the prefix takes both chars, no suffix is left to share
        assert_eq!(
            DiffEngine::diff("aa", "aaa"),
            vec![DiffSegment::equal("aa"), DiffSegment::insert("a")]
        );
    }

    #[test]
    fn test_multibyte_chars() {
        assert_eq!(
            DiffEngine::diff("café au lait", "cafés au lait"),
            vec![
                DiffSegment::equal("café"),
                DiffSegment::insert("s"),
                DiffSegment::equal(" au lait"),
            ]
        );
    }
}
