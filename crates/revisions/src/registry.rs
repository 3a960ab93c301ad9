//! Revision registry - owns the ordered revisions of one document

use crate::{Result, Revision, RevisionCategory, RevisionError, RevisionId, RevisionKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compound query over revisions; every set field must match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionFilter {
    pub kind: Option<RevisionKind>,
    pub author: Option<String>,
    pub category: Option<RevisionCategory>,
    /// Inclusive lower bound
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub date_to: Option<DateTime<Utc>>,
}

impl RevisionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: RevisionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn category(mut self, category: RevisionCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Check if a revision matches this filter
    pub fn matches(&self, revision: &Revision) -> bool {
        if let Some(kind) = self.kind {
            if revision.kind != kind {
                return false;
            }
        }

        if let Some(author) = &self.author {
            if &revision.author != author {
                return false;
            }
        }

        if let Some(category) = self.category {
            if revision.category() != category {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if revision.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if revision.date > to {
                return false;
            }
        }

        true
    }
}

/// Both halves of a move, either of which may be missing
#[derive(Debug, Clone, Copy, Default)]
pub struct MovePair<'a> {
    pub from: Option<&'a Revision>,
    pub to: Option<&'a Revision>,
}

impl MovePair<'_> {
    pub fn is_complete(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Matched and orphaned move halves across a registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePairSummary {
    /// Move ids with both halves present
    pub matched: usize,
    /// Move ids with only a `moveFrom`
    pub orphaned_from: Vec<String>,
    /// Move ids with only a `moveTo`
    pub orphaned_to: Vec<String>,
}

impl MovePairSummary {
    pub fn orphaned(&self) -> usize {
        self.orphaned_from.len() + self.orphaned_to.len()
    }
}

/// Main revision tracking state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionRegistry {
    /// Whether tracking is currently enabled
    tracking_enabled: bool,
    /// Current author name (used when creating new revisions)
    current_author: String,
    /// Revisions in registration order; ids are strictly increasing
    revisions: Vec<Revision>,
    /// Counter for generating unique revision IDs
    next_id: u64,
}

impl Default for RevisionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionRegistry {
    pub fn new() -> Self {
        Self {
            tracking_enabled: false,
            current_author: "Unknown".to_string(),
            revisions: Vec::new(),
            next_id: 0,
        }
    }

    /// Create a registry with tracking enabled for an author
    pub fn with_author(author: impl Into<String>) -> Self {
        Self {
            tracking_enabled: true,
            current_author: author.into(),
            ..Self::new()
        }
    }

    // =========================================================================
    // Tracking Control
    // =========================================================================

    pub fn enable_tracking(&mut self) {
        self.tracking_enabled = true;
    }

    pub fn disable_tracking(&mut self) {
        self.tracking_enabled = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking_enabled
    }

    // =========================================================================
    // Author Management
    // =========================================================================

    /// Set the current author for new revisions
    pub fn set_current_author(&mut self, author: impl Into<String>) -> Result<()> {
        let author = author.into();
        if author.trim().is_empty() {
            return Err(RevisionError::InvalidAuthor(
                "Author name cannot be empty".to_string(),
            ));
        }
        self.current_author = author;
        Ok(())
    }

    pub fn current_author(&self) -> &str {
        &self.current_author
    }

    /// Get all unique authors who have made revisions
    pub fn authors(&self) -> Vec<&str> {
        let mut authors: Vec<&str> = self.revisions.iter().map(|r| r.author.as_str()).collect();
        authors.sort();
        authors.dedup();
        authors
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Assign the next id, keep a copy and hand the stamped revision back
    /// so it can be placed in content.
    pub fn register(&mut self, mut revision: Revision) -> Revision {
        revision.id = RevisionId::new(self.next_id);
        self.next_id += 1;
        self.revisions.push(revision.clone());
        revision
    }

    /// Id the next `register` call will assign
    pub fn peek_next_id(&self) -> RevisionId {
        RevisionId::new(self.next_id)
    }

    /// Remove a revision; remaining ids are not renumbered
    pub fn remove_by_id(&mut self, id: RevisionId) -> Option<Revision> {
        let index = self.index_of(id)?;
        Some(self.revisions.remove(index))
    }

    /// Drop every revision; the id counter keeps counting
    pub fn clear(&mut self) {
        self.revisions.clear();
    }

    fn index_of(&self, id: RevisionId) -> Option<usize> {
        self.revisions.binary_search_by_key(&id, |r| r.id).ok()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get(&self, id: RevisionId) -> Option<&Revision> {
        self.index_of(id).map(|i| &self.revisions[i])
    }

    /// Registered copy of a revision, for updating it in place
    pub fn get_mut(&mut self, id: RevisionId) -> Option<&mut Revision> {
        self.index_of(id).map(|i| &mut self.revisions[i])
    }

    /// All revisions in registration order
    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn by_kind(&self, kind: RevisionKind) -> Vec<&Revision> {
        self.matching(&RevisionFilter::new().kind(kind))
    }

    pub fn by_author(&self, author: &str) -> Vec<&Revision> {
        self.matching(&RevisionFilter::new().author(author))
    }

    pub fn by_category(&self, category: RevisionCategory) -> Vec<&Revision> {
        self.matching(&RevisionFilter::new().category(category))
    }

    pub fn in_date_range(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<&Revision> {
        self.matching(&RevisionFilter::new().between(from, to))
    }

    /// Revisions matching every criterion of `filter`
    pub fn matching(&self, filter: &RevisionFilter) -> Vec<&Revision> {
        self.revisions.iter().filter(|r| filter.matches(r)).collect()
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Look up both halves of a move
    pub fn move_pair(&self, move_id: &str) -> MovePair<'_> {
        let half = |kind: RevisionKind| {
            self.revisions
                .iter()
                .find(|r| r.kind == kind && r.move_id.as_deref() == Some(move_id))
        };
        MovePair {
            from: half(RevisionKind::MoveFrom),
            to: half(RevisionKind::MoveTo),
        }
    }

    /// Count matched and orphaned moves
    pub fn move_pair_summary(&self) -> MovePairSummary {
        let mut move_ids: Vec<&str> = self
            .revisions
            .iter()
            .filter(|r| r.kind.is_move())
            .filter_map(|r| r.move_id.as_deref())
            .collect();
        move_ids.sort();
        move_ids.dedup();

        let mut summary = MovePairSummary::default();
        for move_id in move_ids {
            let pair = self.move_pair(move_id);
            match (pair.from.is_some(), pair.to.is_some()) {
                (true, true) => summary.matched += 1,
                (true, false) => summary.orphaned_from.push(move_id.to_string()),
                (false, true) => summary.orphaned_to.push(move_id.to_string()),
                (false, false) => {}
            }
        }
        summary
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use doc_model::{InlineContent, Run};

    fn content(text: &str) -> Vec<InlineContent> {
        vec![Run::new(text).into()]
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn sample_registry() -> RevisionRegistry {
        let mut registry = RevisionRegistry::with_author("Ann");
        registry.register(Revision::insert("Ann", content("a")).unwrap().with_date(at(1)));
        registry.register(Revision::delete("Bob", content("b")).unwrap().with_date(at(2)));
        registry.register(Revision::move_from("Ann", "m1", content("c")).unwrap().with_date(at(3)));
        registry.register(Revision::move_to("Bob", "m1", content("c")).unwrap().with_date(at(4)));
        registry
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let registry = sample_registry();
        let ids: Vec<u64> = registry.revisions().iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_register_returns_stamped_revision() {
        let mut registry = sample_registry();
        let revision = registry.register(Revision::insert("Cy", content("d")).unwrap());
        assert_eq!(revision.id, RevisionId::new(4));
        assert_eq!(registry.get(revision.id), Some(&revision));
    }

    #[test]
    fn test_remove_does_not_reuse_ids() {
        let mut registry = sample_registry();
        let removed = registry.remove_by_id(RevisionId::new(3)).unwrap();
        assert_eq!(removed.kind, RevisionKind::MoveTo);
        assert!(registry.remove_by_id(RevisionId::new(3)).is_none());

        let next = registry.register(Revision::insert("Ann", content("e")).unwrap());
        assert_eq!(next.id, RevisionId::new(4));

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.peek_next_id(), RevisionId::new(5));
    }

    #[test]
    fn test_queries() {
        let registry = sample_registry();
        assert_eq!(registry.by_kind(RevisionKind::Delete).len(), 1);
        assert_eq!(registry.by_author("Ann").len(), 2);
        assert_eq!(registry.by_category(RevisionCategory::Structural).len(), 2);
        assert_eq!(registry.in_date_range(Some(at(2)), Some(at(3))).len(), 2);
        assert_eq!(registry.in_date_range(None, Some(at(1))).len(), 1);
        assert!(registry.get(RevisionId::new(42)).is_none());
        assert_eq!(registry.authors(), vec!["Ann", "Bob"]);
    }

    #[test]
    fn test_compound_filter() {
        let registry = sample_registry();
        let filter = RevisionFilter::new()
            .author("Bob")
            .category(RevisionCategory::Structural)
            .between(Some(at(1)), None);
        let found = registry.matching(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, RevisionKind::MoveTo);

        let none = registry.matching(&RevisionFilter::new().author("Bob").kind(RevisionKind::Insert));
        assert!(none.is_empty());
    }

    #[test]
    fn test_move_pair_lookup() {
        let mut registry = sample_registry();
        assert!(registry.move_pair("m1").is_complete());
        assert!(registry.move_pair("missing").is_empty());

        registry.register(Revision::move_from("Ann", "m2", content("x")).unwrap());
        let pair = registry.move_pair("m2");
        assert!(pair.from.is_some());
        assert!(pair.to.is_none());

        let summary = registry.move_pair_summary();
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.orphaned_from, vec!["m2".to_string()]);
        assert_eq!(summary.orphaned(), 1);
    }

    #[test]
    fn test_tracking_and_author() {
        let mut registry = RevisionRegistry::new();
        assert!(!registry.is_tracking());
        registry.enable_tracking();
        assert!(registry.is_tracking());
        assert!(registry.set_current_author("  ").is_err());
        registry.set_current_author("Dee").unwrap();
        assert_eq!(registry.current_author(), "Dee");
    }
}
