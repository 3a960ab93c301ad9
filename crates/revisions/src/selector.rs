//! Read-only selection of revisions for previewing selective accept/reject

use crate::{Revision, RevisionCategory, RevisionId, RevisionKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

type Predicate = Box<dyn Fn(&Revision) -> bool + Send + Sync>;

/// Criteria for selecting revisions.
///
/// Every non-empty criterion must match. Criteria with nothing set select
/// nothing rather than everything.
#[derive(Default, Serialize, Deserialize)]
pub struct SelectionCriteria {
    #[serde(default)]
    pub ids: BTreeSet<RevisionId>,
    #[serde(default)]
    pub kinds: BTreeSet<RevisionKind>,
    #[serde(default)]
    pub authors: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<RevisionCategory>,
    /// Inclusive lower bound
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub date_to: Option<DateTime<Utc>>,
    #[serde(skip)]
    predicate: Option<Predicate>,
}

impl fmt::Debug for SelectionCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionCriteria")
            .field("ids", &self.ids)
            .field("kinds", &self.kinds)
            .field("authors", &self.authors)
            .field("categories", &self.categories)
            .field("date_from", &self.date_from)
            .field("date_to", &self.date_to)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl SelectionCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = RevisionId>) -> Self {
        self.ids.extend(ids);
        self
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = RevisionKind>) -> Self {
        self.kinds.extend(kinds);
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.authors.insert(author.into());
        self
    }

    pub fn categories(mut self, categories: impl IntoIterator<Item = RevisionCategory>) -> Self {
        self.categories.extend(categories);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Add an arbitrary predicate
    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Revision) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// True when no criterion is set
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
            && self.kinds.is_empty()
            && self.authors.is_empty()
            && self.categories.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.predicate.is_none()
    }

    pub fn matches(&self, revision: &Revision) -> bool {
        if self.is_empty() {
            return false;
        }
        if !self.ids.is_empty() && !self.ids.contains(&revision.id) {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&revision.kind) {
            return false;
        }
        if !self.authors.is_empty() && !self.authors.contains(&revision.author) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&revision.category()) {
            return false;
        }
        if self.date_from.is_some_and(|from| revision.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| revision.date > to) {
            return false;
        }
        self.predicate.as_ref().map_or(true, |p| p(revision))
    }
}

/// Partition of revision ids into matching and non-matching
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub matching: Vec<RevisionId>,
    pub non_matching: Vec<RevisionId>,
}

impl SelectionResult {
    pub fn matching_count(&self) -> usize {
        self.matching.len()
    }

    pub fn non_matching_count(&self) -> usize {
        self.non_matching.len()
    }

    pub fn is_selected(&self, id: RevisionId) -> bool {
        self.matching.contains(&id)
    }
}

/// Dry-run selector; never mutates anything
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectiveRevisionSelector;

impl SelectiveRevisionSelector {
    pub fn select<'a, I>(revisions: I, criteria: &SelectionCriteria) -> SelectionResult
    where
        I: IntoIterator<Item = &'a Revision>,
    {
        let mut result = SelectionResult::default();
        for revision in revisions {
            if criteria.matches(revision) {
                result.matching.push(revision.id);
            } else {
                result.non_matching.push(revision.id);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RevisionRegistry;
    use doc_model::Run;

    fn registry() -> RevisionRegistry {
        let mut registry = RevisionRegistry::with_author("Ann");
        registry.register(Revision::insert("Ann", vec![Run::new("a").into()]).unwrap());
        registry.register(Revision::delete("Bob", vec![Run::new("b").into()]).unwrap());
        registry.register(Revision::insert("Bob", vec![Run::new("cc").into()]).unwrap());
        registry
    }

    #[test]
    fn test_empty_criteria_select_nothing() {
        let registry = registry();
        let result = SelectiveRevisionSelector::select(registry.revisions(), &SelectionCriteria::new());
        assert_eq!(result.matching_count(), 0);
        assert_eq!(result.non_matching_count(), 3);
    }

    #[test]
    fn test_criteria_are_anded() {
        let registry = registry();
        let criteria = SelectionCriteria::new()
            .author("Bob")
            .kinds([RevisionKind::Insert]);
        let result = SelectiveRevisionSelector::select(registry.revisions(), &criteria);
        assert_eq!(result.matching, vec![RevisionId::new(2)]);
        assert_eq!(result.non_matching, vec![RevisionId::new(0), RevisionId::new(1)]);
    }

    #[test]
    fn test_id_set_and_predicate() {
        let registry = registry();
        let criteria = SelectionCriteria::new()
            .ids([RevisionId::new(0), RevisionId::new(2)])
            .matching(|r| r.text().len() > 1);
        let result = SelectiveRevisionSelector::select(registry.revisions(), &criteria);
        assert_eq!(result.matching, vec![RevisionId::new(2)]);
        assert!(result.is_selected(RevisionId::new(2)));
    }

    #[test]
    fn test_category_selection() {
        let registry = registry();
        let criteria = SelectionCriteria::new().categories([RevisionCategory::Content]);
        let result = SelectiveRevisionSelector::select(registry.revisions(), &criteria);
        assert_eq!(result.matching_count(), 3);
    }

    #[test]
    fn test_criteria_json_skips_predicate() {
        let criteria = SelectionCriteria::new().author("Ann").matching(|_| true);
        let json = serde_json::to_string(&criteria).unwrap();
        let restored: SelectionCriteria = serde_json::from_str(&json).unwrap();
        assert!(restored.authors.contains("Ann"));
        assert!(!restored.is_empty());
    }
}
