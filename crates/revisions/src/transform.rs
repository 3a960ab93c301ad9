//! Accept/reject transformer for paragraph content

use crate::{ContentItem, Revision, RevisionId, RevisionKind, SelectionResult, TrackedParagraph};
use serde::{Deserialize, Serialize};

/// Which revision families to accept; everything else is kept as is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptPolicy {
    pub accept_insertions: bool,
    pub accept_deletions: bool,
    pub accept_moves: bool,
    pub accept_property_changes: bool,
}

impl Default for AcceptPolicy {
    fn default() -> Self {
        Self::all()
    }
}

impl AcceptPolicy {
    pub fn all() -> Self {
        Self {
            accept_insertions: true,
            accept_deletions: true,
            accept_moves: true,
            accept_property_changes: true,
        }
    }

    pub fn none() -> Self {
        Self {
            accept_insertions: false,
            accept_deletions: false,
            accept_moves: false,
            accept_property_changes: false,
        }
    }

    pub fn only_insertions() -> Self {
        Self {
            accept_insertions: true,
            ..Self::none()
        }
    }

    pub fn only_deletions() -> Self {
        Self {
            accept_deletions: true,
            ..Self::none()
        }
    }

    pub fn only_moves() -> Self {
        Self {
            accept_moves: true,
            ..Self::none()
        }
    }

    pub fn only_property_changes() -> Self {
        Self {
            accept_property_changes: true,
            ..Self::none()
        }
    }

    /// Whether revisions of `kind` are accepted.
    ///
    /// Cell inserts and deletes follow insertions and deletions; cell merges
    /// follow property changes.
    pub fn accepts(&self, kind: RevisionKind) -> bool {
        match kind {
            RevisionKind::Insert | RevisionKind::TableCellInsert => self.accept_insertions,
            RevisionKind::Delete | RevisionKind::TableCellDelete => self.accept_deletions,
            RevisionKind::MoveFrom | RevisionKind::MoveTo => self.accept_moves,
            _ => self.accept_property_changes,
        }
    }
}

/// What accepting a revision does to its wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// Splice the wrapped content in place of the wrapper
    Unwrap,
    /// Remove the wrapper and its content
    Drop,
}

fn resolution(kind: RevisionKind) -> Resolution {
    match kind {
        RevisionKind::Delete | RevisionKind::MoveFrom | RevisionKind::TableCellDelete => {
            Resolution::Drop
        }
        _ => Resolution::Unwrap,
    }
}

/// Counts reported by a transform pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSummary {
    /// Wrappers replaced by their content
    pub unwrapped: usize,
    /// Wrappers removed along with their content
    pub dropped: usize,
    /// Wrappers left unchanged
    pub kept: usize,
    /// A paragraph-level property change was cleared
    pub paragraph_change_cleared: bool,
    /// Ids of every resolved revision, in content order
    pub resolved_ids: Vec<RevisionId>,
}

impl TransformSummary {
    fn absorb(&mut self, other: TransformSummary) {
        self.unwrapped += other.unwrapped;
        self.dropped += other.dropped;
        self.kept += other.kept;
        self.paragraph_change_cleared |= other.paragraph_change_cleared;
        self.resolved_ids.extend(other.resolved_ids);
    }
}

/// Rewrites content sequences according to an accept policy.
///
/// Works on one paragraph at a time and never touches the registry; the
/// caller removes resolved ids or clears the registry afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTransformer {
    policy: AcceptPolicy,
}

impl ChangeTransformer {
    pub fn new(policy: AcceptPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AcceptPolicy {
        self.policy
    }

    /// Apply the policy to one content sequence
    pub fn apply(&self, content: Vec<ContentItem>) -> Vec<ContentItem> {
        self.transform(content, |_| true).0
    }

    /// Apply the policy to a paragraph, clearing its paragraph-level
    /// property change when property changes are accepted
    pub fn apply_to_paragraph(&self, paragraph: &mut TrackedParagraph) -> TransformSummary {
        self.transform_paragraph(paragraph, |_| true)
    }

    /// Apply the policy only to revisions chosen by a selector
    pub fn apply_selected(
        &self,
        paragraph: &mut TrackedParagraph,
        selection: &SelectionResult,
    ) -> TransformSummary {
        self.transform_paragraph(paragraph, |r| selection.is_selected(r.id))
    }

    /// Apply the policy to several paragraphs
    pub fn apply_to_paragraphs<'a, I>(&self, paragraphs: I) -> TransformSummary
    where
        I: IntoIterator<Item = &'a mut TrackedParagraph>,
    {
        let mut total = TransformSummary::default();
        for paragraph in paragraphs {
            total.absorb(self.apply_to_paragraph(paragraph));
        }
        tracing::debug!(
            unwrapped = total.unwrapped,
            dropped = total.dropped,
            kept = total.kept,
            "resolved tracked changes"
        );
        total
    }

    fn transform_paragraph<F>(&self, paragraph: &mut TrackedParagraph, selected: F) -> TransformSummary
    where
        F: Fn(&Revision) -> bool,
    {
        let content = std::mem::take(&mut paragraph.content);
        let (content, mut summary) = self.transform(content, &selected);
        paragraph.content = content;

        let clear = self.policy.accept_property_changes
            && paragraph.property_change.as_ref().is_some_and(&selected);
        if clear {
            if let Some(change) = paragraph.property_change.take() {
                summary.paragraph_change_cleared = true;
                summary.resolved_ids.push(change.id);
            }
        }
        summary
    }

    fn transform<F>(&self, content: Vec<ContentItem>, selected: F) -> (Vec<ContentItem>, TransformSummary)
    where
        F: Fn(&Revision) -> bool,
    {
        let mut summary = TransformSummary::default();
        let mut output = Vec::with_capacity(content.len());

        for item in content {
            let revision = match item {
                ContentItem::Revision(revision) => revision,
                other => {
                    output.push(other);
                    continue;
                }
            };

            if !self.policy.accepts(revision.kind) || !selected(&revision) {
                summary.kept += 1;
                output.push(ContentItem::Revision(revision));
                continue;
            }

            summary.resolved_ids.push(revision.id);
            match resolution(revision.kind) {
                Resolution::Unwrap => {
                    summary.unwrapped += 1;
                    let mut nested = revision.nested_changes;
                    for (index, inline) in revision.content.into_iter().enumerate() {
                        let Some(position) = nested.iter().position(|n| n.index == index) else {
                            output.push(inline.into());
                            continue;
                        };
                        // A format change on unwrapped content becomes a top-level change
                        let mut change = nested.swap_remove(position).revision;
                        if self.policy.accepts(change.kind) && selected(&change) {
                            summary.unwrapped += 1;
                            summary.resolved_ids.push(change.id);
                            output.push(inline.into());
                        } else {
                            summary.kept += 1;
                            change.content = vec![inline];
                            output.push(ContentItem::Revision(change));
                        }
                    }
                }
                Resolution::Drop => {
                    summary.dropped += 1;
                    summary
                        .resolved_ids
                        .extend(revision.nested_changes.iter().map(|n| n.revision.id));
                }
            }
        }

        (output, summary)
    }
}
