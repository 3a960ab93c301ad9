//! Tracked edit helpers
//!
//! `TrackedEditor` borrows a registry and turns plain edits into content
//! carrying registered revisions. With tracking disabled the same calls
//! produce plain content.

use crate::{
    ContentItem, DiffEngine, DiffKind, Result, Revision, RevisionKind, RevisionRegistry,
    TrackedParagraph,
};
use doc_model::{CharacterProperties, InlineContent, ParagraphProperties, Run};

/// Records edits against a borrowed registry
#[derive(Debug)]
pub struct TrackedEditor<'a> {
    registry: &'a mut RevisionRegistry,
}

impl<'a> TrackedEditor<'a> {
    pub fn new(registry: &'a mut RevisionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RevisionRegistry {
        self.registry
    }

    fn author(&self) -> String {
        self.registry.current_author().to_string()
    }

    fn plain(content: Vec<InlineContent>) -> Vec<ContentItem> {
        content.into_iter().map(ContentItem::from).collect()
    }

    /// Insert content as a tracked insertion
    pub fn insert(&mut self, content: Vec<InlineContent>) -> Result<Vec<ContentItem>> {
        if !self.registry.is_tracking() {
            return Ok(Self::plain(content));
        }
        let revision = Revision::insert(self.author(), content)?;
        Ok(vec![self.registry.register(revision).into()])
    }

    /// Delete content; with tracking on it stays visible inside a deletion
    pub fn delete(&mut self, content: Vec<InlineContent>) -> Result<Vec<ContentItem>> {
        if !self.registry.is_tracking() {
            return Ok(Vec::new());
        }
        let revision = Revision::delete(self.author(), content)?;
        Ok(vec![self.registry.register(revision).into()])
    }

    /// Delete a field instruction
    pub fn delete_field_instruction(&mut self, instruction: Run) -> Result<Vec<ContentItem>> {
        if !self.registry.is_tracking() {
            return Ok(Vec::new());
        }
        let revision = Revision::delete(self.author(), vec![instruction.into()])?
            .with_field_instruction(true);
        Ok(vec![self.registry.register(revision).into()])
    }

    /// Move content, returning the source and destination items
    pub fn move_content(
        &mut self,
        move_id: &str,
        content: Vec<InlineContent>,
    ) -> Result<(Vec<ContentItem>, Vec<ContentItem>)> {
        if !self.registry.is_tracking() {
            return Ok((Vec::new(), Self::plain(content)));
        }
        let author = self.author();
        let from = Revision::move_from(&author, move_id, content.clone())?.with_move_location(move_id);
        let to = Revision::move_to(&author, move_id, content)?.with_move_location(move_id);
        let from = self.registry.register(from);
        let to = self.registry.register(to);
        Ok((vec![from.into()], vec![to.into()]))
    }

    /// Replace the text of a run, tracking only what changed.
    ///
    /// Unchanged prefix and suffix stay plain runs. When the old and new text
    /// share nothing the whole run is deleted and the new one inserted.
    pub fn replace_text(&mut self, run: &Run, new_text: &str) -> Result<Vec<ContentItem>> {
        if !self.registry.is_tracking() {
            return Ok(if new_text.is_empty() {
                Vec::new()
            } else {
                vec![run.with_same_format(new_text).into()]
            });
        }

        let segments = DiffEngine::diff(&run.text, new_text);
        if !DiffEngine::has_common_region(&segments) {
            let mut items = Vec::new();
            if !run.is_empty() {
                items.extend(self.delete(vec![run.clone().into()])?);
            }
            if !new_text.is_empty() {
                items.extend(self.insert(vec![run.with_same_format(new_text).into()])?);
            }
            return Ok(items);
        }

        let mut items = Vec::with_capacity(segments.len());
        for segment in segments {
            let piece = run.with_same_format(segment.text);
            match segment.kind {
                DiffKind::Equal => items.push(piece.into()),
                DiffKind::Delete => items.extend(self.delete(vec![piece.into()])?),
                DiffKind::Insert => items.extend(self.insert(vec![piece.into()])?),
            }
        }
        Ok(items)
    }

    /// Apply new character formatting to a run
    pub fn format_run(&mut self, run: &Run, properties: CharacterProperties) -> Result<ContentItem> {
        let formatted = Run::with_properties(run.text.clone(), properties);
        if !self.registry.is_tracking() || formatted.properties == run.properties {
            return Ok(formatted.into());
        }
        let revision = Revision::property_change(
            RevisionKind::RunPropertyChange,
            self.author(),
            vec![formatted.clone().into()],
            Some(run.properties.to_property_map()),
            Some(formatted.properties.to_property_map()),
        )?;
        Ok(self.registry.register(revision).into())
    }

    /// Change paragraph properties, recording the previous ones.
    ///
    /// A pending paragraph change keeps its original previous properties.
    pub fn set_paragraph_properties(
        &mut self,
        paragraph: &mut TrackedParagraph,
        properties: ParagraphProperties,
    ) -> Result<()> {
        if self.registry.is_tracking() && paragraph.property_change.is_none() {
            let revision = Revision::property_change(
                RevisionKind::ParagraphPropertyChange,
                self.author(),
                Vec::new(),
                Some(paragraph.properties.to_property_map()),
                Some(properties.to_property_map()),
            )?;
            paragraph.property_change = Some(self.registry.register(revision));
        } else if let Some(change) = paragraph.property_change.as_mut() {
            let new_properties = properties.to_property_map();
            if let Some(registered) = self.registry.get_mut(change.id) {
                registered.new_properties = Some(new_properties.clone());
            }
            change.new_properties = Some(new_properties);
        }
        paragraph.properties = properties;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RevisionId;
    use doc_model::{Alignment, PropertyValue};

    fn kinds(items: &[ContentItem]) -> Vec<Option<RevisionKind>> {
        items.iter().map(|i| i.as_revision().map(|r| r.kind)).collect()
    }

    #[test]
    fn test_replace_text_granular() {
        let mut registry = RevisionRegistry::with_author("Ann");
        let mut editor = TrackedEditor::new(&mut registry);
        let items = editor
            .replace_text(&Run::new("The quick fox"), "The slow fox")
            .unwrap();

        assert_eq!(
            kinds(&items),
            vec![None, Some(RevisionKind::Delete), Some(RevisionKind::Insert), None]
        );
        assert_eq!(items[1].text(), "quick");
        assert_eq!(items[2].text(), "slow");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_replace_text_whole_unit_fallback() {
        let mut registry = RevisionRegistry::with_author("Ann");
        let bold = CharacterProperties {
            bold: Some(true),
            ..Default::default()
        };
        let run = Run::with_properties("abc", bold.clone());
        let items = TrackedEditor::new(&mut registry).replace_text(&run, "xyz").unwrap();

        assert_eq!(kinds(&items), vec![Some(RevisionKind::Delete), Some(RevisionKind::Insert)]);
        let inserted = items[1].as_revision().unwrap();
        assert_eq!(inserted.content[0].runs()[0].properties, bold);
    }

    #[test]
    fn test_untracked_edits_are_plain() {
        let mut registry = RevisionRegistry::new();
        let mut editor = TrackedEditor::new(&mut registry);
        let items = editor.replace_text(&Run::new("old"), "new").unwrap();
        assert_eq!(items, vec![ContentItem::Run(Run::new("new"))]);
        assert!(editor.delete(vec![Run::new("x").into()]).unwrap().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_move_registers_pair() {
        let mut registry = RevisionRegistry::with_author("Ann");
        let (from, to) = TrackedEditor::new(&mut registry)
            .move_content("move1", vec![Run::new("moved").into()])
            .unwrap();
        assert_eq!(from[0].as_revision().unwrap().id, RevisionId::new(0));
        assert_eq!(to[0].as_revision().unwrap().id, RevisionId::new(1));
        assert!(registry.move_pair("move1").is_complete());
    }

    #[test]
    fn test_format_run_records_previous_properties() {
        let mut registry = RevisionRegistry::with_author("Ann");
        let bold = CharacterProperties {
            bold: Some(true),
            ..Default::default()
        };
        let item = TrackedEditor::new(&mut registry)
            .format_run(&Run::new("x"), bold)
            .unwrap();
        let revision = item.as_revision().unwrap();
        assert_eq!(revision.kind, RevisionKind::RunPropertyChange);
        assert!(revision.previous_properties.as_ref().unwrap().is_empty());
        assert_eq!(
            revision.new_properties.as_ref().unwrap().get("b"),
            Some(&PropertyValue::Toggle(true))
        );
    }

    #[test]
    fn test_paragraph_change_keeps_first_previous() {
        let mut registry = RevisionRegistry::with_author("Ann");
        let mut paragraph = TrackedParagraph::new();
        let mut editor = TrackedEditor::new(&mut registry);

        let centered = ParagraphProperties {
            alignment: Some(Alignment::Center),
            ..Default::default()
        };
        editor.set_paragraph_properties(&mut paragraph, centered).unwrap();
        let right = ParagraphProperties {
            alignment: Some(Alignment::Right),
            ..Default::default()
        };
        editor.set_paragraph_properties(&mut paragraph, right).unwrap();

        let change = paragraph.property_change.as_ref().unwrap();
        assert!(change.previous_properties.as_ref().unwrap().is_empty());
        assert_eq!(
            change.new_properties.as_ref().unwrap().get("jc"),
            Some(&PropertyValue::value("right"))
        );
        assert_eq!(registry.len(), 1);

        let registered = registry.get(change.id).unwrap();
        assert_eq!(registered.new_properties, change.new_properties);
        assert_eq!(registered.previous_properties, change.previous_properties);
    }
}
