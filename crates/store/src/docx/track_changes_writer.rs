//! Track Changes export for DOCX
//!
//! Serializes a `TrackedParagraph` to a `w:p` element. Revisions become
//! `w:ins`, `w:del`, `w:moveFrom`/`w:moveTo` (bracketed by their range
//! markers), run-level `w:rPrChange` inside the run's `w:rPr`, and the
//! paragraph-level `w:pPrChange` as the last child of `w:pPr`.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::properties_io::{escape_xml, escape_xml_attr, write_property_bag, write_property_map};
use chrono::{DateTime, SecondsFormat, Utc};
use doc_model::{
    Hyperlink, HyperlinkTarget, InlineContent, PropertyMap, Run, PARAGRAPH_PROPERTY_ORDER,
    RUN_PROPERTY_ORDER,
};
use revisions::{ContentItem, Revision, RevisionKind, RevisionSettings, TrackedParagraph};

/// Element names of a property change and the bag holding the previous values
pub fn change_element_names(kind: RevisionKind) -> Option<(&'static str, &'static str)> {
    match kind {
        RevisionKind::RunPropertyChange => Some(("rPrChange", "rPr")),
        RevisionKind::ParagraphPropertyChange => Some(("pPrChange", "pPr")),
        RevisionKind::TablePropertyChange => Some(("tblPrChange", "tblPr")),
        RevisionKind::TableExceptionPropertyChange => Some(("tblPrExChange", "tblPrEx")),
        RevisionKind::TableRowPropertyChange => Some(("trPrChange", "trPr")),
        RevisionKind::TableCellPropertyChange => Some(("tcPrChange", "tcPr")),
        RevisionKind::SectionPropertyChange => Some(("sectPrChange", "sectPr")),
        RevisionKind::NumberingChange => Some(("numberingChange", "numPr")),
        _ => None,
    }
}

/// Element name of a table cell marker
pub fn cell_marker_name(kind: RevisionKind) -> Option<&'static str> {
    match kind {
        RevisionKind::TableCellInsert => Some("cellIns"),
        RevisionKind::TableCellDelete => Some("cellDel"),
        RevisionKind::TableCellMerge => Some("cellMerge"),
        _ => None,
    }
}

fn bag_order(bag: &str) -> &'static [&'static str] {
    match bag {
        "rPr" => RUN_PROPERTY_ORDER,
        "pPr" => PARAGRAPH_PROPERTY_ORDER,
        _ => &[],
    }
}

/// Writer for tracked paragraphs
#[derive(Debug, Clone)]
pub struct TrackChangesWriter {
    strip_fractional_seconds: bool,
}

impl Default for TrackChangesWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackChangesWriter {
    /// Create a writer that emits whole-second dates
    pub fn new() -> Self {
        Self {
            strip_fractional_seconds: true,
        }
    }

    pub fn with_settings(settings: &RevisionSettings) -> Self {
        Self {
            strip_fractional_seconds: settings.strip_fractional_seconds,
        }
    }

    /// Format a revision date for `w:date`
    pub fn format_date(&self, date: &DateTime<Utc>) -> String {
        if self.strip_fractional_seconds {
            date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
        } else {
            date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        }
    }

    /// Serialize a paragraph
    pub fn write_paragraph(&self, paragraph: &TrackedParagraph) -> String {
        let mut xml = String::from("<w:p>");

        let properties = paragraph.properties.to_property_map();
        if !properties.is_empty() || paragraph.property_change.is_some() {
            xml.push_str("<w:pPr>");
            write_property_map(&mut xml, &properties, PARAGRAPH_PROPERTY_ORDER);
            if let Some(ref change) = paragraph.property_change {
                self.write_change_body(&mut xml, change, "pPrChange", "pPr");
            }
            xml.push_str("</w:pPr>");
        }

        for item in &paragraph.content {
            self.write_content_item(&mut xml, item);
        }

        xml.push_str("</w:p>");
        xml
    }

    /// Serialize one content item
    pub fn write_content_item(&self, xml: &mut String, item: &ContentItem) {
        match item {
            ContentItem::Run(run) => self.write_run(xml, run, "t", None),
            ContentItem::Hyperlink(link) => self.write_hyperlink(xml, link, "t", None),
            ContentItem::Revision(revision) => self.write_revision(xml, revision),
        }
    }

    /// Serialize a revision found in paragraph content
    pub fn write_revision(&self, xml: &mut String, revision: &Revision) {
        match revision.kind {
            RevisionKind::Insert => self.write_wrapper(xml, revision, "ins", "t"),
            RevisionKind::Delete => {
                let text_tag = if revision.field_instruction {
                    "delInstrText"
                } else {
                    "delText"
                };
                self.write_wrapper(xml, revision, "del", text_tag);
            }
            RevisionKind::MoveFrom => self.write_move(xml, revision, "moveFrom"),
            RevisionKind::MoveTo => self.write_move(xml, revision, "moveTo"),
            RevisionKind::RunPropertyChange => {
                for content in &revision.content {
                    self.write_inline(xml, content, "t", Some(revision));
                }
            }
            kind if kind.is_table_cell_marker() => {
                if let Some(name) = cell_marker_name(kind) {
                    xml.push_str(&format!("<w:{}{}/>", name, self.revision_attributes(revision)));
                }
            }
            _ => {
                // Container-level changes carry their own element; only the
                // affected content belongs in the paragraph.
                for content in &revision.content {
                    self.write_inline(xml, content, "t", None);
                }
            }
        }
    }

    /// Serialize a standalone change element (`w:tblPrChange`, `w:cellMerge`, ...)
    pub fn write_change_element(&self, xml: &mut String, revision: &Revision) -> DocxResult<()> {
        if let Some(name) = cell_marker_name(revision.kind) {
            xml.push_str(&format!("<w:{}{}/>", name, self.revision_attributes(revision)));
            return Ok(());
        }
        let (element, bag) = change_element_names(revision.kind).ok_or_else(|| {
            DocxError::UnsupportedFeature(format!(
                "{} has no standalone change element",
                revision.kind.display_name()
            ))
        })?;
        self.write_change_body(xml, revision, element, bag);
        Ok(())
    }

    fn write_change_body(&self, xml: &mut String, revision: &Revision, element: &str, bag: &str) {
        xml.push_str(&format!("<w:{}{}>", element, self.revision_attributes(revision)));
        let empty = PropertyMap::new();
        let previous = revision.previous_properties.as_ref().unwrap_or(&empty);
        write_property_bag(xml, bag, previous, bag_order(bag));
        xml.push_str(&format!("</w:{}>", element));
    }

    fn write_wrapper(&self, xml: &mut String, revision: &Revision, element: &str, text_tag: &str) {
        xml.push_str(&format!("<w:{}{}>", element, self.revision_attributes(revision)));
        for (index, content) in revision.content.iter().enumerate() {
            self.write_inline(xml, content, text_tag, revision.nested_change(index));
        }
        xml.push_str(&format!("</w:{}>", element));
    }

    fn write_move(&self, xml: &mut String, revision: &Revision, element: &str) {
        let name = revision
            .move_location
            .as_deref()
            .or(revision.move_id.as_deref())
            .unwrap_or_default();
        xml.push_str(&format!(
            r#"<w:{}RangeStart{} w:name="{}"/>"#,
            element,
            self.revision_attributes(revision),
            escape_xml_attr(name)
        ));
        self.write_wrapper(xml, revision, element, "t");
        xml.push_str(&format!(
            r#"<w:{}RangeEnd w:id="{}"/>"#,
            element,
            revision.id.value()
        ));
    }

    fn write_inline(
        &self,
        xml: &mut String,
        content: &InlineContent,
        text_tag: &str,
        change: Option<&Revision>,
    ) {
        match content {
            InlineContent::Run(run) => self.write_run(xml, run, text_tag, change),
            InlineContent::Hyperlink(link) => self.write_hyperlink(xml, link, text_tag, change),
        }
    }

    fn write_hyperlink(
        &self,
        xml: &mut String,
        link: &Hyperlink,
        text_tag: &str,
        change: Option<&Revision>,
    ) {
        xml.push_str("<w:hyperlink");
        match link.target {
            HyperlinkTarget::Relationship(ref id) => {
                xml.push_str(&format!(r#" r:id="{}""#, escape_xml_attr(id)))
            }
            HyperlinkTarget::Anchor(ref anchor) => {
                xml.push_str(&format!(r#" w:anchor="{}""#, escape_xml_attr(anchor)))
            }
        }
        if let Some(ref tooltip) = link.tooltip {
            xml.push_str(&format!(r#" w:tooltip="{}""#, escape_xml_attr(tooltip)));
        }
        xml.push('>');
        for run in &link.runs {
            self.write_run(xml, run, text_tag, change);
        }
        xml.push_str("</w:hyperlink>");
    }

    fn write_run(&self, xml: &mut String, run: &Run, text_tag: &str, change: Option<&Revision>) {
        xml.push_str("<w:r>");

        let properties = run.properties.to_property_map();
        if !properties.is_empty() || change.is_some() {
            xml.push_str("<w:rPr>");
            write_property_map(xml, &properties, RUN_PROPERTY_ORDER);
            if let Some(revision) = change {
                self.write_change_body(xml, revision, "rPrChange", "rPr");
            }
            xml.push_str("</w:rPr>");
        }

        if !run.text.is_empty() {
            let preserve = run.text.starts_with(char::is_whitespace)
                || run.text.ends_with(char::is_whitespace);
            if preserve {
                xml.push_str(&format!(r#"<w:{} xml:space="preserve">"#, text_tag));
            } else {
                xml.push_str(&format!("<w:{}>", text_tag));
            }
            xml.push_str(&escape_xml(&run.text));
            xml.push_str(&format!("</w:{}>", text_tag));
        }

        xml.push_str("</w:r>");
    }

    fn revision_attributes(&self, revision: &Revision) -> String {
        format!(
            r#" w:id="{}" w:author="{}" w:date="{}""#,
            revision.id.value(),
            escape_xml_attr(&revision.author),
            self.format_date(&revision.date)
        )
    }
}
