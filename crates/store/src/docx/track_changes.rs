//! Track Changes import for DOCX
//!
//! Parses `w:p` fragments into `TrackedParagraph`s. DOCX stores tracked
//! changes inline in the document content, so a single pass over the
//! paragraph recovers plain runs, hyperlinks, revision wrappers, run-level
//! format changes and the paragraph-level `w:pPrChange`. Every revision is
//! registered in the caller's registry, which assigns its id.
//!
//! Property elements with children (`w:tabs`, the paragraph mark `w:rPr`,
//! `w:sectPr`, ...) are kept as their source markup. A revision wrapper
//! inside a hyperlink splits the hyperlink so that the wrapped part lands
//! in its own revision.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::properties_io::{is_nested_property, read_nested_child, read_property};
use crate::docx::reader::XmlParser;
use crate::docx::track_changes_writer::{cell_marker_name, change_element_names};
use chrono::{DateTime, NaiveDateTime, Utc};
use doc_model::{
    CharacterProperties, Hyperlink, HyperlinkTarget, InlineContent, ParagraphProperties,
    PropertyMap, PropertyValue, Run,
};
use quick_xml::events::{BytesStart, Event};
use revisions::{ContentItem, Revision, RevisionKind, RevisionRegistry, TrackedParagraph};

/// Author and date of a change element
#[derive(Debug, Clone, Default)]
struct ChangeHeader {
    id: Option<u64>,
    author: String,
    date: Option<DateTime<Utc>>,
}

impl ChangeHeader {
    fn read(e: &BytesStart) -> Self {
        Self {
            id: XmlParser::get_w_attribute(e, "id").and_then(|s| s.parse().ok()),
            author: XmlParser::get_w_attribute(e, "author").unwrap_or_default(),
            date: XmlParser::get_w_attribute(e, "date").and_then(|s| parse_date(&s)),
        }
    }

    fn stamp(&self, revision: Revision) -> Revision {
        match self.date {
            Some(date) => revision.with_date(date),
            None => revision,
        }
    }
}

/// Parse a `w:date` value; fractional seconds and a missing zone are accepted
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        })
}

fn wrapper_kind(local: &str) -> Option<RevisionKind> {
    match local {
        "ins" => Some(RevisionKind::Insert),
        "del" => Some(RevisionKind::Delete),
        "moveFrom" => Some(RevisionKind::MoveFrom),
        "moveTo" => Some(RevisionKind::MoveTo),
        _ => None,
    }
}

fn cell_marker_kind(local: &str) -> Option<RevisionKind> {
    [
        RevisionKind::TableCellInsert,
        RevisionKind::TableCellDelete,
        RevisionKind::TableCellMerge,
    ]
    .into_iter()
    .find(|kind| cell_marker_name(*kind) == Some(local))
}

fn change_element_kind(local: &str) -> Option<RevisionKind> {
    RevisionKind::ALL
        .into_iter()
        .find(|kind| change_element_names(*kind).map(|(element, _)| element) == Some(local))
}

/// Where a property element being read belongs
#[derive(Debug, Clone, Copy, PartialEq)]
enum PropsTarget {
    Paragraph,
    ParagraphChange,
    Run,
    RunChange,
}

#[derive(Debug)]
enum Ctx {
    Paragraph,
    Props(PropsTarget),
    ParagraphChange,
    RunChange,
    Nested(PropsTarget, String, Vec<(String, String)>),
    /// Property element with children; the offset is where its start tag begins
    Raw(PropsTarget, String, usize),
    Wrapper,
    Hyperlink,
    /// Revision wrapper inside a hyperlink; true when it opened its own wrapper
    LinkWrapper(bool),
    Run,
    Text,
    Skip,
}

#[derive(Debug, Default)]
struct RunState {
    text: String,
    properties: PropertyMap,
    change: Option<(ChangeHeader, PropertyMap)>,
}

#[derive(Debug)]
struct WrapperState {
    kind: RevisionKind,
    header: ChangeHeader,
    content: Vec<InlineContent>,
    field_instruction: bool,
    move_name: Option<String>,
    /// Registered format changes on items of `content`
    nested_changes: Vec<(usize, Revision)>,
}

impl WrapperState {
    fn open(kind: RevisionKind, e: &BytesStart, pending_move_name: &mut Option<String>) -> Self {
        let move_name = if kind.is_move() {
            pending_move_name.take()
        } else {
            None
        };
        Self {
            kind,
            header: ChangeHeader::read(e),
            content: Vec::new(),
            field_instruction: false,
            move_name,
            nested_changes: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct HyperlinkState {
    link: Hyperlink,
    change: Option<(ChangeHeader, PropertyMap)>,
    /// Part of the link was already emitted around a revision wrapper
    split: bool,
}

#[derive(Debug, Default)]
struct ParagraphState {
    properties: PropertyMap,
    change: Option<(ChangeHeader, PropertyMap)>,
    content: Vec<ContentItem>,
}

/// Parser for paragraphs carrying tracked changes
#[derive(Debug, Default)]
pub struct TrackChangesParser;

impl TrackChangesParser {
    /// Create a new track changes parser
    pub fn new() -> Self {
        Self
    }

    /// Parse the first `w:p` in a fragment
    pub fn parse_paragraph(
        &self,
        xml: &str,
        registry: &mut RevisionRegistry,
    ) -> DocxResult<TrackedParagraph> {
        self.parse_paragraphs(xml, registry)?
            .into_iter()
            .next()
            .ok_or_else(|| DocxError::InvalidStructure("no w:p element".to_string()))
    }

    /// Parse every `w:p` in a fragment, in document order
    pub fn parse_paragraphs(
        &self,
        xml: &str,
        registry: &mut RevisionRegistry,
    ) -> DocxResult<Vec<TrackedParagraph>> {
        let mut reader = XmlParser::from_string_preserving(xml);
        let mut buf = Vec::new();

        let mut paragraphs = Vec::new();
        let mut stack: Vec<Ctx> = Vec::new();
        let mut paragraph = ParagraphState::default();
        let mut run: Option<RunState> = None;
        let mut wrapper: Option<WrapperState> = None;
        let mut hyperlink: Option<HyperlinkState> = None;
        let mut pending_move_name: Option<String> = None;

        loop {
            let position = reader.buffer_position() as usize;
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    let local = XmlParser::local_name(name.as_ref());

                    let in_paragraph = stack.iter().any(|c| matches!(c, Ctx::Paragraph));

                    let ctx = match (stack.last(), local, wrapper_kind(local)) {
                        (_, "p", _) if !in_paragraph => {
                            paragraph = ParagraphState::default();
                            Ctx::Paragraph
                        }
                        (None, _, _) | (Some(Ctx::Skip | Ctx::Raw(..)), _, _) => Ctx::Skip,
                        (Some(Ctx::Paragraph), "pPr", _) => Ctx::Props(PropsTarget::Paragraph),
                        (Some(Ctx::Props(PropsTarget::Paragraph)), "pPrChange", _) => {
                            paragraph.change = Some((ChangeHeader::read(e), PropertyMap::new()));
                            Ctx::ParagraphChange
                        }
                        (Some(Ctx::ParagraphChange), "pPr", _) => {
                            Ctx::Props(PropsTarget::ParagraphChange)
                        }
                        (Some(Ctx::Props(PropsTarget::Run)), "rPrChange", _) => {
                            if let Some(ref mut state) = run {
                                state.change = Some((ChangeHeader::read(e), PropertyMap::new()));
                            }
                            Ctx::RunChange
                        }
                        (Some(Ctx::RunChange), "rPr", _) => Ctx::Props(PropsTarget::RunChange),
                        (Some(Ctx::Props(target)), _, _) if is_nested_property(local) => {
                            Ctx::Nested(*target, local.to_string(), Vec::new())
                        }
                        (Some(Ctx::Props(target)), _, _) => {
                            Ctx::Raw(*target, local.to_string(), position)
                        }
                        (Some(Ctx::Paragraph), _, Some(kind)) => {
                            wrapper = Some(WrapperState::open(kind, e, &mut pending_move_name));
                            Ctx::Wrapper
                        }
                        (Some(Ctx::Hyperlink), _, Some(kind)) => {
                            // Inside an outer wrapper the runs simply stay in the link
                            let opens = wrapper.is_none();
                            if opens {
                                if let Some(ref mut link) = hyperlink {
                                    link.split = true;
                                    flush_hyperlink(link, &mut paragraph, registry)?;
                                }
                                wrapper = Some(WrapperState::open(kind, e, &mut pending_move_name));
                            }
                            Ctx::LinkWrapper(opens)
                        }
                        (Some(Ctx::Paragraph | Ctx::Wrapper), "hyperlink", _) => {
                            hyperlink = Some(HyperlinkState {
                                link: read_hyperlink(e),
                                change: None,
                                split: false,
                            });
                            Ctx::Hyperlink
                        }
                        (
                            Some(Ctx::Paragraph | Ctx::Wrapper | Ctx::Hyperlink | Ctx::LinkWrapper(_)),
                            "r",
                            _,
                        ) => {
                            run = Some(RunState::default());
                            Ctx::Run
                        }
                        (Some(Ctx::Run), "rPr", _) => Ctx::Props(PropsTarget::Run),
                        (Some(Ctx::Run), "t" | "delText" | "instrText" | "delInstrText", _) => {
                            if local == "delInstrText" {
                                if let Some(ref mut state) = wrapper {
                                    state.field_instruction = true;
                                }
                            }
                            Ctx::Text
                        }
                        _ => Ctx::Skip,
                    };
                    stack.push(ctx);
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    let local = XmlParser::local_name(name.as_ref());

                    let in_paragraph = stack.iter().any(|c| matches!(c, Ctx::Paragraph));
                    if local == "p" && !in_paragraph {
                        paragraphs.push(TrackedParagraph::new());
                        buf.clear();
                        continue;
                    }

                    match stack.last_mut() {
                        Some(Ctx::Props(target)) => {
                            let target = *target;
                            if target == PropsTarget::Paragraph && local == "pPrChange" {
                                paragraph.change = Some((ChangeHeader::read(e), PropertyMap::new()));
                            } else if target == PropsTarget::Run && local == "rPrChange" {
                                if let Some(ref mut state) = run {
                                    state.change = Some((ChangeHeader::read(e), PropertyMap::new()));
                                }
                            } else {
                                let (name, value) = read_property(e);
                                insert_property(
                                    target,
                                    name,
                                    value,
                                    &mut paragraph,
                                    run.as_mut(),
                                );
                            }
                        }
                        Some(Ctx::Nested(_, _, attrs)) => attrs.push(read_nested_child(e)),
                        Some(Ctx::Paragraph) => {
                            if local == "moveFromRangeStart" || local == "moveToRangeStart" {
                                pending_move_name = XmlParser::get_w_attribute(e, "name");
                            } else if let Some(kind) = cell_marker_kind(local) {
                                let header = ChangeHeader::read(e);
                                let revision = header.stamp(Revision::table_cell(kind, header.author.clone())?);
                                paragraph.content.push(registry.register(revision).into());
                            }
                        }
                        Some(Ctx::Run) if local == "tab" => {
                            if let Some(ref mut state) = run {
                                state.text.push('\t');
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(Ctx::Text) = stack.last() {
                        let text = e
                            .unescape()
                            .map_err(|e| DocxError::XmlParse(e.to_string()))?;
                        if let Some(ref mut state) = run {
                            state.text.push_str(&text);
                        }
                    }
                }
                Ok(Event::End(_)) => match stack.pop() {
                    Some(Ctx::Paragraph) => {
                        paragraphs.push(finish_paragraph(std::mem::take(&mut paragraph), registry)?);
                    }
                    Some(Ctx::Nested(target, name, attrs)) => {
                        insert_property(
                            target,
                            name,
                            PropertyValue::Attributes(attrs),
                            &mut paragraph,
                            run.as_mut(),
                        );
                    }
                    Some(Ctx::Raw(target, name, start)) => {
                        let end = reader.buffer_position() as usize;
                        match xml.get(start..end) {
                            Some(source) => insert_property(
                                target,
                                name,
                                PropertyValue::Raw(source.to_string()),
                                &mut paragraph,
                                run.as_mut(),
                            ),
                            None => tracing::warn!("Dropping w:{} with an unreadable source range", name),
                        }
                    }
                    Some(Ctx::LinkWrapper(true)) => {
                        if let Some(state) = wrapper.take() {
                            close_link_wrapper(state, hyperlink.as_mut(), &mut paragraph, registry)?;
                        }
                    }
                    Some(Ctx::Run) => {
                        if let Some(state) = run.take() {
                            place_run(
                                state,
                                stack.last(),
                                &mut paragraph,
                                wrapper.as_mut(),
                                hyperlink.as_mut(),
                                registry,
                            )?;
                        }
                    }
                    Some(Ctx::Hyperlink) => {
                        if let Some(state) = hyperlink.take() {
                            place_hyperlink(state, stack.last(), &mut paragraph, wrapper.as_mut(), registry)?;
                        }
                    }
                    Some(Ctx::Wrapper) => {
                        if let Some(state) = wrapper.take() {
                            finish_wrapper(state, &mut paragraph, registry)?;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocxError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(paragraphs)
    }

    /// Parse a standalone change element (`w:tblPrChange`, `w:cellDel`, ...)
    pub fn parse_change_element(
        &self,
        xml: &str,
        registry: &mut RevisionRegistry,
    ) -> DocxResult<Revision> {
        let mut reader = XmlParser::from_string_preserving(xml);
        let mut buf = Vec::new();

        let mut current: Option<(RevisionKind, ChangeHeader)> = None;
        let mut previous = PropertyMap::new();
        let mut nested: Option<(String, Vec<(String, String)>)> = None;
        let mut raw: Option<(String, usize)> = None;
        let mut depth = 0usize;

        loop {
            let position = reader.buffer_position() as usize;
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    let local = XmlParser::local_name(name.as_ref());
                    if current.is_none() {
                        let kind = change_element_kind(local).ok_or_else(|| {
                            DocxError::UnsupportedFeature(format!("change element w:{}", local))
                        })?;
                        current = Some((kind, ChangeHeader::read(e)));
                    } else if depth == 2 && is_nested_property(local) {
                        nested = Some((local.to_string(), Vec::new()));
                    } else if depth == 2 {
                        raw = Some((local.to_string(), position));
                    }
                    depth += 1;
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    let local = XmlParser::local_name(name.as_ref());
                    if current.is_none() {
                        let kind = cell_marker_kind(local)
                            .or_else(|| change_element_kind(local))
                            .ok_or_else(|| {
                                DocxError::UnsupportedFeature(format!("change element w:{}", local))
                            })?;
                        current = Some((kind, ChangeHeader::read(e)));
                        break;
                    } else if raw.is_none() {
                        if let Some((_, ref mut attrs)) = nested {
                            attrs.push(read_nested_child(e));
                        } else if depth == 2 {
                            let (name, value) = read_property(e);
                            previous.insert(name, value);
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    depth = depth.saturating_sub(1);
                    if depth == 2 {
                        if let Some((name, start)) = raw.take() {
                            let end = reader.buffer_position() as usize;
                            if let Some(source) = xml.get(start..end) {
                                previous.insert(name, PropertyValue::Raw(source.to_string()));
                            }
                        } else if let Some((name, attrs)) = nested.take() {
                            previous.insert(name, PropertyValue::Attributes(attrs));
                        }
                    }
                    if depth == 0 {
                        break;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocxError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        let (kind, header) = current
            .ok_or_else(|| DocxError::InvalidStructure("empty change element".to_string()))?;
        let revision = if kind.is_table_cell_marker() {
            Revision::table_cell(kind, header.author.clone())?
        } else {
            Revision::property_change(kind, header.author.clone(), Vec::new(), Some(previous), None)?
        };
        Ok(registry.register(header.stamp(revision)))
    }
}

fn read_hyperlink(e: &BytesStart) -> Hyperlink {
    let target = match XmlParser::get_r_attribute(e, "id") {
        Some(id) => HyperlinkTarget::Relationship(id),
        None => HyperlinkTarget::Anchor(XmlParser::get_w_attribute(e, "anchor").unwrap_or_default()),
    };
    Hyperlink {
        target,
        tooltip: XmlParser::get_w_attribute(e, "tooltip"),
        runs: Vec::new(),
    }
}

fn insert_property(
    target: PropsTarget,
    name: String,
    value: PropertyValue,
    paragraph: &mut ParagraphState,
    run: Option<&mut RunState>,
) {
    match target {
        PropsTarget::Paragraph => {
            paragraph.properties.insert(name, value);
        }
        PropsTarget::ParagraphChange => {
            if let Some((_, ref mut previous)) = paragraph.change {
                previous.insert(name, value);
            }
        }
        PropsTarget::Run => {
            if let Some(state) = run {
                state.properties.insert(name, value);
            }
        }
        PropsTarget::RunChange => {
            if let Some((_, ref mut previous)) = run.and_then(|state| state.change.as_mut()) {
                previous.insert(name, value);
            }
        }
    }
}

fn place_run(
    state: RunState,
    parent: Option<&Ctx>,
    paragraph: &mut ParagraphState,
    wrapper: Option<&mut WrapperState>,
    hyperlink: Option<&mut HyperlinkState>,
    registry: &mut RevisionRegistry,
) -> DocxResult<()> {
    let run = Run::with_properties(state.text, CharacterProperties::from_property_map(&state.properties));

    match parent {
        Some(Ctx::Hyperlink | Ctx::LinkWrapper(_)) => {
            if let Some(link) = hyperlink {
                if link.change.is_none() {
                    link.change = state.change;
                }
                link.link.runs.push(run);
            }
        }
        Some(Ctx::Wrapper) => {
            if let Some(wrapper) = wrapper {
                if let Some((header, previous)) = state.change {
                    let revision = Revision::property_change(
                        RevisionKind::RunPropertyChange,
                        header.author.clone(),
                        vec![run.clone().into()],
                        Some(previous),
                        Some(state.properties),
                    )?;
                    let index = wrapper.content.len();
                    wrapper
                        .nested_changes
                        .push((index, registry.register(header.stamp(revision))));
                }
                wrapper.content.push(run.into());
            }
        }
        _ => match state.change {
            Some((header, previous)) => {
                let revision = Revision::property_change(
                    RevisionKind::RunPropertyChange,
                    header.author.clone(),
                    vec![run.into()],
                    Some(previous),
                    Some(state.properties),
                )?;
                paragraph
                    .content
                    .push(registry.register(header.stamp(revision)).into());
            }
            None => paragraph.content.push(run.into()),
        },
    }
    Ok(())
}

fn place_hyperlink(
    state: HyperlinkState,
    parent: Option<&Ctx>,
    paragraph: &mut ParagraphState,
    wrapper: Option<&mut WrapperState>,
    registry: &mut RevisionRegistry,
) -> DocxResult<()> {
    if state.split && state.link.runs.is_empty() {
        return Ok(());
    }
    if let (Some(Ctx::Wrapper), Some(wrapper)) = (parent, wrapper) {
        wrapper.content.push(state.link.into());
        return Ok(());
    }
    match state.change {
        Some((header, previous)) => {
            let revision = Revision::property_change(
                RevisionKind::RunPropertyChange,
                header.author.clone(),
                vec![state.link.into()],
                Some(previous),
                None,
            )?;
            paragraph
                .content
                .push(registry.register(header.stamp(revision)).into());
        }
        None => paragraph.content.push(state.link.into()),
    }
    Ok(())
}

/// Take the runs read so far out of a hyperlink
fn take_segment(state: &mut HyperlinkState) -> Option<Hyperlink> {
    if state.link.runs.is_empty() {
        return None;
    }
    Some(Hyperlink {
        target: state.link.target.clone(),
        tooltip: state.link.tooltip.clone(),
        runs: std::mem::take(&mut state.link.runs),
    })
}

/// Emit the part of a hyperlink in front of a revision wrapper
fn flush_hyperlink(
    state: &mut HyperlinkState,
    paragraph: &mut ParagraphState,
    registry: &mut RevisionRegistry,
) -> DocxResult<()> {
    let Some(link) = take_segment(state) else {
        return Ok(());
    };
    let segment = HyperlinkState {
        link,
        change: state.change.take(),
        split: false,
    };
    place_hyperlink(segment, Some(&Ctx::Paragraph), paragraph, None, registry)
}

/// Close a wrapper opened inside a hyperlink; its runs become a hyperlink
/// of the same target inside the revision
fn close_link_wrapper(
    mut state: WrapperState,
    hyperlink: Option<&mut HyperlinkState>,
    paragraph: &mut ParagraphState,
    registry: &mut RevisionRegistry,
) -> DocxResult<()> {
    if let Some(link) = hyperlink {
        if let Some(segment) = take_segment(link) {
            if let Some((header, previous)) = link.change.take() {
                let revision = Revision::property_change(
                    RevisionKind::RunPropertyChange,
                    header.author.clone(),
                    vec![segment.clone().into()],
                    Some(previous),
                    None,
                )?;
                let index = state.content.len();
                state
                    .nested_changes
                    .push((index, registry.register(header.stamp(revision))));
            }
            state.content.push(segment.into());
        }
    }
    finish_wrapper(state, paragraph, registry)
}

fn finish_wrapper(
    state: WrapperState,
    paragraph: &mut ParagraphState,
    registry: &mut RevisionRegistry,
) -> DocxResult<()> {
    if state.content.is_empty() {
        tracing::debug!("Skipping empty {} wrapper", state.kind.display_name());
        return Ok(());
    }
    let author = state.header.author.clone();
    let revision = match state.kind {
        RevisionKind::MoveFrom | RevisionKind::MoveTo => {
            let name = state.move_name.clone().unwrap_or_else(|| {
                format!("move{}", state.header.id.unwrap_or_default())
            });
            let revision = if state.kind == RevisionKind::MoveFrom {
                Revision::move_from(author, name.clone(), state.content)?
            } else {
                Revision::move_to(author, name.clone(), state.content)?
            };
            revision.with_move_location(name)
        }
        RevisionKind::Delete => {
            Revision::delete(author, state.content)?.with_field_instruction(state.field_instruction)
        }
        _ => Revision::insert(author, state.content)?,
    };
    let revision = state
        .nested_changes
        .into_iter()
        .fold(revision, |revision, (index, change)| {
            revision.with_nested_change(index, change)
        });
    paragraph
        .content
        .push(registry.register(state.header.stamp(revision)).into());
    Ok(())
}

fn finish_paragraph(
    state: ParagraphState,
    registry: &mut RevisionRegistry,
) -> DocxResult<TrackedParagraph> {
    let mut paragraph = TrackedParagraph::with_content(state.content);
    paragraph.properties = ParagraphProperties::from_property_map(&state.properties);
    if let Some((header, previous)) = state.change {
        let revision = Revision::property_change(
            RevisionKind::ParagraphPropertyChange,
            header.author.clone(),
            Vec::new(),
            Some(previous),
            Some(state.properties),
        )?;
        paragraph.property_change = Some(registry.register(header.stamp(revision)));
    }
    Ok(paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::track_changes_writer::TrackChangesWriter;
    use chrono::TimeZone;
    use doc_model::Alignment;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn parse(body: &str) -> (TrackedParagraph, RevisionRegistry) {
        let mut registry = RevisionRegistry::new();
        let xml = format!("<w:p {}>{}</w:p>", W, body);
        let paragraph = TrackChangesParser::new()
            .parse_paragraph(&xml, &mut registry)
            .unwrap();
        (paragraph, registry)
    }

    #[test]
    fn test_parse_date() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_date("2024-01-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_date("2024-01-15T10:30:00"), Some(expected));
        assert!(parse_date("2024-01-15T10:30:00.5Z").is_some());
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_parse_insert_and_delete() {
        let (paragraph, registry) = parse(concat!(
            r#"<w:r><w:t xml:space="preserve">Keep </w:t></w:r>"#,
            r#"<w:ins w:id="12" w:author="Ann" w:date="2024-01-15T10:30:00Z"><w:r><w:t>new</w:t></w:r></w:ins>"#,
            r#"<w:del w:id="13" w:author="Bob"><w:r><w:delText>old &amp; gone</w:delText></w:r></w:del>"#,
        ));

        assert_eq!(paragraph.content.len(), 3);
        assert_eq!(paragraph.content[0].text(), "Keep ");
        let inserted = paragraph.content[1].as_revision().unwrap();
        assert_eq!(inserted.kind, RevisionKind::Insert);
        assert_eq!(inserted.author, "Ann");
        assert_eq!(inserted.id.value(), 0);
        let deleted = paragraph.content[2].as_revision().unwrap();
        assert_eq!(deleted.text(), "old & gone");
        assert!(!deleted.field_instruction);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_parse_move_uses_range_name() {
        let (paragraph, registry) = parse(concat!(
            r#"<w:moveFromRangeStart w:id="1" w:author="Ann" w:name="move1"/>"#,
            r#"<w:moveFrom w:id="2" w:author="Ann"><w:r><w:t>x</w:t></w:r></w:moveFrom>"#,
            r#"<w:moveFromRangeEnd w:id="1"/>"#,
            r#"<w:moveToRangeStart w:id="3" w:author="Ann" w:name="move1"/>"#,
            r#"<w:moveTo w:id="4" w:author="Ann"><w:r><w:t>x</w:t></w:r></w:moveTo>"#,
            r#"<w:moveToRangeEnd w:id="3"/>"#,
        ));
        assert_eq!(paragraph.content.len(), 2);
        assert!(registry.move_pair("move1").is_complete());
        assert_eq!(
            paragraph.content[0].as_revision().unwrap().move_location.as_deref(),
            Some("move1")
        );
    }

    #[test]
    fn test_parse_run_property_change() {
        let (paragraph, _) = parse(concat!(
            r#"<w:r><w:rPr><w:b/><w:sz w:val="28"/>"#,
            r#"<w:rPrChange w:id="5" w:author="Ann"><w:rPr><w:i/></w:rPr></w:rPrChange>"#,
            r#"</w:rPr><w:t>bold</w:t></w:r>"#,
        ));
        let revision = paragraph.content[0].as_revision().unwrap();
        assert_eq!(revision.kind, RevisionKind::RunPropertyChange);
        assert_eq!(
            revision.previous_properties.as_ref().unwrap().get("i"),
            Some(&PropertyValue::Toggle(true))
        );
        let run = &revision.content[0].runs()[0];
        assert_eq!(run.properties.bold, Some(true));
        assert_eq!(run.properties.font_size, Some(14.0));
    }

    #[test]
    fn test_parse_paragraph_change_with_numbering() {
        let (paragraph, _) = parse(concat!(
            r#"<w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr><w:jc w:val="center"/>"#,
            r#"<w:pPrChange w:id="9" w:author="Ann"><w:pPr><w:jc w:val="left"/></w:pPr></w:pPrChange>"#,
            r#"</w:pPr><w:r><w:t>x</w:t></w:r>"#,
        ));
        assert_eq!(paragraph.properties.alignment, Some(Alignment::Center));
        let numbering = paragraph.properties.numbering.as_ref().unwrap();
        assert_eq!(numbering.ilvl, Some(1));
        assert_eq!(numbering.num_id.map(|id| id.0), Some(3));

        let change = paragraph.property_change.as_ref().unwrap();
        assert_eq!(
            change.previous_properties.as_ref().unwrap().get("jc"),
            Some(&PropertyValue::value("left"))
        );
        assert!(change.new_properties.as_ref().unwrap().contains("numPr"));
    }

    #[test]
    fn test_parse_field_instruction_deletion() {
        let (paragraph, _) = parse(
            r#"<w:del w:id="1" w:author="Ann"><w:r><w:delInstrText xml:space="preserve"> PAGE </w:delInstrText></w:r></w:del>"#,
        );
        let revision = paragraph.content[0].as_revision().unwrap();
        assert!(revision.field_instruction);
        assert_eq!(revision.text(), " PAGE ");
    }

    #[test]
    fn test_empty_wrapper_is_skipped() {
        let (paragraph, registry) = parse(r#"<w:ins w:id="1" w:author="Ann"/><w:del w:id="2" w:author="Ann"></w:del>"#);
        assert!(paragraph.content.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parse_hyperlink_inside_insert() {
        let (paragraph, _) = parse(concat!(
            r#"<w:ins w:id="1" w:author="Ann"><w:hyperlink w:anchor="_Toc1">"#,
            r#"<w:r><w:t>see</w:t></w:r></w:hyperlink></w:ins>"#,
        ));
        let revision = paragraph.content[0].as_revision().unwrap();
        assert!(matches!(revision.content[0], InlineContent::Hyperlink(_)));
        assert_eq!(revision.text(), "see");
    }

    #[test]
    fn test_parse_change_element() {
        let mut registry = RevisionRegistry::new();
        let parser = TrackChangesParser::new();
        let revision = parser
            .parse_change_element(
                r#"<w:tcPrChange w:id="4" w:author="Ann"><w:tcPr><w:tcW w:w="2000" w:type="dxa"/></w:tcPr></w:tcPrChange>"#,
                &mut registry,
            )
            .unwrap();
        assert_eq!(revision.kind, RevisionKind::TableCellPropertyChange);
        assert!(revision.previous_properties.as_ref().unwrap().contains("tcW"));

        let marker = parser
            .parse_change_element(r#"<w:cellDel w:id="5" w:author="Bob"/>"#, &mut registry)
            .unwrap();
        assert_eq!(marker.kind, RevisionKind::TableCellDelete);
        assert_eq!(marker.id.value(), 1);

        assert!(parser
            .parse_change_element(r#"<w:bogus w:id="5"/>"#, &mut registry)
            .is_err());
    }

    #[test]
    fn test_parse_paragraphs_in_body_and_tables() {
        let xml = format!(
            concat!(
                "<w:body {}><w:p><w:r><w:t>one</w:t></w:r></w:p>",
                "<w:tbl><w:tr><w:tc><w:p><w:ins w:id=\"1\" w:author=\"Ann\"><w:r><w:t>two</w:t></w:r></w:ins></w:p></w:tc></w:tr></w:tbl>",
                "<w:p/></w:body>"
            ),
            W
        );
        let mut registry = RevisionRegistry::new();
        let paragraphs = TrackChangesParser::new()
            .parse_paragraphs(&xml, &mut registry)
            .unwrap();
        let texts: Vec<String> = paragraphs.iter().map(TrackedParagraph::text).collect();
        assert_eq!(texts, vec!["one", "two", ""]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_property_elements_with_children_survive() {
        let tabs = r#"<w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs>"#;
        let mark = r#"<w:rPr><w:b/><w:sz w:val="28"/></w:rPr>"#;
        let old_tabs = r#"<w:tabs><w:tab w:val="right" w:pos="9360"/></w:tabs>"#;
        let (paragraph, _) = parse(&format!(
            concat!(
                r#"<w:pPr><w:pStyle w:val="Heading1"/>{}<w:jc w:val="center"/>{}"#,
                r#"<w:pPrChange w:id="9" w:author="Ann"><w:pPr>{}</w:pPr></w:pPrChange>"#,
                r#"</w:pPr><w:r><w:t>x</w:t></w:r>"#,
            ),
            tabs, mark, old_tabs
        ));

        assert_eq!(paragraph.properties.alignment, Some(Alignment::Center));
        assert_eq!(
            paragraph.properties.extra.get("tabs"),
            Some(&PropertyValue::Raw(tabs.to_string()))
        );
        assert_eq!(
            paragraph.properties.extra.get("rPr"),
            Some(&PropertyValue::Raw(mark.to_string()))
        );
        let change = paragraph.property_change.as_ref().unwrap();
        assert_eq!(
            change.previous_properties.as_ref().unwrap().get("tabs"),
            Some(&PropertyValue::Raw(old_tabs.to_string()))
        );

        let written = TrackChangesWriter::new().write_paragraph(&paragraph);
        assert!(written.starts_with(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/>{}<w:jc w:val="center"/>{}<w:pPrChange "#,
            tabs, mark
        )));
        assert!(written.contains(&format!("<w:pPr>{}</w:pPr></w:pPrChange></w:pPr>", old_tabs)));
    }

    #[test]
    fn test_section_properties_survive() {
        let section = concat!(
            r#"<w:sectPr w:rsidR="00A1"><w:pgSz w:w="12240" w:h="15840"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440"/>"#,
            r#"<w:cols w:space="720"/></w:sectPr>"#,
        );
        let (paragraph, _) = parse(&format!(
            r#"<w:pPr><w:keepNext/>{}</w:pPr>"#,
            section
        ));
        assert_eq!(
            paragraph.properties.extra.get("sectPr").and_then(PropertyValue::as_raw),
            Some(section)
        );

        let written = TrackChangesWriter::new().write_paragraph(&paragraph);
        assert_eq!(
            written,
            format!(r#"<w:p><w:pPr><w:keepNext/>{}</w:pPr></w:p>"#, section)
        );
    }

    #[test]
    fn test_change_element_keeps_container_properties() {
        let tabs = r#"<w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs>"#;
        let mut registry = RevisionRegistry::new();
        let revision = TrackChangesParser::new()
            .parse_change_element(
                &format!(
                    r#"<w:pPrChange {} w:id="4" w:author="Ann"><w:pPr>{}<w:jc w:val="left"/></w:pPr></w:pPrChange>"#,
                    W, tabs
                ),
                &mut registry,
            )
            .unwrap();
        let previous = revision.previous_properties.as_ref().unwrap();
        assert_eq!(previous.get("tabs"), Some(&PropertyValue::Raw(tabs.to_string())));
        assert_eq!(previous.get("jc"), Some(&PropertyValue::value("left")));
    }

    #[test]
    fn test_revision_inside_hyperlink_splits_the_link() {
        let (paragraph, registry) = parse(concat!(
            r#"<w:hyperlink w:anchor="_Toc1"><w:r><w:t xml:space="preserve">see </w:t></w:r>"#,
            r#"<w:ins w:id="1" w:author="Ann"><w:r><w:t>here</w:t></w:r></w:ins></w:hyperlink>"#,
        ));

        assert_eq!(paragraph.text(), "see here");
        assert_eq!(registry.len(), 1);
        assert_eq!(paragraph.content.len(), 2);
        assert!(matches!(paragraph.content[0], ContentItem::Hyperlink(_)));
        let inserted = paragraph.content[1].as_revision().unwrap();
        assert_eq!(inserted.kind, RevisionKind::Insert);
        match &inserted.content[0] {
            InlineContent::Hyperlink(link) => {
                assert_eq!(link.target, HyperlinkTarget::Anchor("_Toc1".to_string()));
                assert_eq!(link.text(), "here");
            }
            other => panic!("expected a hyperlink, got {:?}", other),
        }
    }

    #[test]
    fn test_deletion_at_start_of_hyperlink() {
        let (paragraph, _) = parse(concat!(
            r#"<w:hyperlink w:anchor="a"><w:del w:id="1" w:author="Ann"><w:r><w:delText>old</w:delText></w:r></w:del>"#,
            r#"<w:r><w:t>new</w:t></w:r></w:hyperlink>"#,
        ));
        let kinds: Vec<Option<RevisionKind>> = paragraph
            .content
            .iter()
            .map(|item| item.as_revision().map(|r| r.kind))
            .collect();
        assert_eq!(kinds, vec![Some(RevisionKind::Delete), None]);
        assert_eq!(paragraph.content[0].text(), "old");
        assert_eq!(paragraph.content[1].text(), "new");
    }

    #[test]
    fn test_format_change_inside_insert_is_kept() {
        let (paragraph, registry) = parse(concat!(
            r#"<w:hyperlink w:anchor="a"><w:r><w:t xml:space="preserve">see </w:t></w:r>"#,
            r#"<w:ins w:id="1" w:author="Ann"><w:r><w:t>here</w:t></w:r></w:ins></w:hyperlink>"#,
            r#"<w:ins w:id="2" w:author="Ann"><w:r><w:rPr><w:b/>"#,
            r#"<w:rPrChange w:id="3" w:author="Bob"><w:rPr/></w:rPrChange></w:rPr>"#,
            r#"<w:t>bold</w:t></w:r></w:ins>"#,
        ));

        assert_eq!(paragraph.text(), "see herebold");
        assert_eq!(registry.len(), 3);

        let inserted = paragraph.content[2].as_revision().unwrap();
        assert_eq!(inserted.kind, RevisionKind::Insert);
        let format = inserted.nested_change(0).unwrap();
        assert_eq!(format.kind, RevisionKind::RunPropertyChange);
        assert_eq!(format.author, "Bob");
        assert!(format.previous_properties.as_ref().unwrap().is_empty());
        assert!(format.new_properties.as_ref().unwrap().contains("b"));
        assert!(registry.get(format.id).is_some());

        let written = TrackChangesWriter::new().write_paragraph(&paragraph);
        assert!(written.contains(r#"<w:r><w:rPr><w:b/><w:rPrChange w:id="#));
    }

    #[test]
    fn test_missing_paragraph() {
        let mut registry = RevisionRegistry::new();
        assert!(TrackChangesParser::new()
            .parse_paragraph("<w:r/>", &mut registry)
            .is_err());
    }
}
