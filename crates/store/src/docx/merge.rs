//! Selective fidelity merge for definition-table parts
//!
//! A part loaded from disk may carry vendor attributes, extension elements
//! and namespace declarations the in-memory model never sees. Instead of
//! regenerating the part, the merger splits the original text into verbatim
//! pieces (`RawPart`) and only rewrites the top-level definitions the model
//! reports as modified, added or removed. Everything else is emitted
//! byte-for-byte.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::namespaces;
use crate::docx::numbering_writer::NumberingWriter;
use crate::docx::reader::XmlParser;
use doc_model::{AbstractNumId, DefinitionTier, NumId, NumberingRegistry};
use quick_xml::events::{BytesStart, Event};
use std::collections::HashSet;

// =============================================================================
// Raw part
// =============================================================================

/// One top-level child of a part's root element
#[derive(Debug, Clone, PartialEq)]
pub struct RawChild {
    /// Whitespace and comments between the previous child and this one
    pub leading: String,
    /// Exact source text of the element
    pub source: String,
    /// Qualified element name
    pub name: String,
    /// Attributes as (local name, unescaped value)
    pub attributes: Vec<(String, String)>,
}

impl RawChild {
    fn from_event(e: &BytesStart, leading: String, source: String) -> Self {
        Self {
            leading,
            source,
            name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
            attributes: XmlParser::local_attributes(e),
        }
    }

    pub fn local_name(&self) -> &str {
        XmlParser::local_name(self.name.as_bytes())
    }

    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == local)
            .map(|(_, v)| v.as_str())
    }
}

/// A part split into verbatim pieces: everything through the root start
/// tag, the root's element children, and everything from the root end tag.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPart {
    prolog: String,
    root_name: String,
    namespaces: Vec<(String, String)>,
    pub children: Vec<RawChild>,
    tail: String,
    epilog: String,
}

impl RawPart {
    /// Split a part. Reassembling an unchanged `RawPart` reproduces the input,
    /// except that a self-closing root is expanded to a start/end pair.
    pub fn parse(xml: &str) -> DocxResult<Self> {
        let mut reader = XmlParser::from_string_preserving(xml);

        let mut prolog: Option<(String, String, Vec<(String, String)>)> = None;
        let mut children = Vec::new();
        let mut leading = String::new();
        let mut open: Option<(usize, BytesStart<'_>)> = None;
        let mut depth = 0usize;

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event()?;
            let end = reader.buffer_position() as usize;

            match event {
                Event::Start(e) => {
                    depth += 1;
                    if depth == 1 {
                        prolog = Some((
                            xml[..end].to_string(),
                            String::from_utf8_lossy(e.name().as_ref()).to_string(),
                            declared_namespaces(&e),
                        ));
                    } else if depth == 2 {
                        open = Some((start, e));
                    }
                }
                Event::Empty(e) => match depth {
                    0 => {
                        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                        let tag = xml[start..end].trim_end_matches("/>").trim_end();
                        return Ok(Self {
                            prolog: format!("{}{}>", &xml[..start], tag),
                            namespaces: declared_namespaces(&e),
                            children: Vec::new(),
                            tail: String::new(),
                            epilog: format!("</{}>{}", name, &xml[end..]),
                            root_name: name,
                        });
                    }
                    1 => {
                        let source = xml[start..end].to_string();
                        children.push(RawChild::from_event(&e, std::mem::take(&mut leading), source));
                    }
                    _ => {}
                },
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        if let Some((child_start, e)) = open.take() {
                            let source = xml[child_start..end].to_string();
                            children.push(RawChild::from_event(&e, std::mem::take(&mut leading), source));
                        }
                    } else if depth == 0 {
                        let (prolog, root_name, namespaces) = prolog.ok_or_else(|| {
                            DocxError::InvalidStructure("end tag before root element".to_string())
                        })?;
                        return Ok(Self {
                            prolog,
                            root_name,
                            namespaces,
                            children,
                            tail: leading,
                            epilog: xml[start..].to_string(),
                        });
                    }
                }
                Event::Eof => break,
                _ => {
                    if depth == 1 {
                        leading.push_str(&xml[start..end]);
                    }
                }
            }
        }

        Err(DocxError::InvalidStructure(
            "part has no closed root element".to_string(),
        ))
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Namespace declarations on the root as (prefix, uri); the default namespace has an empty prefix
    pub fn namespaces(&self) -> &[(String, String)] {
        &self.namespaces
    }

    /// Declare a namespace on the root unless the prefix is already bound.
    ///
    /// Existing declarations are never touched.
    pub fn add_namespace(&mut self, prefix: &str, uri: &str) -> bool {
        if self.namespaces.iter().any(|(p, _)| p == prefix) || !self.prolog.ends_with('>') {
            return false;
        }
        let declaration = if prefix.is_empty() {
            format!(r#" xmlns="{}""#, uri)
        } else {
            format!(r#" xmlns:{}="{}""#, prefix, uri)
        };
        let at = self.prolog.len() - 1;
        self.prolog.insert_str(at, &declaration);
        self.namespaces.push((prefix.to_string(), uri.to_string()));
        true
    }

    /// Index of the first child with the given local name
    pub fn position_of(&self, local: &str) -> Option<usize> {
        self.children.iter().position(|c| c.local_name() == local)
    }

    /// Reassemble the part
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(
            self.prolog.len()
                + self.epilog.len()
                + self
                    .children
                    .iter()
                    .map(|c| c.leading.len() + c.source.len())
                    .sum::<usize>(),
        );
        xml.push_str(&self.prolog);
        for child in &self.children {
            xml.push_str(&child.leading);
            xml.push_str(&child.source);
        }
        xml.push_str(&self.tail);
        xml.push_str(&self.epilog);
        xml
    }
}

/// Whitespace directly in front of a child, after any comments or other nodes
fn indentation(leading: &str) -> &str {
    let start = leading
        .rfind(|c: char| !c.is_whitespace())
        .map_or(0, |i| i + 1);
    &leading[start..]
}

fn declared_namespaces(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .filter_map(|a| a.ok())
        .filter_map(|a| {
            let key = a.key.as_ref();
            let prefix = if key == b"xmlns" {
                String::new()
            } else {
                String::from_utf8_lossy(key.strip_prefix(b"xmlns:")?).to_string()
            };
            Some((prefix, String::from_utf8_lossy(&a.value).to_string()))
        })
        .collect()
}

// =============================================================================
// Merge schema and source
// =============================================================================

/// Where definitions live in a part and what must stay last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSchema {
    /// Template tier element, e.g. `abstractNum`
    pub definition_element: &'static str,
    pub definition_id: &'static str,
    /// Reference tier element, e.g. `num`; new templates go before the first one
    pub reference_element: &'static str,
    pub reference_id: &'static str,
    /// Element the schema requires as the last child, if any
    pub trailing_element: Option<&'static str>,
}

impl MergeSchema {
    /// Layout of the numbering part
    pub const NUMBERING: MergeSchema = MergeSchema {
        definition_element: "abstractNum",
        definition_id: "abstractNumId",
        reference_element: "num",
        reference_id: "numId",
        trailing_element: Some("numIdMacAtCleanup"),
    };

    /// Tier and id of a raw child, if it is a definition
    pub fn classify(&self, child: &RawChild) -> Option<(DefinitionTier, u32)> {
        let (tier, id_attr) = match child.local_name() {
            name if name == self.definition_element => (DefinitionTier::Abstract, self.definition_id),
            name if name == self.reference_element => (DefinitionTier::Instance, self.reference_id),
            _ => return None,
        };
        let id = child.attribute(id_attr)?.parse().ok()?;
        Some((tier, id))
    }
}

/// An in-memory definition table that can be merged into its raw part
pub trait MergeSource {
    /// Whether anything changed since the table was loaded
    fn has_modifications(&self) -> bool;

    fn is_modified(&self, tier: DefinitionTier, id: u32) -> bool;

    fn is_removed(&self, tier: DefinitionTier, id: u32) -> bool;

    /// Modified ids of a tier in ascending order, including newly added ones
    fn modified_ids(&self, tier: DefinitionTier) -> Vec<u32>;

    /// Serialize one definition, or `None` if it no longer exists
    fn serialize(&self, tier: DefinitionTier, id: u32) -> Option<String>;

    /// Namespace declarations the serialized definitions rely on
    fn namespaces(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }
}

impl MergeSource for NumberingRegistry {
    fn has_modifications(&self) -> bool {
        NumberingRegistry::has_modifications(self)
    }

    fn is_modified(&self, tier: DefinitionTier, id: u32) -> bool {
        self.tracker().is_modified(tier, id)
    }

    fn is_removed(&self, tier: DefinitionTier, id: u32) -> bool {
        self.tracker().is_removed(tier, id)
    }

    fn modified_ids(&self, tier: DefinitionTier) -> Vec<u32> {
        self.tracker().modified(tier).collect()
    }

    fn serialize(&self, tier: DefinitionTier, id: u32) -> Option<String> {
        let writer = NumberingWriter::new();
        let mut xml = String::new();
        match tier {
            DefinitionTier::Abstract => {
                writer.write_abstract_num(&mut xml, self.get_abstract_num(AbstractNumId::new(id))?)
            }
            DefinitionTier::Instance => {
                writer.write_num_instance(&mut xml, self.get_instance(NumId::new(id))?)
            }
        }
        Some(xml)
    }

    fn namespaces(&self) -> Vec<(&'static str, &'static str)> {
        vec![("w", namespaces::W)]
    }
}

// =============================================================================
// Merger
// =============================================================================

/// Merges an edited definition table into the raw part it was loaded from
#[derive(Debug, Clone, Copy)]
pub struct SelectiveFidelityMerger {
    schema: MergeSchema,
}

impl SelectiveFidelityMerger {
    pub fn new(schema: MergeSchema) -> Self {
        Self { schema }
    }

    /// Merger for the numbering part
    pub fn numbering() -> Self {
        Self::new(MergeSchema::NUMBERING)
    }

    pub fn schema(&self) -> &MergeSchema {
        &self.schema
    }

    /// Produce the merged part text. Never fails: an unchanged source returns
    /// `raw` as is, and a part that cannot be split is returned unchanged.
    pub fn merge<S: MergeSource + ?Sized>(&self, raw: &str, source: &S) -> String {
        if !source.has_modifications() {
            return raw.to_string();
        }

        let mut part = match RawPart::parse(raw) {
            Ok(part) => part,
            Err(e) => {
                tracing::warn!("Cannot split part for selective merge, leaving it unchanged: {}", e);
                return raw.to_string();
            }
        };

        let mut present = HashSet::new();
        let (mut replaced, mut removed) = (0usize, 0usize);
        for child in std::mem::take(&mut part.children) {
            let Some((tier, id)) = self.schema.classify(&child) else {
                part.children.push(child);
                continue;
            };
            present.insert((tier, id));
            if source.is_removed(tier, id) {
                removed += 1;
                continue;
            }
            let mut child = child;
            if source.is_modified(tier, id) {
                if let Some(xml) = source.serialize(tier, id) {
                    child.source = xml;
                    replaced += 1;
                }
            }
            part.children.push(child);
        }

        let indent = part
            .children
            .first()
            .map(|c| indentation(&c.leading).to_string())
            .unwrap_or_default();
        let definitions = self.additions(source, DefinitionTier::Abstract, &present, &indent);
        let references = self.additions(source, DefinitionTier::Instance, &present, &indent);
        let inserted = definitions.len() + references.len();

        if !definitions.is_empty() {
            let at = match part.position_of(self.schema.reference_element) {
                Some(index) => index,
                None => {
                    tracing::warn!(
                        "No <{}> anchor in {}; appending new <{}> before the closing tag",
                        self.schema.reference_element,
                        part.root_name(),
                        self.schema.definition_element
                    );
                    self.trailing_position(&part)
                }
            };
            part.children.splice(at..at, definitions);
        }
        if !references.is_empty() {
            let at = self.trailing_position(&part);
            part.children.splice(at..at, references);
        }

        for (prefix, uri) in source.namespaces() {
            if part.add_namespace(prefix, uri) {
                tracing::debug!("Declared xmlns:{} on {}", prefix, part.root_name());
            }
        }

        tracing::debug!(
            "Selective merge of {}: {} replaced, {} removed, {} inserted",
            part.root_name(),
            replaced,
            removed,
            inserted
        );
        part.to_xml()
    }

    /// Children for modified ids the raw part does not contain yet
    fn additions<S: MergeSource + ?Sized>(
        &self,
        source: &S,
        tier: DefinitionTier,
        present: &HashSet<(DefinitionTier, u32)>,
        indent: &str,
    ) -> Vec<RawChild> {
        let element = match tier {
            DefinitionTier::Abstract => self.schema.definition_element,
            DefinitionTier::Instance => self.schema.reference_element,
        };
        source
            .modified_ids(tier)
            .into_iter()
            .filter(|id| !present.contains(&(tier, *id)))
            .filter_map(|id| source.serialize(tier, id))
            .map(|xml| RawChild {
                leading: indent.to_string(),
                source: xml,
                name: format!("w:{}", element),
                attributes: Vec::new(),
            })
            .collect()
    }

    /// Insertion index that keeps the trailing element last
    fn trailing_position(&self, part: &RawPart) -> usize {
        self.schema
            .trailing_element
            .and_then(|trailing| part.position_of(trailing))
            .unwrap_or(part.children.len())
    }
}
