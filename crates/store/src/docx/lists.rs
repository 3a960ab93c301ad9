//! Numbering.xml parser for list definitions
//!
//! Handles abstract numbering definitions and numbering instances,
//! including level overrides, and loads them into a `NumberingRegistry`
//! whose modification tracking starts out clean.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::XmlParser;
use doc_model::{
    AbstractNum, AbstractNumId, LevelOverride, ListLevel, ListLevelAlignment, ListLevelSuffix,
    MultiLevelType, NumId, NumberFormat, NumberingInstance, NumberingRegistry,
};
use quick_xml::events::{BytesStart, Event};

/// Parser for numbering.xml
#[derive(Debug, Default)]
pub struct NumberingParser;

impl NumberingParser {
    /// Create a new numbering parser
    pub fn new() -> Self {
        Self
    }

    /// Parse numbering.xml into a registry with no recorded modifications
    pub fn parse(&self, content: &str) -> DocxResult<NumberingRegistry> {
        let (abstract_nums, instances) = self.parse_definitions(content)?;

        let mut registry = NumberingRegistry::new();
        for abstract_num in abstract_nums {
            registry.add_abstract_num(abstract_num);
        }
        for instance in instances {
            let (num_id, abstract_id) = (instance.id.0, instance.abstract_num_id.0);
            if registry.add_instance(instance).is_err() {
                tracing::warn!(
                    "Numbering instance {} references missing abstractNum {}, skipping",
                    num_id,
                    abstract_id
                );
            }
        }
        registry.mark_loaded();
        Ok(registry)
    }

    /// Parse numbering.xml and return abstract numbering definitions and instances
    pub fn parse_definitions(
        &self,
        content: &str,
    ) -> DocxResult<(Vec<AbstractNum>, Vec<NumberingInstance>)> {
        let mut abstract_nums = Vec::new();
        let mut instances = Vec::new();

        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        let mut current_abstract: Option<ParsedAbstractNum> = None;
        let mut current_level: Option<ListLevel> = None;
        let mut current_num: Option<ParsedNum> = None;
        let mut current_override: Option<(u8, LevelOverride)> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    let name_ref = name.as_ref();

                    if XmlParser::matches_element(name_ref, "abstractNum") {
                        current_abstract = parse_id(e, "abstractNumId").map(ParsedAbstractNum::new);
                    } else if XmlParser::matches_element(name_ref, "num") {
                        current_num = parse_id(e, "numId").map(ParsedNum::new);
                    } else if XmlParser::matches_element(name_ref, "lvlOverride") {
                        current_override = parse_id(e, "ilvl")
                            .and_then(|l| u8::try_from(l).ok())
                            .map(|level| (level, LevelOverride::default()));
                    } else if XmlParser::matches_element(name_ref, "lvl") {
                        let level = parse_id(e, "ilvl")
                            .and_then(|l| u8::try_from(l).ok())
                            .unwrap_or(0);
                        current_level = Some(ListLevel::new(level));
                    } else {
                        self.parse_child(e, &mut current_abstract, &mut current_level, &mut current_num, &mut current_override);
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    self.parse_child(e, &mut current_abstract, &mut current_level, &mut current_num, &mut current_override);
                }
                Ok(Event::End(ref e)) => {
                    let name = e.name();
                    let name_ref = name.as_ref();

                    if XmlParser::matches_element(name_ref, "abstractNum") {
                        if let Some(parsed) = current_abstract.take() {
                            abstract_nums.push(parsed.into_abstract_num());
                        }
                    } else if XmlParser::matches_element(name_ref, "lvl") {
                        if let Some(level) = current_level.take() {
                            if let Some((_, ref mut lvl_override)) = current_override {
                                lvl_override.level_override = Some(level);
                            } else if let Some(ref mut abs) = current_abstract {
                                abs.levels.push(level);
                            }
                        }
                    } else if XmlParser::matches_element(name_ref, "lvlOverride") {
                        if let (Some((level, lvl_override)), Some(num)) =
                            (current_override.take(), current_num.as_mut())
                        {
                            num.overrides.push((level, lvl_override));
                        }
                    } else if XmlParser::matches_element(name_ref, "num") {
                        if let Some(parsed) = current_num.take() {
                            match parsed.into_instance() {
                                Some(instance) => instances.push(instance),
                                None => tracing::warn!("w:num without w:abstractNumId, skipping"),
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocxError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok((abstract_nums, instances))
    }

    /// Dispatch a child element to whatever definition is open
    fn parse_child(
        &self,
        e: &BytesStart,
        abs: &mut Option<ParsedAbstractNum>,
        level: &mut Option<ListLevel>,
        num: &mut Option<ParsedNum>,
        lvl_override: &mut Option<(u8, LevelOverride)>,
    ) {
        if let Some(level) = level.as_mut() {
            self.parse_level_property(e, level);
        } else if let Some((_, lvl_override)) = lvl_override.as_mut() {
            if XmlParser::matches_element(e.name().as_ref(), "startOverride") {
                lvl_override.start_override = parse_id(e, "val");
            }
        } else if let Some(num) = num.as_mut() {
            if XmlParser::matches_element(e.name().as_ref(), "abstractNumId") {
                num.abstract_num_id = parse_id(e, "val");
            }
        } else if let Some(abs) = abs.as_mut() {
            self.parse_abstract_property(e, abs);
        }
    }

    /// Parse abstract numbering properties
    fn parse_abstract_property(&self, e: &BytesStart, abs: &mut ParsedAbstractNum) {
        let name = e.name();
        let name_ref = name.as_ref();

        if XmlParser::matches_element(name_ref, "multiLevelType") {
            if let Some(val) = XmlParser::get_w_attribute(e, "val") {
                abs.multi_level_type = MultiLevelType::from_wml(&val);
            }
        } else if XmlParser::matches_element(name_ref, "name") {
            abs.name = XmlParser::get_w_attribute(e, "val");
        }
    }

    /// Parse level properties
    fn parse_level_property(&self, e: &BytesStart, level: &mut ListLevel) {
        let name = e.name();
        let name_ref = name.as_ref();
        let val = XmlParser::get_w_attribute(e, "val");

        if XmlParser::matches_element(name_ref, "start") {
            level.start = val.and_then(|v| v.parse().ok()).unwrap_or(1);
        } else if XmlParser::matches_element(name_ref, "numFmt") {
            if let Some(val) = val {
                level.format = NumberFormat::from_wml(&val);
            }
        } else if XmlParser::matches_element(name_ref, "lvlRestart") {
            level.restart_after_level = val.and_then(|v| v.parse().ok());
        } else if XmlParser::matches_element(name_ref, "isLgl") {
            level.is_legal = toggle(val);
        } else if XmlParser::matches_element(name_ref, "lvlText") {
            if let Some(val) = val {
                level.text = val;
            }
        } else if XmlParser::matches_element(name_ref, "lvlJc") {
            if let Some(val) = val {
                level.alignment = ListLevelAlignment::from_wml(&val);
            }
        } else if XmlParser::matches_element(name_ref, "suff") {
            if let Some(val) = val {
                level.suffix = ListLevelSuffix::from_wml(&val);
            }
        } else if XmlParser::matches_element(name_ref, "ind") {
            let left = XmlParser::get_w_attribute(e, "left")
                .or_else(|| XmlParser::get_w_attribute(e, "start"));
            if let Some(left) = left.and_then(|v| v.parse().ok()) {
                level.indent = left;
            }
            if let Some(hanging) = XmlParser::get_w_attribute(e, "hanging").and_then(|v| v.parse().ok()) {
                level.hanging = hanging;
            }
        } else if XmlParser::matches_element(name_ref, "rFonts") {
            level.font = XmlParser::get_w_attribute(e, "ascii")
                .or_else(|| XmlParser::get_w_attribute(e, "hAnsi"));
        } else if XmlParser::matches_element(name_ref, "sz") {
            level.font_size = val.and_then(|v| v.parse().ok());
        } else if XmlParser::matches_element(name_ref, "color") {
            level.color = val;
        } else if XmlParser::matches_element(name_ref, "b") {
            level.bold = toggle(val);
        } else if XmlParser::matches_element(name_ref, "i") {
            level.italic = toggle(val);
        } else if XmlParser::matches_element(name_ref, "u") {
            level.underline = val.map(|v| v != "none").unwrap_or(true);
        }
    }
}

/// Parse a numeric w: attribute
fn parse_id(e: &BytesStart, name: &str) -> Option<u32> {
    XmlParser::get_w_attribute(e, name).and_then(|v| v.parse().ok())
}

/// An on/off element is on unless its `w:val` says otherwise
fn toggle(val: Option<String>) -> bool {
    val.map(|v| XmlParser::parse_bool(&v)).unwrap_or(true)
}

/// Parsed abstract numbering definition
#[derive(Debug)]
struct ParsedAbstractNum {
    id: u32,
    name: Option<String>,
    multi_level_type: MultiLevelType,
    levels: Vec<ListLevel>,
}

impl ParsedAbstractNum {
    fn new(id: u32) -> Self {
        Self {
            id,
            name: None,
            multi_level_type: MultiLevelType::default(),
            levels: Vec::new(),
        }
    }

    fn into_abstract_num(mut self) -> AbstractNum {
        let mut abs = AbstractNum::new(AbstractNumId::new(self.id));
        abs.name = self.name;
        abs.multi_level_type = self.multi_level_type;
        self.levels.sort_by_key(|l| l.level);
        abs.levels = self.levels;

        // Ensure we have at least one level
        if abs.levels.is_empty() {
            abs.levels.push(ListLevel::default());
        }

        abs
    }
}

/// Parsed numbering instance
#[derive(Debug)]
struct ParsedNum {
    id: u32,
    abstract_num_id: Option<u32>,
    overrides: Vec<(u8, LevelOverride)>,
}

impl ParsedNum {
    fn new(id: u32) -> Self {
        Self {
            id,
            abstract_num_id: None,
            overrides: Vec::new(),
        }
    }

    fn into_instance(self) -> Option<NumberingInstance> {
        let mut instance =
            NumberingInstance::new(NumId::new(self.id), AbstractNumId::new(self.abstract_num_id?));
        instance.level_overrides.extend(self.overrides);
        Some(instance)
    }
}
