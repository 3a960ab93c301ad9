//! Formatting property bags for runs and paragraphs
//!
//! Two representations live here:
//! - Typed properties (`CharacterProperties`, `ParagraphProperties`) that the
//!   in-memory model edits directly.
//! - `PropertyMap`, a name -> value snapshot keyed by WordprocessingML local
//!   names (`b`, `jc`, `ind`, ...). Revisions store previous/new formatting as
//!   maps so a property change can be recorded without knowing which typed
//!   struct it came from.

use crate::{ListProperties, NumId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema order of paragraph property children.
///
/// Writers must emit `w:pPr` children in exactly this order; readers that
/// validate against the schema reject anything else. `w:pPrChange` is not
/// listed: it always goes last.
pub const PARAGRAPH_PROPERTY_ORDER: &[&str] = &[
    "pStyle",
    "keepNext",
    "keepLines",
    "pageBreakBefore",
    "framePr",
    "widowControl",
    "numPr",
    "suppressLineNumbers",
    "pBdr",
    "shd",
    "tabs",
    "suppressAutoHyphens",
    "kinsoku",
    "wordWrap",
    "overflowPunct",
    "topLinePunct",
    "autoSpaceDE",
    "autoSpaceDN",
    "bidi",
    "adjustRightInd",
    "snapToGrid",
    "spacing",
    "ind",
    "contextualSpacing",
    "mirrorIndents",
    "suppressOverlap",
    "jc",
    "textDirection",
    "textAlignment",
    "textboxTightWrap",
    "outlineLvl",
    "divId",
    "cnfStyle",
    "rPr",
    "sectPr",
];

/// Properties whose single `w:val` is an on/off flag rather than a value
pub const TOGGLE_PROPERTIES: &[&str] = &[
    "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike", "vanish",
    "keepNext", "keepLines", "widowControl", "pageBreakBefore",
    "suppressLineNumbers", "bidi", "contextualSpacing", "suppressAutoHyphens",
];

/// Schema order of run property children. `w:rPrChange` always goes last.
pub const RUN_PROPERTY_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike",
    "dstrike", "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid",
    "vanish", "webHidden", "color", "spacing", "w", "kern", "position", "sz",
    "szCs", "highlight", "u", "effect", "bdr", "shd", "fitText", "vertAlign",
    "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish", "oMath",
];

// =============================================================================
// Property Map
// =============================================================================

/// A single property value in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// On/off property (`<w:b/>` or `<w:b w:val="0"/>`)
    Toggle(bool),
    /// Single `w:val` attribute
    Value(String),
    /// Several attributes on one element (e.g. `w:ind`), in emission order
    Attributes(Vec<(String, String)>),
    /// Element with child elements (`w:tabs`, `w:pBdr`, `w:sectPr`, ...),
    /// kept as its exact source markup
    Raw(String),
}

impl PropertyValue {
    /// Create a single-valued property
    pub fn value(val: impl Into<String>) -> Self {
        PropertyValue::Value(val.into())
    }

    /// Create a multi-attribute property
    pub fn attributes<K, V>(attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        PropertyValue::Attributes(attrs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn as_toggle(&self) -> Option<bool> {
        match self {
            PropertyValue::Toggle(on) => Some(*on),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            PropertyValue::Value(val) => Some(val),
            _ => None,
        }
    }

    /// Look up one attribute of a multi-attribute property
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            PropertyValue::Attributes(attrs) => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            PropertyValue::Raw(source) => Some(source),
            _ => None,
        }
    }
}

/// Snapshot of formatting properties, keyed by element local name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.0.insert(name.into(), value)
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries in the given schema order. Names missing from `order` follow
    /// the known ones, sorted by name.
    pub fn ordered<'a>(&'a self, order: &[&str]) -> Vec<(&'a str, &'a PropertyValue)> {
        let mut result: Vec<(&str, &PropertyValue)> = order
            .iter()
            .filter_map(|name| self.0.get_key_value(*name))
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        result.extend(
            self.0
                .iter()
                .filter(|(k, _)| !order.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), v)),
        );
        result
    }
}

/// Entries of `map` whose names the typed conversion did not produce
fn unmodeled(map: &PropertyMap, typed: &PropertyMap) -> PropertyMap {
    map.iter()
        .filter(|(name, _)| !typed.contains(name))
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Add `extra` entries that the typed fields did not already produce
fn overlay_extra(map: &mut PropertyMap, extra: &PropertyMap) {
    for (name, value) in extra.iter() {
        if !map.contains(name) {
            map.insert(name, value.clone());
        }
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Character Properties
// =============================================================================

/// Character (run) formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterProperties {
    /// Character style reference
    pub style_id: Option<String>,
    /// Font family name
    pub font_family: Option<String>,
    /// Font size in points
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    /// Text color as hex (with or without leading '#')
    pub color: Option<String>,
    /// Properties without a typed field, kept as read
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub extra: PropertyMap,
}

impl CharacterProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another set of properties on top of this one
    /// Properties from `other` override properties from `self` when present
    pub fn merge(&self, other: &CharacterProperties) -> CharacterProperties {
        CharacterProperties {
            style_id: other.style_id.clone().or_else(|| self.style_id.clone()),
            font_family: other.font_family.clone().or_else(|| self.font_family.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            strikethrough: other.strikethrough.or(self.strikethrough),
            color: other.color.clone().or_else(|| self.color.clone()),
            extra: {
                let mut extra = other.extra.clone();
                overlay_extra(&mut extra, &self.extra);
                extra
            },
        }
    }

    /// Check if all properties are None
    pub fn is_empty(&self) -> bool {
        self.style_id.is_none()
            && self.font_family.is_none()
            && self.font_size.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
            && self.underline.is_none()
            && self.strikethrough.is_none()
            && self.color.is_none()
            && self.extra.is_empty()
    }

    /// Snapshot as a property map (WordprocessingML names and units)
    pub fn to_property_map(&self) -> PropertyMap {
        let mut map = PropertyMap::new();
        if let Some(ref style) = self.style_id {
            map.insert("rStyle", PropertyValue::value(style.clone()));
        }
        if let Some(ref font) = self.font_family {
            map.insert(
                "rFonts",
                PropertyValue::attributes([("ascii", font.as_str()), ("hAnsi", font.as_str())]),
            );
        }
        if let Some(bold) = self.bold {
            map.insert("b", PropertyValue::Toggle(bold));
        }
        if let Some(italic) = self.italic {
            map.insert("i", PropertyValue::Toggle(italic));
        }
        if let Some(strike) = self.strikethrough {
            map.insert("strike", PropertyValue::Toggle(strike));
        }
        if let Some(ref color) = self.color {
            map.insert("color", PropertyValue::value(color.trim_start_matches('#')));
        }
        if let Some(size) = self.font_size {
            map.insert("sz", PropertyValue::value(((size * 2.0).round() as i32).to_string()));
        }
        if let Some(underline) = self.underline {
            map.insert("u", PropertyValue::value(if underline { "single" } else { "none" }));
        }
        overlay_extra(&mut map, &self.extra);
        map
    }

    /// Rebuild typed properties from a map. Names the typed fields cannot
    /// represent land in `extra`.
    pub fn from_property_map(map: &PropertyMap) -> Self {
        let mut props = CharacterProperties {
            style_id: map.get("rStyle").and_then(PropertyValue::as_value).map(str::to_string),
            font_family: map
                .get("rFonts")
                .and_then(|v| v.attribute("ascii").or_else(|| v.attribute("hAnsi")))
                .map(str::to_string),
            font_size: map
                .get("sz")
                .and_then(PropertyValue::as_value)
                .and_then(|v| v.parse::<f32>().ok())
                .map(|half_points| half_points / 2.0),
            bold: map.get("b").and_then(PropertyValue::as_toggle),
            italic: map.get("i").and_then(PropertyValue::as_toggle),
            underline: map
                .get("u")
                .and_then(PropertyValue::as_value)
                .map(|v| v != "none"),
            strikethrough: map.get("strike").and_then(PropertyValue::as_toggle),
            color: map.get("color").and_then(PropertyValue::as_value).map(str::to_string),
            extra: PropertyMap::new(),
        };
        props.extra = unmodeled(map, &props.to_property_map());
        props
    }
}

// =============================================================================
// Paragraph Properties
// =============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// WordprocessingML `w:jc` value
    pub fn as_wml(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }

    pub fn from_wml(val: &str) -> Option<Self> {
        match val {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

/// Paragraph formatting.
///
/// Field order mirrors `PARAGRAPH_PROPERTY_ORDER`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphProperties {
    /// Paragraph style reference
    pub style_id: Option<String>,
    pub keep_with_next: Option<bool>,
    /// Keep lines together (no page break within)
    pub keep_together: Option<bool>,
    pub widow_control: Option<bool>,
    /// List membership
    pub numbering: Option<ListProperties>,
    pub suppress_line_numbers: Option<bool>,
    /// Right-to-left paragraph
    pub bidi: Option<bool>,
    /// Space before paragraph in points
    pub space_before: Option<f32>,
    /// Space after paragraph in points
    pub space_after: Option<f32>,
    /// Left indent in points
    pub indent_left: Option<f32>,
    /// Right indent in points
    pub indent_right: Option<f32>,
    /// First line indent in points (negative for hanging)
    pub indent_first_line: Option<f32>,
    pub contextual_spacing: Option<bool>,
    pub alignment: Option<Alignment>,
    /// Raw `w:textDirection` value (e.g. "lrTb")
    pub text_direction: Option<String>,
    /// Raw `w:textAlignment` value (e.g. "baseline")
    pub text_alignment: Option<String>,
    /// Outline level (0-based, 9 = body text)
    pub outline_level: Option<u8>,
    /// Properties without a typed field (`w:tabs`, the paragraph mark
    /// `w:rPr`, `w:sectPr`, ...), kept as read
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub extra: PropertyMap,
}

impl ParagraphProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all properties are None
    pub fn is_empty(&self) -> bool {
        self.to_property_map().is_empty()
    }

    /// Snapshot as a property map (WordprocessingML names, twips for lengths)
    pub fn to_property_map(&self) -> PropertyMap {
        let mut map = PropertyMap::new();
        if let Some(ref style) = self.style_id {
            map.insert("pStyle", PropertyValue::value(style.clone()));
        }
        if let Some(v) = self.keep_with_next {
            map.insert("keepNext", PropertyValue::Toggle(v));
        }
        if let Some(v) = self.keep_together {
            map.insert("keepLines", PropertyValue::Toggle(v));
        }
        if let Some(v) = self.widow_control {
            map.insert("widowControl", PropertyValue::Toggle(v));
        }
        if let Some(ref list) = self.numbering {
            let mut attrs = Vec::new();
            if let Some(ilvl) = list.ilvl {
                attrs.push(("ilvl".to_string(), ilvl.to_string()));
            }
            if let Some(num_id) = list.num_id {
                attrs.push(("numId".to_string(), num_id.0.to_string()));
            }
            map.insert("numPr", PropertyValue::Attributes(attrs));
        }
        if let Some(v) = self.suppress_line_numbers {
            map.insert("suppressLineNumbers", PropertyValue::Toggle(v));
        }
        if let Some(v) = self.bidi {
            map.insert("bidi", PropertyValue::Toggle(v));
        }
        if self.space_before.is_some() || self.space_after.is_some() {
            let mut attrs = Vec::new();
            if let Some(before) = self.space_before {
                attrs.push(("before".to_string(), to_twips(before).to_string()));
            }
            if let Some(after) = self.space_after {
                attrs.push(("after".to_string(), to_twips(after).to_string()));
            }
            map.insert("spacing", PropertyValue::Attributes(attrs));
        }
        if self.indent_left.is_some() || self.indent_right.is_some() || self.indent_first_line.is_some() {
            let mut attrs = Vec::new();
            if let Some(left) = self.indent_left {
                attrs.push(("left".to_string(), to_twips(left).to_string()));
            }
            if let Some(right) = self.indent_right {
                attrs.push(("right".to_string(), to_twips(right).to_string()));
            }
            if let Some(first) = self.indent_first_line {
                if first >= 0.0 {
                    attrs.push(("firstLine".to_string(), to_twips(first).to_string()));
                } else {
                    attrs.push(("hanging".to_string(), to_twips(-first).to_string()));
                }
            }
            map.insert("ind", PropertyValue::Attributes(attrs));
        }
        if let Some(v) = self.contextual_spacing {
            map.insert("contextualSpacing", PropertyValue::Toggle(v));
        }
        if let Some(alignment) = self.alignment {
            map.insert("jc", PropertyValue::value(alignment.as_wml()));
        }
        if let Some(ref dir) = self.text_direction {
            map.insert("textDirection", PropertyValue::value(dir.clone()));
        }
        if let Some(ref align) = self.text_alignment {
            map.insert("textAlignment", PropertyValue::value(align.clone()));
        }
        if let Some(level) = self.outline_level {
            map.insert("outlineLvl", PropertyValue::value(level.to_string()));
        }
        overlay_extra(&mut map, &self.extra);
        map
    }

    /// Rebuild typed properties from a map. Names the typed fields cannot
    /// represent land in `extra`.
    pub fn from_property_map(map: &PropertyMap) -> Self {
        let twips = |name: &str, attr: &str| {
            map.get(name)
                .and_then(|v| v.attribute(attr))
                .and_then(|v| v.parse::<f32>().ok())
                .map(|t| t / 20.0)
        };
        let numbering = map.get("numPr").map(|v| ListProperties {
            num_id: v.attribute("numId").and_then(|id| id.parse().ok()).map(NumId::new),
            ilvl: v.attribute("ilvl").and_then(|l| l.parse().ok()),
        });
        let indent_first_line = twips("ind", "firstLine").or_else(|| twips("ind", "hanging").map(|h| -h));

        let mut props = ParagraphProperties {
            style_id: map.get("pStyle").and_then(PropertyValue::as_value).map(str::to_string),
            keep_with_next: map.get("keepNext").and_then(PropertyValue::as_toggle),
            keep_together: map.get("keepLines").and_then(PropertyValue::as_toggle),
            widow_control: map.get("widowControl").and_then(PropertyValue::as_toggle),
            numbering,
            suppress_line_numbers: map.get("suppressLineNumbers").and_then(PropertyValue::as_toggle),
            bidi: map.get("bidi").and_then(PropertyValue::as_toggle),
            space_before: twips("spacing", "before"),
            space_after: twips("spacing", "after"),
            indent_left: twips("ind", "left").or_else(|| twips("ind", "start")),
            indent_right: twips("ind", "right").or_else(|| twips("ind", "end")),
            indent_first_line,
            contextual_spacing: map.get("contextualSpacing").and_then(PropertyValue::as_toggle),
            alignment: map
                .get("jc")
                .and_then(PropertyValue::as_value)
                .and_then(Alignment::from_wml),
            text_direction: map.get("textDirection").and_then(PropertyValue::as_value).map(str::to_string),
            text_alignment: map.get("textAlignment").and_then(PropertyValue::as_value).map(str::to_string),
            outline_level: map
                .get("outlineLvl")
                .and_then(PropertyValue::as_value)
                .and_then(|v| v.parse().ok()),
            extra: PropertyMap::new(),
        };
        props.extra = unmodeled(map, &props.to_property_map());
        props
    }
}

/// Points to twentieths of a point
pub fn to_twips(points: f32) -> i32 {
    (points * 20.0).round() as i32
}
