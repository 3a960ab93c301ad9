//! List and numbering definition table
//!
//! This module implements OOXML-compatible list definitions with:
//! - Abstract numbering definitions (templates)
//! - Numbering instances (concrete uses of templates)
//! - Multi-level lists (up to 9 levels, 0-8)
//! - Modification tracking so a loaded table can be merged back selectively

use crate::{DocModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Highest list level index
pub const MAX_LIST_LEVEL: u8 = 8;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for an abstract numbering definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbstractNumId(pub u32);

impl AbstractNumId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for a numbering instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NumId(pub u32);

impl NumId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

// =============================================================================
// Number Format
// =============================================================================

/// Number format types for list items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumberFormat {
    /// Decimal numbers: 1, 2, 3, ...
    #[default]
    Decimal,
    /// Decimal with leading zeros: 01, 02, 03, ...
    DecimalZero,
    /// Lowercase letters: a, b, c, ...
    LowerLetter,
    /// Uppercase letters: A, B, C, ...
    UpperLetter,
    /// Lowercase roman numerals: i, ii, iii, ...
    LowerRoman,
    /// Uppercase roman numerals: I, II, III, ...
    UpperRoman,
    /// Bullet character (uses font glyph)
    Bullet,
    /// No number displayed
    None,
    /// Ordinal: 1st, 2nd, 3rd, ...
    Ordinal,
    /// Cardinal text: One, Two, Three, ...
    CardinalText,
    /// Ordinal text: First, Second, Third, ...
    OrdinalText,
}

impl NumberFormat {
    /// WordprocessingML `w:numFmt` value
    pub fn as_wml(&self) -> &'static str {
        match self {
            NumberFormat::Decimal => "decimal",
            NumberFormat::DecimalZero => "decimalZero",
            NumberFormat::LowerLetter => "lowerLetter",
            NumberFormat::UpperLetter => "upperLetter",
            NumberFormat::LowerRoman => "lowerRoman",
            NumberFormat::UpperRoman => "upperRoman",
            NumberFormat::Bullet => "bullet",
            NumberFormat::None => "none",
            NumberFormat::Ordinal => "ordinal",
            NumberFormat::CardinalText => "cardinalText",
            NumberFormat::OrdinalText => "ordinalText",
        }
    }

    /// Parse a `w:numFmt` value; unknown formats fall back to decimal
    pub fn from_wml(val: &str) -> Self {
        match val {
            "decimalZero" => NumberFormat::DecimalZero,
            "lowerLetter" => NumberFormat::LowerLetter,
            "upperLetter" => NumberFormat::UpperLetter,
            "lowerRoman" => NumberFormat::LowerRoman,
            "upperRoman" => NumberFormat::UpperRoman,
            "bullet" => NumberFormat::Bullet,
            "none" => NumberFormat::None,
            "ordinal" => NumberFormat::Ordinal,
            "cardinalText" => NumberFormat::CardinalText,
            "ordinalText" => NumberFormat::OrdinalText,
            _ => NumberFormat::Decimal,
        }
    }
}

// =============================================================================
// List Level Definition
// =============================================================================

/// Alignment of the list number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ListLevelAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl ListLevelAlignment {
    pub fn as_wml(&self) -> &'static str {
        match self {
            ListLevelAlignment::Left => "left",
            ListLevelAlignment::Center => "center",
            ListLevelAlignment::Right => "right",
        }
    }

    pub fn from_wml(val: &str) -> Self {
        match val {
            "center" => ListLevelAlignment::Center,
            "right" | "end" => ListLevelAlignment::Right,
            _ => ListLevelAlignment::Left,
        }
    }
}

/// Suffix after the list number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ListLevelSuffix {
    #[default]
    Tab,
    Space,
    Nothing,
}

impl ListLevelSuffix {
    pub fn as_wml(&self) -> &'static str {
        match self {
            ListLevelSuffix::Tab => "tab",
            ListLevelSuffix::Space => "space",
            ListLevelSuffix::Nothing => "nothing",
        }
    }

    pub fn from_wml(val: &str) -> Self {
        match val {
            "space" => ListLevelSuffix::Space,
            "nothing" => ListLevelSuffix::Nothing,
            _ => ListLevelSuffix::Tab,
        }
    }
}

/// Definition for a single level of a list (0-8)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListLevel {
    /// Level index (0-8)
    pub level: u8,
    /// Number format for this level
    pub format: NumberFormat,
    /// Text pattern for the number (e.g., "%1." or "%1.%2.")
    /// %1 = level 0 number, %2 = level 1 number, etc.
    pub text: String,
    /// Starting number for this level
    pub start: u32,
    /// Left indent in twips
    pub indent: i32,
    /// Hanging indent in twips (space for number)
    pub hanging: i32,
    /// Font family of the number/bullet
    pub font: Option<String>,
    /// Font size of the number in half-points
    pub font_size: Option<u32>,
    /// Color of the number (hex, no '#')
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Restart numbering after this (1-based) level; `Some(0)` never restarts
    pub restart_after_level: Option<u8>,
    /// Display all levels as arabic numerals (`w:isLgl`)
    pub is_legal: bool,
    /// Text alignment for the number
    pub alignment: ListLevelAlignment,
    /// Suffix after the number
    pub suffix: ListLevelSuffix,
}

impl Default for ListLevel {
    fn default() -> Self {
        Self {
            level: 0,
            format: NumberFormat::Decimal,
            text: "%1.".to_string(),
            start: 1,
            indent: 720,  // 0.5 inch
            hanging: 360, // 0.25 inch
            font: None,
            font_size: None,
            color: None,
            bold: false,
            italic: false,
            underline: false,
            restart_after_level: None,
            is_legal: false,
            alignment: ListLevelAlignment::Left,
            suffix: ListLevelSuffix::Tab,
        }
    }
}

impl ListLevel {
    /// Create a new list level with default settings
    pub fn new(level: u8) -> Self {
        Self {
            level,
            text: format!("%{}.", level + 1),
            indent: 720 * (level as i32 + 1), // 0.5 inch per level
            ..Default::default()
        }
    }

    /// Create a bullet list level
    pub fn bullet(level: u8, bullet_char: char) -> Self {
        Self {
            level,
            format: NumberFormat::Bullet,
            text: bullet_char.to_string(),
            indent: 720 * (level as i32 + 1),
            font: Some("Symbol".to_string()),
            ..Default::default()
        }
    }

    /// Create a numbered list level
    pub fn numbered(level: u8, format: NumberFormat) -> Self {
        Self {
            format,
            ..Self::new(level)
        }
    }
}

// =============================================================================
// Abstract Numbering Definition
// =============================================================================

/// Type of multi-level list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MultiLevelType {
    /// Single level only
    #[default]
    SingleLevel,
    /// Multiple levels, each restarts independently
    MultiLevel,
    /// Multiple levels that don't restart (e.g., legal style 1.1.1)
    HybridMultiLevel,
}

impl MultiLevelType {
    pub fn as_wml(&self) -> &'static str {
        match self {
            MultiLevelType::SingleLevel => "singleLevel",
            MultiLevelType::MultiLevel => "multilevel",
            MultiLevelType::HybridMultiLevel => "hybridMultilevel",
        }
    }

    pub fn from_wml(val: &str) -> Self {
        match val {
            "multilevel" => MultiLevelType::MultiLevel,
            "hybridMultilevel" => MultiLevelType::HybridMultiLevel,
            _ => MultiLevelType::SingleLevel,
        }
    }
}

/// Abstract numbering definition - a template for list styles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractNum {
    /// Unique identifier
    pub id: AbstractNumId,
    /// Human-readable name
    pub name: Option<String>,
    /// Levels (0-8), kept sorted by level index
    pub levels: Vec<ListLevel>,
    /// Multi-level type
    pub multi_level_type: MultiLevelType,
}

impl AbstractNum {
    /// Create a new abstract numbering definition
    pub fn new(id: AbstractNumId) -> Self {
        Self {
            id,
            name: None,
            levels: vec![ListLevel::default()],
            multi_level_type: MultiLevelType::SingleLevel,
        }
    }

    /// Create a simple bullet list definition
    pub fn simple_bullet(id: AbstractNumId) -> Self {
        let bullets = ['\u{2022}', '\u{25E6}', '\u{25AA}']; // bullet, white bullet, small square
        let levels: Vec<ListLevel> = (0..=MAX_LIST_LEVEL)
            .map(|i| ListLevel::bullet(i, bullets[i as usize % bullets.len()]))
            .collect();

        Self {
            id,
            name: None,
            levels,
            multi_level_type: MultiLevelType::HybridMultiLevel,
        }
    }

    /// Create a simple numbered list definition
    pub fn simple_numbered(id: AbstractNumId) -> Self {
        let levels: Vec<ListLevel> = (0..=MAX_LIST_LEVEL)
            .map(|i| {
                let format = match i % 3 {
                    0 => NumberFormat::Decimal,
                    1 => NumberFormat::LowerLetter,
                    _ => NumberFormat::LowerRoman,
                };
                ListLevel::numbered(i, format)
            })
            .collect();

        Self {
            id,
            name: None,
            levels,
            multi_level_type: MultiLevelType::HybridMultiLevel,
        }
    }

    /// Get a level definition
    pub fn get_level(&self, level: u8) -> Option<&ListLevel> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// Insert or replace a level, keeping levels sorted
    pub fn set_level(&mut self, level: ListLevel) -> Result<()> {
        if level.level > MAX_LIST_LEVEL {
            return Err(DocModelError::InvalidLevel(level.level));
        }
        match self.levels.iter().position(|l| l.level == level.level) {
            Some(pos) => self.levels[pos] = level,
            None => {
                self.levels.push(level);
                self.levels.sort_by_key(|l| l.level);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Numbering Instance
// =============================================================================

/// Level override for a numbering instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelOverride {
    /// Override the starting number
    pub start_override: Option<u32>,
    /// Override the level definition
    pub level_override: Option<ListLevel>,
}

/// Concrete numbering instance - a use of an abstract numbering definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingInstance {
    /// Unique identifier
    pub id: NumId,
    /// Reference to abstract numbering definition
    pub abstract_num_id: AbstractNumId,
    /// Per-level overrides
    pub level_overrides: BTreeMap<u8, LevelOverride>,
}

impl NumberingInstance {
    /// Create a new numbering instance
    pub fn new(id: NumId, abstract_num_id: AbstractNumId) -> Self {
        Self {
            id,
            abstract_num_id,
            level_overrides: BTreeMap::new(),
        }
    }

    /// Add a start override for a level
    pub fn set_start_override(&mut self, level: u8, start: u32) {
        self.level_overrides.entry(level).or_default().start_override = Some(start);
    }

    /// Get the start override for a level
    pub fn get_start_override(&self, level: u8) -> Option<u32> {
        self.level_overrides.get(&level).and_then(|o| o.start_override)
    }
}

// =============================================================================
// List Paragraph Properties
// =============================================================================

/// List properties for a paragraph
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListProperties {
    /// Numbering instance ID
    pub num_id: Option<NumId>,
    /// Indent level (0-8)
    pub ilvl: Option<u8>,
}

impl ListProperties {
    pub fn new(num_id: NumId, ilvl: u8) -> Self {
        Self {
            num_id: Some(num_id),
            ilvl: Some(ilvl),
        }
    }
}

// =============================================================================
// Modification Tracking
// =============================================================================

/// The two tiers of a definition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionTier {
    /// Template definitions (`w:abstractNum`)
    Abstract,
    /// Instances referencing a template (`w:num`)
    Instance,
}

/// Records which definitions changed since the table was loaded.
///
/// Per tier an id is in at most one of {modified, removed}; the latest call
/// decides which.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionModificationTracker {
    modified_abstract: BTreeSet<u32>,
    removed_abstract: BTreeSet<u32>,
    modified_instances: BTreeSet<u32>,
    removed_instances: BTreeSet<u32>,
}

impl DefinitionModificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn sets_mut(&mut self, tier: DefinitionTier) -> (&mut BTreeSet<u32>, &mut BTreeSet<u32>) {
        match tier {
            DefinitionTier::Abstract => (&mut self.modified_abstract, &mut self.removed_abstract),
            DefinitionTier::Instance => (&mut self.modified_instances, &mut self.removed_instances),
        }
    }

    fn sets(&self, tier: DefinitionTier) -> (&BTreeSet<u32>, &BTreeSet<u32>) {
        match tier {
            DefinitionTier::Abstract => (&self.modified_abstract, &self.removed_abstract),
            DefinitionTier::Instance => (&self.modified_instances, &self.removed_instances),
        }
    }

    /// Record an add or modify
    pub fn mark_modified(&mut self, tier: DefinitionTier, id: u32) {
        let (modified, removed) = self.sets_mut(tier);
        removed.remove(&id);
        modified.insert(id);
    }

    /// Record a removal
    pub fn mark_removed(&mut self, tier: DefinitionTier, id: u32) {
        let (modified, removed) = self.sets_mut(tier);
        modified.remove(&id);
        removed.insert(id);
    }

    pub fn is_modified(&self, tier: DefinitionTier, id: u32) -> bool {
        self.sets(tier).0.contains(&id)
    }

    pub fn is_removed(&self, tier: DefinitionTier, id: u32) -> bool {
        self.sets(tier).1.contains(&id)
    }

    /// Modified ids of a tier, ascending
    pub fn modified(&self, tier: DefinitionTier) -> impl Iterator<Item = u32> + '_ {
        self.sets(tier).0.iter().copied()
    }

    /// Removed ids of a tier, ascending
    pub fn removed(&self, tier: DefinitionTier) -> impl Iterator<Item = u32> + '_ {
        self.sets(tier).1.iter().copied()
    }

    /// True if anything was added, modified or removed
    pub fn has_modifications(&self) -> bool {
        !(self.modified_abstract.is_empty()
            && self.removed_abstract.is_empty()
            && self.modified_instances.is_empty()
            && self.removed_instances.is_empty())
    }

    pub fn clear(&mut self) {
        self.modified_abstract.clear();
        self.removed_abstract.clear();
        self.modified_instances.clear();
        self.removed_instances.clear();
    }
}

// =============================================================================
// Numbering Registry
// =============================================================================

/// Registry for all list definitions in a document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumberingRegistry {
    /// Abstract numbering definitions
    abstract_nums: BTreeMap<AbstractNumId, AbstractNum>,
    /// Numbering instances
    instances: BTreeMap<NumId, NumberingInstance>,
    /// Changes since load
    tracker: DefinitionModificationTracker,
    /// Next available abstract num ID
    next_abstract_id: u32,
    /// Next available num ID (instance ids start at 1)
    next_num_id: u32,
}

impl NumberingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            next_num_id: 1,
            ..Default::default()
        }
    }

    /// Forget all recorded modifications; call after loading from a part
    pub fn mark_loaded(&mut self) {
        self.tracker.clear();
    }

    /// Changes recorded since the last `mark_loaded`
    pub fn tracker(&self) -> &DefinitionModificationTracker {
        &self.tracker
    }

    pub fn has_modifications(&self) -> bool {
        self.tracker.has_modifications()
    }

    /// Add or replace an abstract numbering definition
    pub fn add_abstract_num(&mut self, abstract_num: AbstractNum) -> AbstractNumId {
        let id = abstract_num.id;
        self.abstract_nums.insert(id, abstract_num);
        if id.0 >= self.next_abstract_id {
            self.next_abstract_id = id.0 + 1;
        }
        self.tracker.mark_modified(DefinitionTier::Abstract, id.0);
        id
    }

    /// Edit an abstract numbering definition in place
    pub fn modify_abstract_num<F>(&mut self, id: AbstractNumId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut AbstractNum),
    {
        let abstract_num = self
            .abstract_nums
            .get_mut(&id)
            .ok_or(DocModelError::AbstractNumNotFound(id.0))?;
        edit(abstract_num);
        self.tracker.mark_modified(DefinitionTier::Abstract, id.0);
        Ok(())
    }

    /// Remove an abstract numbering definition
    pub fn remove_abstract_num(&mut self, id: AbstractNumId) -> Option<AbstractNum> {
        let removed = self.abstract_nums.remove(&id)?;
        self.tracker.mark_removed(DefinitionTier::Abstract, id.0);
        Some(removed)
    }

    /// Add or replace a numbering instance; its template must exist
    pub fn add_instance(&mut self, instance: NumberingInstance) -> Result<NumId> {
        if !self.abstract_nums.contains_key(&instance.abstract_num_id) {
            return Err(DocModelError::AbstractNumNotFound(instance.abstract_num_id.0));
        }
        let id = instance.id;
        self.instances.insert(id, instance);
        if id.0 >= self.next_num_id {
            self.next_num_id = id.0 + 1;
        }
        self.tracker.mark_modified(DefinitionTier::Instance, id.0);
        Ok(id)
    }

    /// Point an instance at a different template
    pub fn retarget_instance(&mut self, num_id: NumId, abstract_num_id: AbstractNumId) -> Result<()> {
        if !self.abstract_nums.contains_key(&abstract_num_id) {
            return Err(DocModelError::AbstractNumNotFound(abstract_num_id.0));
        }
        let instance = self
            .instances
            .get_mut(&num_id)
            .ok_or(DocModelError::NumberingInstanceNotFound(num_id.0))?;
        instance.abstract_num_id = abstract_num_id;
        self.tracker.mark_modified(DefinitionTier::Instance, num_id.0);
        Ok(())
    }

    /// Remove a numbering instance
    pub fn remove_instance(&mut self, id: NumId) -> Option<NumberingInstance> {
        let removed = self.instances.remove(&id)?;
        self.tracker.mark_removed(DefinitionTier::Instance, id.0);
        Some(removed)
    }

    /// Create a new list from a template and return its instance id
    pub fn create_list(&mut self, mut abstract_num: AbstractNum) -> NumId {
        let abstract_id = self.next_abstract_num_id();
        abstract_num.id = abstract_id;
        self.add_abstract_num(abstract_num);
        let num_id = self.next_num_id();
        self.instances
            .insert(num_id, NumberingInstance::new(num_id, abstract_id));
        self.tracker.mark_modified(DefinitionTier::Instance, num_id.0);
        num_id
    }

    /// Allocate a new NumId for a new instance
    pub fn next_num_id(&mut self) -> NumId {
        let id = NumId::new(self.next_num_id.max(1));
        self.next_num_id = id.0 + 1;
        id
    }

    /// Allocate a new AbstractNumId
    pub fn next_abstract_num_id(&mut self) -> AbstractNumId {
        let id = AbstractNumId::new(self.next_abstract_id);
        self.next_abstract_id += 1;
        id
    }

    pub fn get_abstract_num(&self, id: AbstractNumId) -> Option<&AbstractNum> {
        self.abstract_nums.get(&id)
    }

    pub fn get_instance(&self, id: NumId) -> Option<&NumberingInstance> {
        self.instances.get(&id)
    }

    /// All abstract numbering definitions, ascending by id
    pub fn all_abstract_nums(&self) -> impl Iterator<Item = &AbstractNum> {
        self.abstract_nums.values()
    }

    /// All numbering instances, ascending by id
    pub fn all_instances(&self) -> impl Iterator<Item = &NumberingInstance> {
        self.instances.values()
    }

    /// Instances whose template is `abstract_num_id`
    pub fn instances_referencing(&self, abstract_num_id: AbstractNumId) -> Vec<NumId> {
        self.instances
            .values()
            .filter(|i| i.abstract_num_id == abstract_num_id)
            .map(|i| i.id)
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
