//! Integration tests for the selective numbering merge
//! Loads a numbering part with vendor markup, edits the registry and checks
//! that only the edited definitions change in the merged output.

use doc_model::{
    AbstractNum, AbstractNumId, DefinitionConsolidator, NumId, NumberFormat, NumberingInstance,
    NumberingRegistry,
};
use proptest::prelude::*;
use std::collections::BTreeSet;
use store::{namespaces, NumberingParser, RawPart, SelectiveFidelityMerger};

const VENDOR_ABSTRACT: &str = concat!(
    r#"<w:abstractNum w:abstractNumId="0" w15:restartNumberingAfterBreak="0">"#,
    r#"<w:nsid w:val="1A2B3C4D"/><w:multiLevelType w:val="hybridMultilevel"/>"#,
    r#"<w:lvl w:ilvl="0" w:tplc="04090001"><w:start w:val="1"/><w:numFmt w:val="bullet"/>"#,
    r#"<w:lvlText w:val=""/><w:lvlJc w:val="left"/>"#,
    r#"<w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#,
);

const DUPLICATE_ABSTRACT: &str = concat!(
    r#"<w:abstractNum w:abstractNumId="1">"#,
    r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/>"#,
    r#"<w:lvlText w:val=""/><w:lvlJc w:val="left"/>"#,
    r#"<w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#,
);

fn part(children: &[&str], trailing: bool) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n<w:numbering ",
    );
    xml.push_str(&format!(r#"xmlns:w="{}" "#, namespaces::W));
    xml.push_str(r#"xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordml" "#);
    xml.push_str(r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="w15">"#);
    for child in children {
        xml.push_str("\r\n  ");
        xml.push_str(child);
    }
    if trailing {
        xml.push_str("\r\n  ");
        xml.push_str(r#"<w:numIdMacAtCleanup w:val="2"/>"#);
    }
    xml.push_str("\r\n</w:numbering>");
    xml
}

fn standard_part() -> String {
    part(
        &[
            VENDOR_ABSTRACT,
            r#"<w:num w:numId="1" w16cid:durableId="99"><w:abstractNumId w:val="0"/></w:num>"#,
        ],
        true,
    )
}

fn load(xml: &str) -> NumberingRegistry {
    NumberingParser::new().parse(xml).unwrap()
}

fn child_names(xml: &str) -> Vec<String> {
    RawPart::parse(xml)
        .unwrap()
        .children
        .iter()
        .map(|c| c.local_name().to_string())
        .collect()
}

#[test]
fn test_unmodified_registry_returns_part_verbatim() {
    let raw = standard_part();
    let registry = load(&raw);
    assert!(!registry.has_modifications());
    assert_eq!(SelectiveFidelityMerger::numbering().merge(&raw, &registry), raw);
}

#[test]
fn test_new_list_is_inserted_at_schema_positions() {
    let raw = standard_part();
    let mut registry = load(&raw);
    let num_id = registry.create_list(AbstractNum::simple_numbered(AbstractNumId::new(0)));

    let merged = SelectiveFidelityMerger::numbering().merge(&raw, &registry);

    // Untouched definitions keep their vendor attributes byte for byte
    assert!(merged.contains(VENDOR_ABSTRACT));
    assert!(merged.contains(r#"w16cid:durableId="99""#));
    assert_eq!(
        child_names(&merged),
        ["abstractNum", "abstractNum", "num", "num", "numIdMacAtCleanup"]
    );
    assert!(merged.contains(&format!(r#"<w:num w:numId="{}">"#, num_id.0)));

    let reloaded = load(&merged);
    assert_eq!(reloaded.get_instance(num_id).unwrap().abstract_num_id, AbstractNumId::new(1));
}

#[test]
fn test_modified_definition_is_replaced_in_place() {
    let raw = standard_part();
    let mut registry = load(&raw);
    registry
        .modify_abstract_num(AbstractNumId::new(0), |abs| {
            abs.levels[0].format = NumberFormat::Decimal;
            abs.levels[0].text = "%1.".to_string();
        })
        .unwrap();

    let merged = SelectiveFidelityMerger::numbering().merge(&raw, &registry);

    assert!(!merged.contains("w15:restartNumberingAfterBreak"));
    assert!(merged.contains(r#"<w:numFmt w:val="decimal"/>"#));
    assert_eq!(child_names(&merged), ["abstractNum", "num", "numIdMacAtCleanup"]);
    // Root declarations are never dropped
    assert!(merged.contains(r#"mc:Ignorable="w15""#));
}

#[test]
fn test_removed_definitions_disappear_with_their_whitespace() {
    let raw = standard_part();
    let mut registry = load(&raw);
    registry.remove_instance(NumId::new(1));

    let merged = SelectiveFidelityMerger::numbering().merge(&raw, &registry);

    assert!(!merged.contains("<w:num "));
    assert!(!merged.contains("\r\n  \r\n"));
    assert_eq!(child_names(&merged), ["abstractNum", "numIdMacAtCleanup"]);
}

#[test]
fn test_definition_without_anchor_goes_before_trailing_element() {
    let raw = part(&[VENDOR_ABSTRACT], true);
    let mut registry = load(&raw);
    registry.add_abstract_num(AbstractNum::simple_bullet(AbstractNumId::new(5)));

    let merged = SelectiveFidelityMerger::numbering().merge(&raw, &registry);
    assert_eq!(
        child_names(&merged),
        ["abstractNum", "abstractNum", "numIdMacAtCleanup"]
    );
}

#[test]
fn test_missing_namespace_is_declared() {
    let raw = concat!(
        r#"<numbering xmlns="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        r#"<abstractNum abstractNumId="0"/></numbering>"#
    );
    let mut registry = NumberingRegistry::new();
    registry.mark_loaded();
    registry.add_abstract_num(AbstractNum::simple_bullet(AbstractNumId::new(3)));

    let merged = SelectiveFidelityMerger::numbering().merge(raw, &registry);

    assert!(merged.starts_with(&format!(
        r#"<numbering xmlns="{}" xmlns:w="{}">"#,
        namespaces::W,
        namespaces::W
    )));
    assert!(merged.contains(r#"<abstractNum abstractNumId="0"/>"#));
    assert!(merged.contains(r#"<w:abstractNum w:abstractNumId="3">"#));
}

#[test]
fn test_unparseable_part_is_left_alone() {
    let raw = "<w:numbering><w:abstractNum w:abstractNumId=\"0\">";
    let mut registry = NumberingRegistry::new();
    registry.add_abstract_num(AbstractNum::simple_bullet(AbstractNumId::new(0)));
    assert_eq!(SelectiveFidelityMerger::numbering().merge(raw, &registry), raw);
}

#[test]
fn test_consolidation_then_merge() {
    let raw = part(
        &[
            VENDOR_ABSTRACT,
            DUPLICATE_ABSTRACT,
            r#"<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>"#,
            r#"<w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>"#,
        ],
        true,
    );
    let mut registry = load(&raw);

    let result = DefinitionConsolidator::new().consolidate(&mut registry, &BTreeSet::new());
    assert_eq!(result.removed_count, 1);
    assert_eq!(result.remapped_count, 1);

    let merged = SelectiveFidelityMerger::numbering().merge(&raw, &registry);

    assert!(merged.contains(VENDOR_ABSTRACT));
    assert!(!merged.contains(r#"w:abstractNumId="1""#));
    assert!(merged.contains(r#"<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>"#));
    assert!(merged.contains(r#"<w:num w:numId="2"><w:abstractNumId w:val="0"/></w:num>"#));
    assert_eq!(
        child_names(&merged),
        ["abstractNum", "num", "num", "numIdMacAtCleanup"]
    );

    let reloaded = load(&merged);
    assert_eq!(reloaded.all_abstract_nums().count(), 1);
    assert_eq!(
        reloaded.get_instance(NumId::new(2)).unwrap().abstract_num_id,
        AbstractNumId::new(0)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_trailing_element_stays_last(lists in 1usize..6, extra_instances in 0usize..4) {
        let raw = standard_part();
        let mut registry = load(&raw);
        for _ in 0..lists {
            registry.create_list(AbstractNum::simple_bullet(AbstractNumId::new(0)));
        }
        for _ in 0..extra_instances {
            let id = registry.next_num_id();
            registry.add_instance(NumberingInstance::new(id, AbstractNumId::new(0))).unwrap();
        }

        let merged = SelectiveFidelityMerger::numbering().merge(&raw, &registry);
        let names = child_names(&merged);

        prop_assert_eq!(names.last().map(String::as_str), Some("numIdMacAtCleanup"));
        prop_assert_eq!(names.iter().filter(|n| *n == "abstractNum").count(), 1 + lists);
        prop_assert_eq!(names.iter().filter(|n| *n == "num").count(), 1 + lists + extra_instances);
        let last_abstract = names.iter().rposition(|n| n == "abstractNum");
        let first_num = names.iter().position(|n| n == "num");
        prop_assert!(last_abstract < first_num);
        prop_assert!(merged.contains(VENDOR_ABSTRACT));
    }
}
