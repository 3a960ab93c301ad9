//! Deduplication of structurally identical numbering definitions

use crate::{AbstractNum, AbstractNumId, ListLevel, NumberingRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Outcome of a consolidation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationResult {
    /// Duplicate definitions deleted
    pub removed_count: usize,
    /// Instances pointed at a canonical definition
    pub remapped_count: usize,
    /// Fingerprint groups that had more than one member
    pub group_count: usize,
}

impl ConsolidationResult {
    pub fn is_noop(&self) -> bool {
        self.removed_count == 0 && self.remapped_count == 0
    }
}

fn push_level(key: &mut String, level: &ListLevel) {
    let _ = write!(
        key,
        "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
        level.level,
        level.format.as_wml(),
        level.text,
        level.font.as_deref().unwrap_or(""),
        level.font_size.map(|s| s.to_string()).unwrap_or_default(),
        level.color.as_deref().unwrap_or(""),
        level.indent,
        level.hanging,
        level.alignment.as_wml(),
        level.start,
        level.bold as u8,
        level.italic as u8,
        level.underline as u8,
        level.suffix.as_wml(),
        level.is_legal as u8,
        level
            .restart_after_level
            .map(|r| r.to_string())
            .unwrap_or_default(),
    );
}

/// Structural-equality key over everything that affects how a definition renders.
///
/// Names and ids are not part of the key.
pub fn fingerprint(abstract_num: &AbstractNum) -> String {
    let mut levels: Vec<&ListLevel> = abstract_num.levels.iter().collect();
    levels.sort_by_key(|l| l.level);

    let mut key = String::new();
    for level in levels {
        push_level(&mut key, level);
        key.push(';');
    }
    key
}

/// Merges definitions that share a fingerprint into the lowest id
#[derive(Debug, Default)]
pub struct DefinitionConsolidator;

impl DefinitionConsolidator {
    pub fn new() -> Self {
        Self
    }

    /// Deduplicate every definition not listed in `protected`.
    ///
    /// Instances of a duplicate are retargeted to the canonical definition
    /// before the duplicate is removed; both show up in the registry's tracker.
    pub fn consolidate(
        &self,
        registry: &mut NumberingRegistry,
        protected: &BTreeSet<AbstractNumId>,
    ) -> ConsolidationResult {
        let mut groups: BTreeMap<String, Vec<AbstractNumId>> = BTreeMap::new();
        for abstract_num in registry.all_abstract_nums() {
            if protected.contains(&abstract_num.id) {
                continue;
            }
            groups
                .entry(fingerprint(abstract_num))
                .or_default()
                .push(abstract_num.id);
        }

        let mut result = ConsolidationResult::default();
        for mut ids in groups.into_values() {
            if ids.len() < 2 {
                continue;
            }
            result.group_count += 1;
            ids.sort();
            let canonical = ids[0];

            for duplicate in &ids[1..] {
                for num_id in registry.instances_referencing(*duplicate) {
                    if registry.retarget_instance(num_id, canonical).is_ok() {
                        result.remapped_count += 1;
                    }
                }
                if registry.remove_abstract_num(*duplicate).is_some() {
                    result.removed_count += 1;
                }
            }
        }

        tracing::debug!(
            removed = result.removed_count,
            remapped = result.remapped_count,
            groups = result.group_count,
            "consolidated numbering definitions"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NumId, NumberFormat, NumberingInstance};

    fn registry_with_duplicates(ids: &[u32]) -> NumberingRegistry {
        let mut registry = NumberingRegistry::new();
        for (i, id) in ids.iter().enumerate() {
            let mut abs = AbstractNum::simple_numbered(AbstractNumId::new(*id));
            abs.name = Some(format!("List {}", i));
            registry.add_abstract_num(abs);
            registry
                .add_instance(NumberingInstance::new(NumId::new(i as u32 + 1), AbstractNumId::new(*id)))
                .unwrap();
        }
        registry.mark_loaded();
        registry
    }

    #[test]
    fn test_fingerprint_ignores_name_and_id() {
        let a = AbstractNum::simple_bullet(AbstractNumId::new(1));
        let mut b = AbstractNum::simple_bullet(AbstractNumId::new(7));
        b.name = Some("Other".into());
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_sees_level_formatting() {
        let a = AbstractNum::simple_numbered(AbstractNumId::new(1));
        let mut b = a.clone();
        b.levels[3].bold = true;
        assert_ne!(fingerprint(&a), fingerprint(&b));

        let mut c = a.clone();
        c.levels[0].format = NumberFormat::UpperRoman;
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_lowest_id_is_canonical() {
        let mut registry = registry_with_duplicates(&[5, 2, 9]);
        let result = DefinitionConsolidator::new().consolidate(&mut registry, &BTreeSet::new());

        assert_eq!(
            result,
            ConsolidationResult {
                removed_count: 2,
                remapped_count: 2,
                group_count: 1
            }
        );
        assert!(registry.get_abstract_num(AbstractNumId::new(5)).is_none());
        assert!(registry.get_abstract_num(AbstractNumId::new(9)).is_none());
        assert!(registry
            .all_instances()
            .all(|i| i.abstract_num_id == AbstractNumId::new(2)));
    }

    #[test]
    fn test_consolidation_is_recorded_in_tracker() {
        use crate::DefinitionTier;

        let mut registry = registry_with_duplicates(&[5, 2, 9]);
        DefinitionConsolidator::new().consolidate(&mut registry, &BTreeSet::new());
        let tracker = registry.tracker();
        assert_eq!(tracker.removed(DefinitionTier::Abstract).collect::<Vec<_>>(), vec![5, 9]);
        assert_eq!(tracker.modified(DefinitionTier::Instance).collect::<Vec<_>>(), vec![1, 3]);
        assert!(!tracker.is_modified(DefinitionTier::Abstract, 2));
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut registry = registry_with_duplicates(&[3, 1, 4, 8]);
        let consolidator = DefinitionConsolidator::new();
        let first = consolidator.consolidate(&mut registry, &BTreeSet::new());
        assert_eq!(first.removed_count, 3);

        let second = consolidator.consolidate(&mut registry, &BTreeSet::new());
        assert!(second.is_noop());
        assert_eq!(second.group_count, 0);
    }

    #[test]
    fn test_protected_ids_are_left_alone() {
        let mut registry = registry_with_duplicates(&[5, 2, 9]);
        let protected: BTreeSet<_> = [AbstractNumId::new(2)].into_iter().collect();
        let result = DefinitionConsolidator::new().consolidate(&mut registry, &protected);

        assert_eq!(result.removed_count, 1);
        assert!(registry.get_abstract_num(AbstractNumId::new(2)).is_some());
        assert!(registry.get_abstract_num(AbstractNumId::new(5)).is_some());
        assert!(registry.get_abstract_num(AbstractNumId::new(9)).is_none());
    }

    #[test]
    fn test_distinct_definitions_untouched() {
        let mut registry = NumberingRegistry::new();
        registry.add_abstract_num(AbstractNum::simple_bullet(AbstractNumId::new(0)));
        registry.add_abstract_num(AbstractNum::simple_numbered(AbstractNumId::new(1)));
        registry.mark_loaded();

        let result = DefinitionConsolidator::new().consolidate(&mut registry, &BTreeSet::new());
        assert!(result.is_noop());
        assert!(!registry.has_modifications());
    }
}
