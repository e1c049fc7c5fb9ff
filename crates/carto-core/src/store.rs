//! Visibility intent, independent of what is loaded.

use std::collections::BTreeSet;

use carto_model::{Category, RecordId};

use crate::error::LayerError;

/// Master toggles for every category plus the per-record overrides of the
/// compound categories.
///
/// Only `false` overrides are stored. A record without an entry is shown
/// whenever its master toggle is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityStore {
    masters: [bool; 4],
    hidden: [BTreeSet<RecordId>; 4],
}

impl Default for VisibilityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityStore {
    /// Every master on, no overrides.
    pub fn new() -> Self {
        Self {
            masters: [true; 4],
            hidden: Default::default(),
        }
    }

    pub fn master(&self, category: Category) -> bool {
        self.masters[category.index()]
    }

    pub fn set_master(&mut self, category: Category, visible: bool) {
        self.masters[category.index()] = visible;
    }

    pub fn set_override(
        &mut self,
        category: Category,
        id: &RecordId,
        visible: bool,
    ) -> Result<(), LayerError> {
        if !category.is_compound() {
            return Err(LayerError::NotCompound { category });
        }
        let hidden = &mut self.hidden[category.index()];
        if visible {
            hidden.remove(id);
        } else {
            hidden.insert(id.clone());
        }
        Ok(())
    }

    /// The per-record intent. `true` unless explicitly hidden.
    pub fn override_of(&self, category: Category, id: &RecordId) -> bool {
        !self.hidden[category.index()].contains(id)
    }

    /// Whether a loaded record should currently be attached.
    pub fn is_visible(&self, category: Category, id: &RecordId) -> bool {
        self.master(category) && (!category.is_compound() || self.override_of(category, id))
    }

    pub fn hidden(&self, category: Category) -> &BTreeSet<RecordId> {
        &self.hidden[category.index()]
    }

    pub fn clear_overrides(&mut self, category: Category) {
        self.hidden[category.index()].clear();
    }

    /// Keeps only the overrides whose identity satisfies `keep`. Returns how
    /// many were dropped.
    pub fn retain_overrides(
        &mut self,
        category: Category,
        mut keep: impl FnMut(&RecordId) -> bool,
    ) -> usize {
        let hidden = &mut self.hidden[category.index()];
        let before = hidden.len();
        hidden.retain(|id| keep(id));
        before - hidden.len()
    }

    /// Sets every master to `masters`. Overrides are left alone.
    pub fn reset_all(&mut self, masters: bool) {
        self.masters = [masters; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RecordId {
        RecordId::new(s).unwrap()
    }

    #[test]
    fn test_defaults_show_everything() {
        let store = VisibilityStore::new();
        for category in Category::ALL {
            assert!(store.master(category));
            assert!(store.is_visible(category, &id("x")));
        }
    }

    #[test]
    fn test_override_requires_compound_category() {
        let mut store = VisibilityStore::new();
        let err = store
            .set_override(Category::Beneficiaries, &id("1"), false)
            .unwrap_err();
        assert_eq!(
            err,
            LayerError::NotCompound {
                category: Category::Beneficiaries
            }
        );
    }

    #[test]
    fn test_master_gates_overrides() {
        let mut store = VisibilityStore::new();
        store
            .set_override(Category::FieldAgents, &id("A"), false)
            .unwrap();
        assert!(!store.is_visible(Category::FieldAgents, &id("A")));
        assert!(store.is_visible(Category::FieldAgents, &id("B")));

        store.set_master(Category::FieldAgents, false);
        assert!(!store.is_visible(Category::FieldAgents, &id("B")));
        // The override survives the master going off and on again.
        store.set_master(Category::FieldAgents, true);
        assert!(!store.override_of(Category::FieldAgents, &id("A")));
    }

    #[test]
    fn test_reset_all_keeps_overrides() {
        let mut store = VisibilityStore::new();
        store
            .set_override(Category::TeamSectors, &id("1"), false)
            .unwrap();
        store.reset_all(false);
        assert!(!store.master(Category::TeamSectors));
        assert_eq!(store.hidden(Category::TeamSectors).len(), 1);

        store.clear_overrides(Category::TeamSectors);
        assert!(store.hidden(Category::TeamSectors).is_empty());
    }

    #[test]
    fn test_retain_overrides_reports_pruned() {
        let mut store = VisibilityStore::new();
        for name in ["A", "B", "C"] {
            store
                .set_override(Category::AgentSectors, &id(name), false)
                .unwrap();
        }
        let pruned = store.retain_overrides(Category::AgentSectors, |id| id.as_str() != "B");
        assert_eq!(pruned, 1);
        assert!(store.override_of(Category::AgentSectors, &id("B")));
        assert!(!store.override_of(Category::AgentSectors, &id("C")));
    }
}
