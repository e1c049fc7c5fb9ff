//! Read-side snapshots for the layer panel.

use chrono::{DateTime, Utc};
use serde::Serialize;

use carto_model::{Category, Color, RecordId};

use crate::context::LayerState;

/// One checkbox row under a compound category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelEntry {
    pub id: RecordId,
    pub label: String,
    pub color: Color,
    /// The record's override, not its effective visibility.
    pub checked: bool,
}

/// Published state of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub category: Category,
    pub master: bool,
    pub record_count: usize,
    pub attached_count: usize,
    /// Empty for simple categories.
    pub entries: Vec<PanelEntry>,
    pub loaded_at: Option<DateTime<Utc>>,
    /// Bumped on every publish.
    pub revision: u64,
}

impl CategoryView {
    pub fn empty(category: Category) -> Self {
        Self {
            category,
            master: true,
            record_count: 0,
            attached_count: 0,
            entries: Vec::new(),
            loaded_at: None,
            revision: 0,
        }
    }

    pub fn hidden_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.checked).count()
    }
}

pub(crate) fn panel_entries<L>(state: &LayerState<L>, category: Category) -> Vec<PanelEntry> {
    if !category.is_compound() {
        return Vec::new();
    }
    let store = state.store();
    state
        .registry(category)
        .iter()
        .map(|entry| PanelEntry {
            id: entry.id().clone(),
            label: entry.record().label(),
            color: entry.record().color(),
            checked: store.override_of(category, entry.id()),
        })
        .collect()
}

pub(crate) fn category_view<L>(state: &LayerState<L>, category: Category) -> CategoryView {
    let registry = state.registry(category);
    CategoryView {
        category,
        master: state.store().master(category),
        record_count: registry.len(),
        attached_count: registry.attached_count(),
        entries: panel_entries(state, category),
        loaded_at: state.loaded_at(category),
        revision: state.revision(category),
    }
}
