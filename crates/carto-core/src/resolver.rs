//! The only code path that attaches or detaches layers.

use tracing::debug;

use carto_model::{Category, RecordId};

use crate::context::{LayerState, MapContext};
use crate::error::LayerError;
use crate::surface::RenderSurface;
use crate::view::{PanelEntry, panel_entries};

/// Surface calls made by one resolver pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyStats {
    pub attached: usize,
    pub detached: usize,
}

/// Brings every layer of `category` in line with the store.
pub(crate) fn apply<S>(
    surface: &S,
    state: &mut LayerState<S::Layer>,
    category: Category,
) -> ApplyStats
where
    S: RenderSurface + ?Sized,
{
    let store = &state.store;
    let mut stats = ApplyStats::default();
    for entry in state.registries[category.index()].iter_mut() {
        let visible = store.is_visible(category, entry.id());
        if entry.show(surface, visible) {
            if visible {
                stats.attached += 1;
            } else {
                stats.detached += 1;
            }
        }
    }
    stats
}

impl<S: RenderSurface> MapContext<S> {
    /// Re-applies the store to `category` and publishes its view.
    pub fn apply_category(&self, category: Category) -> ApplyStats {
        let mut guard = self.lock();
        let stats = apply(self.surface().as_ref(), &mut guard, category);
        self.publish(&mut guard, category);
        stats
    }

    pub fn toggle_master(&self, category: Category, visible: bool) -> ApplyStats {
        let mut guard = self.lock();
        guard.store.set_master(category, visible);
        let stats = apply(self.surface().as_ref(), &mut guard, category);
        self.publish(&mut guard, category);
        debug!(category = %category, visible, ?stats, "master toggled");
        stats
    }

    /// Shows or hides one loaded record of a compound category.
    pub fn toggle_override(
        &self,
        category: Category,
        id: &RecordId,
        visible: bool,
    ) -> Result<ApplyStats, LayerError> {
        if !category.is_compound() {
            return Err(LayerError::NotCompound { category });
        }
        let mut guard = self.lock();
        if !guard.registry(category).contains(id) {
            return Err(LayerError::UnknownRecord {
                category,
                id: id.clone(),
            });
        }
        guard.store.set_override(category, id, visible)?;
        let stats = apply(self.surface().as_ref(), &mut guard, category);
        self.publish(&mut guard, category);
        debug!(category = %category, id = %id, visible, "override toggled");
        Ok(stats)
    }

    /// Checkbox rows for `category`, in load order. Empty for simple
    /// categories.
    pub fn render(&self, category: Category) -> Vec<PanelEntry> {
        panel_entries(&self.lock(), category)
    }
}
