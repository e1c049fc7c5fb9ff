//! The shared map context.
//!
//! [`MapContext`] owns the rendering surface, the single-writer layer state
//! and one observable view per category. Every mutation goes through
//! [`MapContext::lock`] and ends by publishing the affected views.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::info;

use carto_model::{Category, RecordId};

use crate::registry::EntityRegistry;
use crate::store::VisibilityStore;
use crate::surface::RenderSurface;
use crate::view::{CategoryView, category_view};

/// Everything guarded by the single-writer lock.
#[derive(Debug)]
pub struct LayerState<L> {
    pub(crate) store: VisibilityStore,
    pub(crate) registries: [EntityRegistry<L>; 4],
    /// Bumped by every teardown. Loads started in an older epoch are dropped.
    pub(crate) epoch: u64,
    /// Latest load ticket issued per category.
    pub(crate) tickets: [u64; 4],
    pub(crate) loaded_at: [Option<DateTime<Utc>>; 4],
    pub(crate) revisions: [u64; 4],
    pub(crate) panel_open: bool,
}

impl<L> LayerState<L> {
    fn new() -> Self {
        Self {
            store: VisibilityStore::new(),
            registries: Category::ALL.map(EntityRegistry::new),
            epoch: 0,
            tickets: [0; 4],
            loaded_at: [None; 4],
            revisions: [0; 4],
            panel_open: false,
        }
    }

    pub fn store(&self) -> &VisibilityStore {
        &self.store
    }

    pub fn registry(&self, category: Category) -> &EntityRegistry<L> {
        &self.registries[category.index()]
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn loaded_at(&self, category: Category) -> Option<DateTime<Utc>> {
        self.loaded_at[category.index()]
    }

    pub fn revision(&self, category: Category) -> u64 {
        self.revisions[category.index()]
    }

    pub fn panel_is_open(&self) -> bool {
        self.panel_open
    }

    pub(crate) fn issue_ticket(&mut self, category: Category) -> u64 {
        let ticket = &mut self.tickets[category.index()];
        *ticket += 1;
        *ticket
    }

    pub(crate) fn latest_ticket(&self, category: Category) -> u64 {
        self.tickets[category.index()]
    }
}

/// What a teardown removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownSummary {
    pub epoch: u64,
    pub records: usize,
    pub detached: usize,
    pub overrides: usize,
}

pub struct MapContext<S: RenderSurface> {
    surface: Arc<S>,
    state: Mutex<LayerState<S::Layer>>,
    views: [watch::Sender<CategoryView>; 4],
}

impl<S: RenderSurface> MapContext<S> {
    pub fn new(surface: Arc<S>) -> Self {
        Self {
            surface,
            state: Mutex::new(LayerState::new()),
            views: Category::ALL.map(|category| watch::Sender::new(CategoryView::empty(category))),
        }
    }

    pub fn surface(&self) -> &Arc<S> {
        &self.surface
    }

    /// Takes the single-writer lock. Never hold the guard across an await.
    pub(crate) fn lock(&self) -> MutexGuard<'_, LayerState<S::Layer>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against a consistent snapshot of the layer state.
    pub fn inspect<R>(&self, f: impl FnOnce(&LayerState<S::Layer>) -> R) -> R {
        f(&self.lock())
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn master(&self, category: Category) -> bool {
        self.lock().store.master(category)
    }

    pub fn override_of(&self, category: Category, id: &RecordId) -> bool {
        self.lock().store.override_of(category, id)
    }

    /// Whether the record's layer is attached, or `None` if not loaded.
    pub fn is_attached(&self, category: Category, id: &RecordId) -> Option<bool> {
        self.lock()
            .registry(category)
            .get(id)
            .map(|entry| entry.is_attached())
    }

    pub fn subscribe(&self, category: Category) -> watch::Receiver<CategoryView> {
        self.views[category.index()].subscribe()
    }

    /// Latest published view of `category`.
    pub fn view(&self, category: Category) -> CategoryView {
        self.views[category.index()].borrow().clone()
    }

    /// Marks the panel open and returns fresh views of every category.
    pub fn open_panel(&self) -> Vec<CategoryView> {
        let mut state = self.lock();
        state.panel_open = true;
        Category::ALL
            .iter()
            .map(|&category| category_view(&state, category))
            .collect()
    }

    pub fn close_panel(&self) {
        self.lock().panel_open = false;
    }

    pub fn panel_is_open(&self) -> bool {
        self.lock().panel_open
    }

    /// Clears every registry, drops all overrides, turns every master off
    /// and closes the panel. Loads still in flight are fenced off by the
    /// epoch bump. Safe to call any number of times.
    pub fn teardown(&self) -> TeardownSummary {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.epoch += 1;
        let mut summary = TeardownSummary {
            epoch: state.epoch,
            ..TeardownSummary::default()
        };
        for category in Category::ALL {
            let registry = &mut state.registries[category.index()];
            summary.records += registry.len();
            summary.detached += registry.clear(self.surface.as_ref());
            summary.overrides += state.store.hidden(category).len();
            state.store.clear_overrides(category);
            state.loaded_at[category.index()] = None;
        }
        state.store.reset_all(false);
        state.panel_open = false;
        for category in Category::ALL {
            self.publish(state, category);
        }
        info!(
            epoch = summary.epoch,
            records = summary.records,
            detached = summary.detached,
            "layers torn down"
        );
        summary
    }

    /// Publishes the current view of `category`. Called with the lock held
    /// so views are published in mutation order.
    pub(crate) fn publish(&self, state: &mut LayerState<S::Layer>, category: Category) {
        state.revisions[category.index()] += 1;
        self.views[category.index()].send_replace(category_view(state, category));
    }
}
