use carto_core::{CategoryView, LifecycleState, LoadReport, TeardownSummary};

/// Everything a `sync` run produced.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Where rows came from: a fixture directory or the project URL.
    pub source: String,
    /// Signed-in user id, already redacted if needed.
    pub user: String,
    pub load: LoadReport,
    pub refresh: Option<LoadReport>,
    /// Lifecycle state before the final teardown.
    pub state: LifecycleState,
    /// Panel views before the final teardown.
    pub views: Vec<CategoryView>,
    /// Layers attached on the surface before the final teardown.
    pub attached_layers: usize,
    pub teardown: TeardownSummary,
}

impl SyncResult {
    /// The report of the latest pass.
    pub fn latest(&self) -> &LoadReport {
        self.refresh.as_ref().unwrap_or(&self.load)
    }

    pub fn has_failures(&self) -> bool {
        self.latest().failures().next().is_some()
    }
}
