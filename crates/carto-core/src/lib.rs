//! Layer visibility state and data synchronization for the map dashboard.
//!
//! The pieces, leaf first:
//!
//! - [`VisibilityStore`]: master toggles and per-record overrides
//! - [`EntityRegistry`]: loaded records and their layers, per category
//! - [`resolver`]: the only code that attaches or detaches layers
//! - [`SyncPipeline`]: fetches categories and installs the results
//! - [`LifecycleController`]: loads or clears everything on session changes
//!
//! All mutable state lives in a [`MapContext`] behind one lock. The
//! rendering surface and the data source are traits so the core runs the
//! same against a real map, an in-memory surface, or test doubles.

pub mod context;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod store;
pub mod surface;
pub mod sync;
pub mod view;

pub use context::{LayerState, MapContext, TeardownSummary};
pub use error::{LayerError, LifecycleError};
pub use lifecycle::{LifecycleController, LifecycleState, SessionEvent, UserSession};
pub use registry::{EntityRegistry, RegistryEntry};
pub use resolver::ApplyStats;
pub use source::{DataSource, FetchError};
pub use store::VisibilityStore;
pub use surface::{MemoryLayer, MemorySurface, RenderSurface};
pub use sync::{LoadOutcome, LoadReport, LoadSummary, SyncPipeline};
pub use view::{CategoryView, PanelEntry};
