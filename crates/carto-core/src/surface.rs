//! The rendering surface seam.
//!
//! The core never draws anything itself. It asks a [`RenderSurface`] to
//! build one layer per record and then only toggles whether that layer is
//! attached.

mod memory;

pub use memory::{DrawnShape, LayerId, MemoryLayer, MemorySurface};

use carto_model::{Geometry, LatLng, MarkerStyle, PolygonStyle, Record, Style};

/// Something that can display map layers.
///
/// Calls are made while the layer state lock is held, so implementations
/// must not call back into the context.
pub trait RenderSurface: Send + Sync {
    /// Handle to one drawn object. Owned by exactly one registry entry.
    type Layer: Send;

    fn create_point_marker(&self, positions: &[LatLng], style: &MarkerStyle) -> Self::Layer;

    fn create_polygon(&self, geometry: &Geometry, style: &PolygonStyle) -> Self::Layer;

    /// Makes the layer visible. Never called twice in a row for one layer.
    fn attach(&self, layer: &Self::Layer);

    /// Hides the layer. Never called for a layer that is not attached.
    fn detach(&self, layer: &Self::Layer);

    /// Hands back a detached layer that no record owns any more.
    fn release(&self, _layer: Self::Layer) {}
}

/// Builds the detached layer for a record.
pub(crate) fn build_layer<S>(surface: &S, record: &Record) -> S::Layer
where
    S: RenderSurface + ?Sized,
{
    match record.style() {
        Style::Marker(style) => surface.create_point_marker(&record.geometry().points(), &style),
        Style::Polygon(style) => surface.create_polygon(&record.geometry(), &style),
    }
}
