//! In-memory rendering surface.
//!
//! Records what was drawn and what is currently attached. Used by the
//! command-line tool and by tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use carto_model::{Geometry, LatLng, MarkerStyle, PolygonStyle};

use super::RenderSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Handle returned by [`MemorySurface`]. Deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryLayer {
    id: LayerId,
}

impl MemoryLayer {
    pub fn id(&self) -> LayerId {
        self.id
    }
}

/// What a layer was created from.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawnShape {
    Marker {
        positions: usize,
        style: MarkerStyle,
    },
    Polygon {
        kind: &'static str,
        style: PolygonStyle,
    },
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    shapes: BTreeMap<LayerId, DrawnShape>,
    attached: BTreeSet<LayerId>,
    attach_calls: usize,
    detach_calls: usize,
}

#[derive(Debug, Default)]
pub struct MemorySurface {
    inner: Mutex<Inner>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create(&self, shape: DrawnShape) -> MemoryLayer {
        let mut inner = self.lock();
        let id = LayerId(inner.next_id);
        inner.next_id += 1;
        inner.shapes.insert(id, shape);
        MemoryLayer { id }
    }

    pub fn is_attached(&self, id: LayerId) -> bool {
        self.lock().attached.contains(&id)
    }

    /// Number of layers currently visible.
    pub fn attached_count(&self) -> usize {
        self.lock().attached.len()
    }

    /// Number of layers ever created.
    pub fn created_count(&self) -> usize {
        self.lock().next_id as usize
    }

    /// Number of layers created and not yet released.
    pub fn live_count(&self) -> usize {
        self.lock().shapes.len()
    }

    pub fn attach_calls(&self) -> usize {
        self.lock().attach_calls
    }

    pub fn detach_calls(&self) -> usize {
        self.lock().detach_calls
    }

    pub fn shape(&self, id: LayerId) -> Option<DrawnShape> {
        self.lock().shapes.get(&id).cloned()
    }
}

impl RenderSurface for MemorySurface {
    type Layer = MemoryLayer;

    fn create_point_marker(&self, positions: &[LatLng], style: &MarkerStyle) -> MemoryLayer {
        self.create(DrawnShape::Marker {
            positions: positions.len(),
            style: style.clone(),
        })
    }

    fn create_polygon(&self, geometry: &Geometry, style: &PolygonStyle) -> MemoryLayer {
        self.create(DrawnShape::Polygon {
            kind: geometry.kind_name(),
            style: style.clone(),
        })
    }

    fn attach(&self, layer: &MemoryLayer) {
        let mut inner = self.lock();
        inner.attach_calls += 1;
        inner.attached.insert(layer.id);
    }

    fn detach(&self, layer: &MemoryLayer) {
        let mut inner = self.lock();
        inner.detach_calls += 1;
        inner.attached.remove(&layer.id);
    }

    fn release(&self, layer: MemoryLayer) {
        let mut inner = self.lock();
        inner.attached.remove(&layer.id);
        inner.shapes.remove(&layer.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_model::{Color, MarkerShape};

    fn marker() -> MarkerStyle {
        MarkerStyle {
            shape: MarkerShape::Circle,
            fill: Color::new("#666"),
            fill_opacity: 1.0,
            stroke: None,
            stroke_width: 0.0,
            radius: 7.0,
        }
    }

    #[test]
    fn test_attach_and_detach_are_tracked() {
        let surface = MemorySurface::new();
        let point = LatLng::new(50.9, 2.4).unwrap();
        let layer = surface.create_point_marker(&[point], &marker());

        assert!(!surface.is_attached(layer.id()));
        surface.attach(&layer);
        assert!(surface.is_attached(layer.id()));
        assert_eq!(surface.attached_count(), 1);
        surface.detach(&layer);
        assert_eq!(surface.attached_count(), 0);
        assert_eq!(surface.attach_calls(), 1);
        assert_eq!(surface.detach_calls(), 1);
        assert!(matches!(
            surface.shape(layer.id()),
            Some(DrawnShape::Marker { positions: 1, .. })
        ));

        surface.release(layer);
        assert_eq!(surface.live_count(), 0);
        assert_eq!(surface.created_count(), 1);
    }
}
