//! Loaded records and the layers drawn for them, per category.

use std::collections::{BTreeSet, HashMap};

use carto_model::{Category, Record, RecordId};

use crate::surface::{RenderSurface, build_layer};

/// One loaded record and its layer.
#[derive(Debug)]
pub struct RegistryEntry<L> {
    record: Record,
    layer: L,
    attached: bool,
}

impl<L> RegistryEntry<L> {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn id(&self) -> &RecordId {
        self.record.id()
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Brings the layer to the requested state. Returns whether the surface
    /// was called.
    pub(crate) fn show<S>(&mut self, surface: &S, visible: bool) -> bool
    where
        S: RenderSurface<Layer = L> + ?Sized,
    {
        if self.attached == visible {
            return false;
        }
        if visible {
            surface.attach(&self.layer);
        } else {
            surface.detach(&self.layer);
        }
        self.attached = visible;
        true
    }
}

/// Records currently loaded for one category, in load order.
#[derive(Debug)]
pub struct EntityRegistry<L> {
    category: Category,
    entries: Vec<RegistryEntry<L>>,
    index: HashMap<RecordId, usize>,
}

impl<L> EntityRegistry<L> {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Detaches and drops every current entry, then builds a detached layer
    /// for each of `records`. A later record with an existing identity
    /// replaces the earlier one in place.
    ///
    /// Returns the identities loaded before the call.
    pub fn replace<S>(&mut self, records: Vec<Record>, surface: &S) -> BTreeSet<RecordId>
    where
        S: RenderSurface<Layer = L> + ?Sized,
    {
        let previous: BTreeSet<RecordId> = self.index.keys().cloned().collect();
        self.clear(surface);

        for record in records {
            let entry = RegistryEntry {
                layer: build_layer(surface, &record),
                record,
                attached: false,
            };
            match self.index.get(entry.id()) {
                Some(&at) => {
                    let older = std::mem::replace(&mut self.entries[at], entry);
                    surface.release(older.layer);
                }
                None => {
                    self.index.insert(entry.id().clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }

        previous
    }

    /// Detaches and releases every entry. Returns how many were detached.
    pub fn clear<S>(&mut self, surface: &S) -> usize
    where
        S: RenderSurface<Layer = L> + ?Sized,
    {
        let mut detached = 0;
        for mut entry in self.entries.drain(..) {
            detached += usize::from(entry.show(surface, false));
            surface.release(entry.layer);
        }
        self.index.clear();
        detached
    }

    pub fn get(&self, id: &RecordId) -> Option<&RegistryEntry<L>> {
        self.index.get(id).map(|&at| &self.entries[at])
    }

    pub(crate) fn get_mut(&mut self, id: &RecordId) -> Option<&mut RegistryEntry<L>> {
        self.index.get(id).map(|&at| &mut self.entries[at])
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry<L>> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegistryEntry<L>> {
        self.entries.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.entries.iter().map(RegistryEntry::id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn attached_count(&self) -> usize {
        self.entries.iter().filter(|e| e.attached).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;
    use carto_model::{Color, FieldAgent, LatLng};

    fn agent(id: &str) -> Record {
        Record::FieldAgent(FieldAgent {
            id: RecordId::new(id).unwrap(),
            positions: vec![LatLng::new(50.97, 2.43).unwrap()],
            color: Some(Color::new("#123")),
            team_id: None,
        })
    }

    #[test]
    fn test_replace_builds_detached_layers() {
        let surface = MemorySurface::new();
        let mut registry = EntityRegistry::new(Category::FieldAgents);

        let previous = registry.replace(vec![agent("A"), agent("B")], &surface);

        assert!(previous.is_empty());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.attached_count(), 0);
        assert_eq!(surface.created_count(), 2);
        assert_eq!(surface.attach_calls(), 0);
    }

    #[test]
    fn test_replace_detaches_old_layers_and_reports_previous() {
        let surface = MemorySurface::new();
        let mut registry = EntityRegistry::new(Category::FieldAgents);
        registry.replace(vec![agent("A"), agent("B")], &surface);
        for entry in registry.iter_mut() {
            entry.show(&surface, true);
        }
        assert_eq!(surface.attached_count(), 2);

        let previous = registry.replace(vec![agent("B"), agent("C")], &surface);

        let previous: Vec<_> = previous.iter().map(RecordId::as_str).collect();
        assert_eq!(previous, vec!["A", "B"]);
        assert_eq!(surface.attached_count(), 0);
        let ids: Vec<_> = registry.ids().map(RecordId::as_str).collect();
        assert_eq!(ids, vec!["B", "C"]);
    }

    #[test]
    fn test_replaced_layers_are_released() {
        let surface = MemorySurface::new();
        let mut registry = EntityRegistry::new(Category::FieldAgents);

        for _ in 0..5 {
            registry.replace(vec![agent("A"), agent("B")], &surface);
        }
        assert_eq!(surface.created_count(), 10);
        assert_eq!(surface.live_count(), 2);

        registry.replace(vec![agent("A"), agent("A")], &surface);
        assert_eq!(registry.len(), 1);
        assert_eq!(surface.live_count(), 1);

        registry.clear(&surface);
        assert_eq!(surface.live_count(), 0);
    }

    #[test]
    fn test_show_only_calls_surface_on_transitions() {
        let surface = MemorySurface::new();
        let mut registry = EntityRegistry::new(Category::FieldAgents);
        registry.replace(vec![agent("A")], &surface);
        let id = RecordId::new("A").unwrap();

        let entry = registry.get_mut(&id).unwrap();
        assert!(entry.show(&surface, true));
        assert!(!entry.show(&surface, true));
        assert_eq!(surface.attach_calls(), 1);

        assert_eq!(registry.clear(&surface), 1);
        assert_eq!(registry.clear(&surface), 0);
        assert_eq!(surface.detach_calls(), 1);
    }
}
