//! The store contract consumed by the compilers.
//!
//! The storage engine, the object id registry and the concept parser live
//! outside this workspace; compilers only see them through [`QueryStore`].

use crate::data::{EntityRef, PropertyRef, SortDirection, ValueKind};
use crate::description::Description;
use std::collections::HashMap;

pub trait QueryStore {
    /// The defining query of a concept, or `None` when the concept is unknown
    /// or has no definition.
    fn resolve_concept(&self, concept: &EntityRef) -> Option<Description>;

    /// Sort keys of the query being compiled, in priority order.
    /// The empty key sorts by the result entity itself.
    fn sort_keys(&self) -> Vec<(String, SortDirection)> {
        Vec::new()
    }

    /// Numeric storage id of an entity.
    fn backend_identifier(&self, entity: &EntityRef) -> Option<u64>;

    /// Value type of a property.
    fn property_kind(&self, _property: &PropertyRef) -> ValueKind {
        ValueKind::Page
    }

    /// Classes below `class`, down to `depth` levels.
    fn subclasses(&self, _class: &EntityRef, _depth: u32) -> Vec<EntityRef> {
        Vec::new()
    }
}

/// A self-contained in-memory store, handy for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub concepts: HashMap<EntityRef, Description>,
    pub ids: HashMap<EntityRef, u64>,
    pub property_kinds: HashMap<String, ValueKind>,
    pub sort_keys: Vec<(String, SortDirection)>,
    /// Direct subclasses per class.
    pub subclass_edges: HashMap<EntityRef, Vec<EntityRef>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_concept(&mut self, concept: EntityRef, definition: Description) -> &mut Self {
        self.concepts.insert(concept, definition);
        self
    }

    /// Register an entity and return its id (idempotent).
    pub fn register(&mut self, entity: EntityRef) -> u64 {
        if let Some(id) = self.ids.get(&entity) {
            return *id;
        }
        self.next_id += 1;
        self.ids.insert(entity, self.next_id);
        self.next_id
    }

    pub fn set_property_kind(&mut self, key: &str, kind: ValueKind) -> &mut Self {
        self.property_kinds.insert(key.replace(' ', "_"), kind);
        self
    }

    pub fn add_sort_key(&mut self, key: &str, direction: SortDirection) -> &mut Self {
        self.sort_keys.push((key.replace(' ', "_"), direction));
        self
    }

    pub fn add_subclass(&mut self, parent: EntityRef, child: EntityRef) -> &mut Self {
        self.subclass_edges.entry(parent).or_default().push(child);
        self
    }
}

impl QueryStore for MemoryStore {
    fn resolve_concept(&self, concept: &EntityRef) -> Option<Description> {
        self.concepts.get(concept).cloned()
    }

    fn sort_keys(&self) -> Vec<(String, SortDirection)> {
        self.sort_keys.clone()
    }

    fn backend_identifier(&self, entity: &EntityRef) -> Option<u64> {
        self.ids.get(entity).copied()
    }

    fn property_kind(&self, property: &PropertyRef) -> ValueKind {
        self.property_kinds
            .get(&property.key)
            .copied()
            .unwrap_or(ValueKind::Page)
    }

    fn subclasses(&self, class: &EntityRef, depth: u32) -> Vec<EntityRef> {
        let mut out: Vec<EntityRef> = Vec::new();
        let mut frontier = vec![class.clone()];
        for _ in 0..depth {
            let mut next = Vec::new();
            for parent in &frontier {
                for child in self.subclass_edges.get(parent).into_iter().flatten() {
                    if child != class && !out.contains(child) {
                        out.push(child.clone());
                        next.push(child.clone());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        out
    }
}
