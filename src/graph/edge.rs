//! Edge implementation
//!
//! A directed edge holds non-owning references (plain ids) to two live
//! vertices. Endpoints and the edge-type id never change after creation;
//! only the property set is mutable, behind the edge's own gate.

use crate::gate::{GateResult, Gated};
use crate::graph::property::{PropertySet, PropertyValue};
use crate::graph::types::{EdgeTypeId, ElementId, PropertyId};

#[derive(Debug)]
struct EdgeBody {
    modified_at: u32,
    properties: PropertySet,
}

/// A directed edge in the property graph.
#[derive(Debug)]
pub struct Edge {
    id: ElementId,
    created_at: u32,
    source_id: ElementId,
    target_id: ElementId,
    edge_type_id: EdgeTypeId,
    body: Gated<EdgeBody>,
}

impl Edge {
    pub fn new(
        id: ElementId,
        created_at: u32,
        source_id: ElementId,
        target_id: ElementId,
        edge_type_id: EdgeTypeId,
        properties: Vec<(PropertyId, PropertyValue)>,
    ) -> Self {
        Edge {
            id,
            created_at,
            source_id,
            target_id,
            edge_type_id,
            body: Gated::new(EdgeBody {
                modified_at: created_at,
                properties: PropertySet::from_entries(properties),
            }),
        }
    }

    /// Rebuild an edge from persisted parts.
    pub(crate) fn restore(
        id: ElementId,
        created_at: u32,
        modified_at: u32,
        source_id: ElementId,
        target_id: ElementId,
        edge_type_id: EdgeTypeId,
        properties: Vec<(PropertyId, PropertyValue)>,
    ) -> Self {
        Edge {
            id,
            created_at,
            source_id,
            target_id,
            edge_type_id,
            body: Gated::new(EdgeBody {
                modified_at,
                properties: PropertySet::from_entries(properties),
            }),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn created_at(&self) -> u32 {
        self.created_at
    }

    pub fn modified_at(&self) -> GateResult<u32> {
        self.body.read(|b| b.modified_at)
    }

    /// The vertex this edge leaves from.
    pub fn source_id(&self) -> ElementId {
        self.source_id
    }

    /// The vertex this edge points at.
    pub fn target_id(&self) -> ElementId {
        self.target_id
    }

    pub fn edge_type_id(&self) -> EdgeTypeId {
        self.edge_type_id
    }

    pub fn get_property(&self, id: PropertyId) -> GateResult<Option<PropertyValue>> {
        self.body.read(|b| b.properties.get(id).cloned())
    }

    pub fn get_all_properties(&self) -> GateResult<Vec<(PropertyId, PropertyValue)>> {
        self.body.read(|b| b.properties.to_vec())
    }

    pub fn get_property_count(&self) -> GateResult<usize> {
        self.body.read(|b| b.properties.len())
    }

    /// Insert or replace a property. Returns `true` on update of an
    /// existing entry.
    pub fn try_add_property(
        &self,
        id: PropertyId,
        value: PropertyValue,
        timestamp: u32,
    ) -> GateResult<bool> {
        self.body.write(|b| {
            let replaced = b.properties.upsert(id, value);
            b.modified_at = timestamp;
            replaced
        })
    }

    pub fn try_remove_property(&self, id: PropertyId, timestamp: u32) -> GateResult<bool> {
        self.body.write(|b| {
            let removed = b.properties.remove(id);
            if removed {
                b.modified_at = timestamp;
            }
            removed
        })
    }

    /// Release excess property-set capacity.
    pub(crate) fn compact(&self) -> GateResult<()> {
        self.body.write(|b| b.properties.compact())
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_fixed() {
        let e = Edge::new(10, 5, 1, 2, 7, Vec::new());
        assert_eq!(e.id(), 10);
        assert_eq!(e.source_id(), 1);
        assert_eq!(e.target_id(), 2);
        assert_eq!(e.edge_type_id(), 7);
        assert_eq!(e.created_at(), 5);
        assert_eq!(e.modified_at().unwrap(), 5);
    }

    #[test]
    fn test_edge_properties() {
        let e = Edge::new(10, 0, 1, 2, 7, vec![(4, 2.5.into())]);
        assert_eq!(e.get_property(4).unwrap().unwrap().as_float(), Some(2.5));
        assert!(!e.try_add_property(5, true.into(), 50).unwrap());
        assert_eq!(e.get_property_count().unwrap(), 2);
        assert!(e.try_remove_property(4, 60).unwrap());
        assert_eq!(e.modified_at().unwrap(), 60);
    }

    #[test]
    fn test_identity_equality() {
        let a = Edge::new(1, 0, 1, 2, 7, Vec::new());
        let b = Edge::new(1, 9, 3, 4, 8, Vec::new());
        let c = Edge::new(2, 0, 1, 2, 7, Vec::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
