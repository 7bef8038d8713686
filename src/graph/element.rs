//! Graph element: the store's slot type
//!
//! Every slot in the sharded store holds either a vertex or an edge behind
//! one enum, so persistence and scans can treat the element population
//! uniformly while the engine dispatches on kind.

use crate::gate::GateResult;
use crate::graph::edge::Edge;
use crate::graph::property::PropertyValue;
use crate::graph::types::{ElementId, PropertyId};
use crate::graph::vertex::Vertex;

/// A live element in the store: vertex or edge.
#[derive(Debug)]
pub enum GraphElement {
    Vertex(Vertex),
    Edge(Edge),
}

impl GraphElement {
    pub fn id(&self) -> ElementId {
        match self {
            GraphElement::Vertex(v) => v.id(),
            GraphElement::Edge(e) => e.id(),
        }
    }

    pub fn created_at(&self) -> u32 {
        match self {
            GraphElement::Vertex(v) => v.created_at(),
            GraphElement::Edge(e) => e.created_at(),
        }
    }

    pub fn modified_at(&self) -> GateResult<u32> {
        match self {
            GraphElement::Vertex(v) => v.modified_at(),
            GraphElement::Edge(e) => e.modified_at(),
        }
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self, GraphElement::Vertex(_))
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, GraphElement::Edge(_))
    }

    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            GraphElement::Vertex(v) => Some(v),
            GraphElement::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            GraphElement::Vertex(_) => None,
            GraphElement::Edge(e) => Some(e),
        }
    }

    pub fn get_property(&self, id: PropertyId) -> GateResult<Option<PropertyValue>> {
        match self {
            GraphElement::Vertex(v) => v.get_property(id),
            GraphElement::Edge(e) => e.get_property(id),
        }
    }

    pub fn get_all_properties(&self) -> GateResult<Vec<(PropertyId, PropertyValue)>> {
        match self {
            GraphElement::Vertex(v) => v.get_all_properties(),
            GraphElement::Edge(e) => e.get_all_properties(),
        }
    }

    pub fn get_property_count(&self) -> GateResult<usize> {
        match self {
            GraphElement::Vertex(v) => v.get_property_count(),
            GraphElement::Edge(e) => e.get_property_count(),
        }
    }

    pub fn try_add_property(
        &self,
        id: PropertyId,
        value: PropertyValue,
        timestamp: u32,
    ) -> GateResult<bool> {
        match self {
            GraphElement::Vertex(v) => v.try_add_property(id, value, timestamp),
            GraphElement::Edge(e) => e.try_add_property(id, value, timestamp),
        }
    }

    pub fn try_remove_property(&self, id: PropertyId, timestamp: u32) -> GateResult<bool> {
        match self {
            GraphElement::Vertex(v) => v.try_remove_property(id, timestamp),
            GraphElement::Edge(e) => e.try_remove_property(id, timestamp),
        }
    }

    pub(crate) fn compact(&self) -> GateResult<()> {
        match self {
            GraphElement::Vertex(v) => v.compact(),
            GraphElement::Edge(e) => e.compact(),
        }
    }
}

impl PartialEq for GraphElement {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for GraphElement {}

impl std::hash::Hash for GraphElement {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
