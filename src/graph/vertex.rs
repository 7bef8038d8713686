//! Vertex implementation
//!
//! A vertex owns its property set and two adjacency maps (outgoing and
//! incoming), each grouping edge ids by edge-type id. All mutable state
//! lives behind the vertex's own gate; the engine-wide gate never reaches
//! down to this level.

use crate::gate::{GateResult, Gated};
use crate::graph::property::{PropertySet, PropertyValue};
use crate::graph::types::{EdgeTypeId, ElementId, PropertyId};
use indexmap::IndexMap;

/// Adjacency mapping: edge-type id to the ordered list of edge ids.
pub type AdjacencyGroups = IndexMap<EdgeTypeId, Vec<ElementId>>;

#[derive(Debug)]
struct VertexBody {
    modified_at: u32,
    properties: PropertySet,
    out_groups: AdjacencyGroups,
    in_groups: AdjacencyGroups,
}

/// A vertex in the property graph.
///
/// Identity is the id alone; `created_at` is immutable after construction.
#[derive(Debug)]
pub struct Vertex {
    id: ElementId,
    created_at: u32,
    body: Gated<VertexBody>,
}

impl Vertex {
    /// Create a vertex with no adjacency.
    pub fn new(id: ElementId, created_at: u32, properties: Vec<(PropertyId, PropertyValue)>) -> Self {
        Vertex {
            id,
            created_at,
            body: Gated::new(VertexBody {
                modified_at: created_at,
                properties: PropertySet::from_entries(properties),
                out_groups: IndexMap::new(),
                in_groups: IndexMap::new(),
            }),
        }
    }

    /// Rebuild a vertex from persisted parts, adjacency included.
    pub(crate) fn restore(
        id: ElementId,
        created_at: u32,
        modified_at: u32,
        properties: Vec<(PropertyId, PropertyValue)>,
        out_groups: AdjacencyGroups,
        in_groups: AdjacencyGroups,
    ) -> Self {
        Vertex {
            id,
            created_at,
            body: Gated::new(VertexBody {
                modified_at,
                properties: PropertySet::from_entries(properties),
                out_groups,
                in_groups,
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

    // ------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------

    pub fn get_property(&self, id: PropertyId) -> GateResult<Option<PropertyValue>> {
        self.body.read(|b| b.properties.get(id).cloned())
    }

    pub fn get_all_properties(&self) -> GateResult<Vec<(PropertyId, PropertyValue)>> {
        self.body.read(|b| b.properties.to_vec())
    }

    pub fn get_property_count(&self) -> GateResult<usize> {
        self.body.read(|b| b.properties.len())
    }

    /// Insert or replace a property. Returns `true` when an existing entry
    /// was updated, `false` when a new one was inserted.
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

    /// Remove a property. `modified_at` moves only when something was
    /// actually removed.
    pub fn try_remove_property(&self, id: PropertyId, timestamp: u32) -> GateResult<bool> {
        self.body.write(|b| {
            let removed = b.properties.remove(id);
            if removed {
                b.modified_at = timestamp;
            }
            removed
        })
    }

    // ------------------------------------------------------------
    // Adjacency
    // ------------------------------------------------------------

    /// Append an edge id to the outgoing group for `edge_type`, creating the
    /// group lazily on first insert.
    pub fn add_out_edge(&self, edge_type: EdgeTypeId, edge_id: ElementId) -> GateResult<()> {
        self.body.write(|b| {
            b.out_groups.entry(edge_type).or_default().push(edge_id);
        })
    }

    /// Append an edge id to the incoming group for `edge_type`.
    pub fn add_incoming_edge(&self, edge_type: EdgeTypeId, edge_id: ElementId) -> GateResult<()> {
        self.body.write(|b| {
            b.in_groups.entry(edge_type).or_default().push(edge_id);
        })
    }

    /// Remove `edge_id` from every outgoing group it appears in. Returns the
    /// edge-type ids actually touched; emptied groups are kept, not pruned.
    pub fn remove_out_edge(&self, edge_id: ElementId) -> GateResult<Vec<EdgeTypeId>> {
        self.body
            .write(|b| Self::unlink(&mut b.out_groups, edge_id))
    }

    /// Remove `edge_id` from every incoming group it appears in.
    pub fn remove_incoming_edge(&self, edge_id: ElementId) -> GateResult<Vec<EdgeTypeId>> {
        self.body.write(|b| Self::unlink(&mut b.in_groups, edge_id))
    }

    fn unlink(groups: &mut AdjacencyGroups, edge_id: ElementId) -> Vec<EdgeTypeId> {
        let mut touched = Vec::new();
        for (edge_type, edges) in groups.iter_mut() {
            let before = edges.len();
            edges.retain(|&e| e != edge_id);
            if edges.len() != before {
                touched.push(*edge_type);
            }
        }
        touched
    }

    pub fn degree_out(&self) -> GateResult<u32> {
        self.body
            .read(|b| b.out_groups.values().map(|v| v.len() as u32).sum())
    }

    pub fn degree_in(&self) -> GateResult<u32> {
        self.body
            .read(|b| b.in_groups.values().map(|v| v.len() as u32).sum())
    }

    /// Outgoing edge ids for one edge type, empty when the group is absent.
    pub fn out_edges_of_type(&self, edge_type: EdgeTypeId) -> GateResult<Vec<ElementId>> {
        self.body
            .read(|b| b.out_groups.get(&edge_type).cloned().unwrap_or_default())
    }

    /// Incoming edge ids for one edge type.
    pub fn in_edges_of_type(&self, edge_type: EdgeTypeId) -> GateResult<Vec<ElementId>> {
        self.body
            .read(|b| b.in_groups.get(&edge_type).cloned().unwrap_or_default())
    }

    /// Snapshot of all outgoing groups in insertion order.
    pub fn out_adjacency(&self) -> GateResult<Vec<(EdgeTypeId, Vec<ElementId>)>> {
        self.body.read(|b| {
            b.out_groups
                .iter()
                .map(|(t, edges)| (*t, edges.clone()))
                .collect()
        })
    }

    /// Snapshot of all incoming groups in insertion order.
    pub fn in_adjacency(&self) -> GateResult<Vec<(EdgeTypeId, Vec<ElementId>)>> {
        self.body.read(|b| {
            b.in_groups
                .iter()
                .map(|(t, edges)| (*t, edges.clone()))
                .collect()
        })
    }

    /// Release excess capacity in the property set and adjacency lists.
    /// Empty groups survive; only spare allocation is returned.
    pub(crate) fn compact(&self) -> GateResult<()> {
        self.body.write(|b| {
            b.properties.compact();
            for edges in b.out_groups.values_mut() {
                edges.shrink_to_fit();
            }
            for edges in b.in_groups.values_mut() {
                edges.shrink_to_fit();
            }
        })
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
