//! Graph engine orchestration
//!
//! The engine owns the sharded element store, the engine-wide gate and the
//! mutable counters. Structural operations (create/remove, property entry
//! points, scans) acquire the engine gate once per call; element-level
//! field access happens inside under each element's own gate.

use crate::algo::AlgorithmRegistry;
use crate::gate::{Gate, GateError};
use crate::graph::{
    ComparisonOperator, Edge, EdgeTypeId, ElementId, GraphElement, PropertyId, PropertyValue,
    Vertex,
};
use crate::index::IndexRegistry;
use crate::store::ShardedStore;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by graph operations.
///
/// Lookups that miss are reported as `Ok(None)` / `Ok(false)` on the read
/// paths, never as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("concurrency conflict: {0}")]
    Conflict(#[from] GateError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Mutable engine-global state: id cursor and live-element counters.
///
/// The cursor starts at `i32::MIN` and only moves forward; tombstoned ids
/// are never handed out again.
#[derive(Debug)]
pub struct EngineState {
    next_id: AtomicI32,
    vertex_count: AtomicU32,
    edge_count: AtomicU32,
}

impl EngineState {
    fn new() -> Self {
        EngineState {
            next_id: AtomicI32::new(i32::MIN),
            vertex_count: AtomicU32::new(0),
            edge_count: AtomicU32::new(0),
        }
    }

    fn allocate_id(&self) -> ElementId {
        self.next_id.fetch_add(1, Ordering::AcqRel)
    }

    /// Current allocation cursor: one past the highest id handed out.
    pub fn cursor(&self) -> ElementId {
        self.next_id.load(Ordering::Acquire)
    }

    pub(crate) fn set_cursor(&self, cursor: ElementId) {
        self.next_id.store(cursor, Ordering::Release);
    }

    fn reset(&self) {
        self.next_id.store(i32::MIN, Ordering::Release);
        self.vertex_count.store(0, Ordering::Release);
        self.edge_count.store(0, Ordering::Release);
    }
}

/// Bookkeeping for best-effort restore after a failed structural delete.
struct UnlinkRecord {
    vertex_id: ElementId,
    edge_type: EdgeTypeId,
    edge_id: ElementId,
    incoming: bool,
}

/// The embedded property-graph engine.
pub struct GraphEngine {
    pub(crate) store: ShardedStore<Arc<GraphElement>>,
    gate: Gate,
    pub(crate) state: EngineState,
    indexes: IndexRegistry,
    algorithms: AlgorithmRegistry,
}

impl std::fmt::Debug for GraphEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphEngine").finish_non_exhaustive()
    }
}

impl GraphEngine {
    pub fn new() -> Self {
        info!("graph engine created");
        GraphEngine {
            store: ShardedStore::new(),
            gate: Gate::new(),
            state: EngineState::new(),
            indexes: IndexRegistry::new(),
            algorithms: AlgorithmRegistry::new(),
        }
    }

    /// Registry of secondary indexes (implementations live outside the
    /// engine core).
    pub fn indexes(&self) -> &IndexRegistry {
        &self.indexes
    }

    /// Registry of path algorithms resolved by name.
    pub fn algorithms(&self) -> &AlgorithmRegistry {
        &self.algorithms
    }

    // ------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------

    /// Create a vertex with the next id and store it.
    pub fn create_vertex(
        &self,
        timestamp: u32,
        properties: Vec<(PropertyId, PropertyValue)>,
    ) -> GraphResult<Arc<GraphElement>> {
        let vertex = self.gate.write_scope(|| {
            let id = self.state.allocate_id();
            let vertex = Arc::new(GraphElement::Vertex(Vertex::new(id, timestamp, properties)));
            self.store.set(id, Arc::clone(&vertex));
            self.state.vertex_count.fetch_add(1, Ordering::AcqRel);
            debug!("created vertex {}", id);
            vertex
        })?;
        Ok(vertex)
    }

    /// Create an edge between two live vertices and link it into both
    /// adjacency groups. Returns `Ok(None)` when either endpoint is missing
    /// or not a vertex; that is not an error.
    pub fn create_edge(
        &self,
        source_id: ElementId,
        edge_type: EdgeTypeId,
        target_id: ElementId,
        timestamp: u32,
        properties: Vec<(PropertyId, PropertyValue)>,
    ) -> GraphResult<Option<Arc<GraphElement>>> {
        self.gate.write_scope(|| -> GraphResult<Option<Arc<GraphElement>>> {
            let source = match self.store.try_get(source_id) {
                Some(el) if el.is_vertex() => el,
                _ => return Ok(None),
            };
            let target = match self.store.try_get(target_id) {
                Some(el) if el.is_vertex() => el,
                _ => return Ok(None),
            };

            let id = self.state.allocate_id();
            let edge = Arc::new(GraphElement::Edge(Edge::new(
                id, timestamp, source_id, target_id, edge_type, properties,
            )));
            self.store.set(id, Arc::clone(&edge));

            if let Some(v) = source.as_vertex() {
                v.add_out_edge(edge_type, id)?;
            }
            if let Some(v) = target.as_vertex() {
                if let Err(e) = v.add_incoming_edge(edge_type, id) {
                    // Undo the half-linked edge before failing.
                    if let Some(s) = source.as_vertex() {
                        let _ = s.remove_out_edge(id);
                    }
                    self.store.clear_slot(id);
                    return Err(e.into());
                }
            }

            self.state.edge_count.fetch_add(1, Ordering::AcqRel);
            debug!("created edge {} ({} -[{}]-> {})", id, source_id, edge_type, target_id);
            Ok(Some(edge))
        })?
    }

    /// Remove an element by id. Returns `Ok(false)` when no such element.
    ///
    /// Removing a vertex cascades to every incident edge and then recomputes
    /// both counters with a full parallel count; removing an edge unlinks it
    /// from both endpoints and decrements the edge counter in O(1).
    ///
    /// A failed unlink aborts the removal and triggers a best-effort restore
    /// of the tombstoned slots and touched groups before the error is
    /// re-raised. The restore is not externally atomic.
    pub fn remove_element(&self, id: ElementId) -> GraphResult<bool> {
        self.gate
            .write_scope(|| self.remove_element_locked(id))?
    }

    fn remove_element_locked(&self, id: ElementId) -> GraphResult<bool> {
        let element = match self.store.try_get(id) {
            Some(el) => el,
            None => return Ok(false),
        };
        self.store.clear_slot(id);

        match &*element {
            GraphElement::Edge(edge) => {
                let mut records = Vec::new();
                if let Err(err) = self.unlink_edge_endpoints(edge, &mut records) {
                    self.restore_after_failed_remove(&[(id, Arc::clone(&element))], &records);
                    return Err(err);
                }
                self.state.edge_count.fetch_sub(1, Ordering::AcqRel);
                debug!("removed edge {}", id);
                Ok(true)
            }
            GraphElement::Vertex(vertex) => {
                self.remove_vertex_cascade(id, Arc::clone(&element), vertex)
            }
        }
    }

    /// Unlink an edge from both endpoints' matching groups, recording every
    /// touched group for rollback.
    fn unlink_edge_endpoints(
        &self,
        edge: &Edge,
        records: &mut Vec<UnlinkRecord>,
    ) -> GraphResult<()> {
        let edge_id = edge.id();
        if let Some(source_el) = self.store.try_get(edge.source_id()) {
            if let Some(source) = source_el.as_vertex() {
                for edge_type in source.remove_out_edge(edge_id)? {
                    records.push(UnlinkRecord {
                        vertex_id: edge.source_id(),
                        edge_type,
                        edge_id,
                        incoming: false,
                    });
                }
            }
        }
        if let Some(target_el) = self.store.try_get(edge.target_id()) {
            if let Some(target) = target_el.as_vertex() {
                for edge_type in target.remove_incoming_edge(edge_id)? {
                    records.push(UnlinkRecord {
                        vertex_id: edge.target_id(),
                        edge_type,
                        edge_id,
                        incoming: true,
                    });
                }
            }
        }
        Ok(())
    }

    fn remove_vertex_cascade(
        &self,
        id: ElementId,
        element: Arc<GraphElement>,
        vertex: &Vertex,
    ) -> GraphResult<bool> {
        let mut removed_slots = vec![(id, element)];
        let mut records: Vec<UnlinkRecord> = Vec::new();

        let outcome = self.cascade_incident_edges(id, vertex, &mut removed_slots, &mut records);
        if let Err(err) = outcome {
            self.restore_after_failed_remove(&removed_slots, &records);
            return Err(err);
        }

        // Counter recomputation is a full parallel count over the store; an
        // accepted simplification on the vertex path.
        self.recount();
        debug!("removed vertex {} and {} incident edges", id, removed_slots.len() - 1);
        Ok(true)
    }

    fn cascade_incident_edges(
        &self,
        vertex_id: ElementId,
        vertex: &Vertex,
        removed_slots: &mut Vec<(ElementId, Arc<GraphElement>)>,
        records: &mut Vec<UnlinkRecord>,
    ) -> GraphResult<()> {
        for (_, edge_ids) in vertex.out_adjacency()? {
            for edge_id in edge_ids {
                // Self-loops show up in both directions but are tombstoned
                // only once.
                let edge_el = match self.store.try_get(edge_id) {
                    Some(el) => el,
                    None => continue,
                };
                self.store.clear_slot(edge_id);
                removed_slots.push((edge_id, Arc::clone(&edge_el)));

                if let Some(edge) = edge_el.as_edge() {
                    let target_id = edge.target_id();
                    if target_id != vertex_id {
                        if let Some(target_el) = self.store.try_get(target_id) {
                            if let Some(target) = target_el.as_vertex() {
                                for edge_type in target.remove_incoming_edge(edge_id)? {
                                    records.push(UnlinkRecord {
                                        vertex_id: target_id,
                                        edge_type,
                                        edge_id,
                                        incoming: true,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        for (_, edge_ids) in vertex.in_adjacency()? {
            for edge_id in edge_ids {
                let edge_el = match self.store.try_get(edge_id) {
                    Some(el) => el,
                    None => continue,
                };
                self.store.clear_slot(edge_id);
                removed_slots.push((edge_id, Arc::clone(&edge_el)));

                if let Some(edge) = edge_el.as_edge() {
                    let source_id = edge.source_id();
                    if source_id != vertex_id {
                        if let Some(source_el) = self.store.try_get(source_id) {
                            if let Some(source) = source_el.as_vertex() {
                                for edge_type in source.remove_out_edge(edge_id)? {
                                    records.push(UnlinkRecord {
                                        vertex_id: source_id,
                                        edge_type,
                                        edge_id,
                                        incoming: false,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Best-effort restore after a failed structural delete: re-insert the
    /// tombstoned slots, re-link the recorded groups, recompute counters.
    /// External observers may have seen the transient inconsistent state.
    fn restore_after_failed_remove(
        &self,
        slots: &[(ElementId, Arc<GraphElement>)],
        records: &[UnlinkRecord],
    ) {
        warn!(
            "structural delete failed; restoring {} slot(s) and {} link(s)",
            slots.len(),
            records.len()
        );
        for (id, element) in slots {
            self.store.set(*id, Arc::clone(element));
        }
        for record in records {
            if let Some(el) = self.store.try_get(record.vertex_id) {
                if let Some(vertex) = el.as_vertex() {
                    let relinked = if record.incoming {
                        vertex.add_incoming_edge(record.edge_type, record.edge_id)
                    } else {
                        vertex.add_out_edge(record.edge_type, record.edge_id)
                    };
                    if relinked.is_err() {
                        warn!(
                            "could not re-link edge {} on vertex {}",
                            record.edge_id, record.vertex_id
                        );
                    }
                }
            }
        }
        self.recount();
    }

    /// Recompute both counters with a shard-parallel count.
    pub(crate) fn recount(&self) {
        let vertices = self.store.count_matching(|el| el.is_vertex());
        let edges = self.store.count_matching(|el| el.is_edge());
        self.state.vertex_count.store(vertices, Ordering::Release);
        self.state.edge_count.store(edges, Ordering::Release);
    }

    // ------------------------------------------------------------
    // Property entry points
    // ------------------------------------------------------------

    /// Add or replace a property on an element. `Ok(None)` when the element
    /// does not exist; `Ok(Some(true))` when an existing entry was updated.
    pub fn try_add_property(
        &self,
        element_id: ElementId,
        property_id: PropertyId,
        value: PropertyValue,
        timestamp: u32,
    ) -> GraphResult<Option<bool>> {
        self.gate.write_scope(|| -> GraphResult<Option<bool>> {
            match self.store.try_get(element_id) {
                Some(el) => Ok(Some(el.try_add_property(property_id, value, timestamp)?)),
                None => Ok(None),
            }
        })?
    }

    /// Remove a property from an element. `Ok(None)` when the element does
    /// not exist; `Ok(Some(true))` when something was removed.
    pub fn try_remove_property(
        &self,
        element_id: ElementId,
        property_id: PropertyId,
        timestamp: u32,
    ) -> GraphResult<Option<bool>> {
        self.gate.write_scope(|| -> GraphResult<Option<bool>> {
            match self.store.try_get(element_id) {
                Some(el) => Ok(Some(el.try_remove_property(property_id, timestamp)?)),
                None => Ok(None),
            }
        })?
    }

    // ------------------------------------------------------------
    // Scans and maintenance
    // ------------------------------------------------------------

    /// Parallel predicate scan over all live elements: keep those whose
    /// property `property_id` compares against `literal` under `op`.
    /// Best-effort snapshot under concurrent mutation.
    pub fn graph_scan(
        &self,
        property_id: PropertyId,
        literal: &PropertyValue,
        op: ComparisonOperator,
    ) -> GraphResult<Vec<Arc<GraphElement>>> {
        let matches = self.gate.read_scope(|| {
            self.store.for_each_matching(|el| match el.get_property(property_id) {
                Ok(Some(value)) => op.evaluate(value.try_compare(literal)),
                _ => false,
            })
        })?;
        Ok(matches)
    }

    /// Sweep every allocated id, compact each live element's internal lists
    /// and recompute the counters. O(allocated range).
    pub fn trim(&self) -> GraphResult<()> {
        self.gate.write_scope(|| {
            let cursor = self.state.cursor();
            self.store.for_each_allocated(cursor, |id, el| {
                if el.compact().is_err() {
                    debug!("element {} busy during trim sweep", id);
                }
            });
            self.recount();
            info!("trim swept allocated range up to cursor {}", cursor);
        })?;
        Ok(())
    }

    /// Drop all elements, reset the id cursor and counters. The index
    /// registry is left untouched.
    pub fn tabula_rasa(&self) -> GraphResult<()> {
        self.gate.write_scope(|| {
            self.store.reset();
            self.state.reset();
            info!("engine state cleared");
        })?;
        Ok(())
    }

    // ------------------------------------------------------------
    // Read surface (also used by external collaborators; everything goes
    // through the engine gate, so collaborators never bypass locking)
    // ------------------------------------------------------------

    pub fn get_element(&self, id: ElementId) -> GraphResult<Option<Arc<GraphElement>>> {
        Ok(self.gate.read_scope(|| self.store.try_get(id))?)
    }

    pub fn get_vertices(&self) -> GraphResult<Vec<Arc<GraphElement>>> {
        Ok(self
            .gate
            .read_scope(|| self.store.for_each_matching(|el| el.is_vertex()))?)
    }

    pub fn get_edges(&self) -> GraphResult<Vec<Arc<GraphElement>>> {
        Ok(self
            .gate
            .read_scope(|| self.store.for_each_matching(|el| el.is_edge()))?)
    }

    pub fn vertex_count(&self) -> u32 {
        self.state.vertex_count.load(Ordering::Acquire)
    }

    pub fn edge_count(&self) -> u32 {
        self.state.edge_count.load(Ordering::Acquire)
    }

    pub fn out_degree(&self, id: ElementId) -> GraphResult<Option<u32>> {
        self.gate.read_scope(|| -> GraphResult<Option<u32>> {
            match self.store.try_get(id) {
                Some(el) => match el.as_vertex() {
                    Some(v) => Ok(Some(v.degree_out()?)),
                    None => Ok(None),
                },
                None => Ok(None),
            }
        })?
    }

    pub fn in_degree(&self, id: ElementId) -> GraphResult<Option<u32>> {
        self.gate.read_scope(|| -> GraphResult<Option<u32>> {
            match self.store.try_get(id) {
                Some(el) => match el.as_vertex() {
                    Some(v) => Ok(Some(v.degree_in()?)),
                    None => Ok(None),
                },
                None => Ok(None),
            }
        })?
    }

    /// Outgoing edges of one type from a vertex. `Ok(None)` when the id is
    /// not a live vertex.
    pub fn out_edges(
        &self,
        id: ElementId,
        edge_type: EdgeTypeId,
    ) -> GraphResult<Option<Vec<Arc<GraphElement>>>> {
        self.gate.read_scope(|| -> GraphResult<Option<Vec<Arc<GraphElement>>>> {
            match self.store.try_get(id) {
                Some(el) => match el.as_vertex() {
                    Some(v) => {
                        let edges = v
                            .out_edges_of_type(edge_type)?
                            .into_iter()
                            .filter_map(|eid| self.store.try_get(eid))
                            .collect();
                        Ok(Some(edges))
                    }
                    None => Ok(None),
                },
                None => Ok(None),
            }
        })?
    }

    /// Incoming edges of one type into a vertex.
    pub fn in_edges(
        &self,
        id: ElementId,
        edge_type: EdgeTypeId,
    ) -> GraphResult<Option<Vec<Arc<GraphElement>>>> {
        self.gate.read_scope(|| -> GraphResult<Option<Vec<Arc<GraphElement>>>> {
            match self.store.try_get(id) {
                Some(el) => match el.as_vertex() {
                    Some(v) => {
                        let edges = v
                            .in_edges_of_type(edge_type)?
                            .into_iter()
                            .filter_map(|eid| self.store.try_get(eid))
                            .collect();
                        Ok(Some(edges))
                    }
                    None => Ok(None),
                },
                None => Ok(None),
            }
        })?
    }

    /// Acquire the engine write gate for the duration of `f`. Used by the
    /// persistence codec to take a consistent snapshot.
    pub(crate) fn with_structural_lock<R>(&self, f: impl FnOnce() -> R) -> GraphResult<R> {
        Ok(self.gate.write_scope(f)?)
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_id(el: &Arc<GraphElement>) -> ElementId {
        el.id()
    }

    #[test]
    fn test_id_allocation_starts_at_min_and_increases() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();
        let b = engine.create_vertex(0, Vec::new()).unwrap();
        let c = engine.create_vertex(0, Vec::new()).unwrap();

        assert_eq!(vertex_id(&a), i32::MIN);
        assert_eq!(vertex_id(&b), i32::MIN + 1);
        assert_eq!(vertex_id(&c), i32::MIN + 2);
        assert_eq!(engine.vertex_count(), 3);
    }

    #[test]
    fn test_tombstoned_id_is_not_reused() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();
        assert!(engine.remove_element(a.id()).unwrap());
        let b = engine.create_vertex(0, Vec::new()).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.id(), i32::MIN + 1);
    }

    #[test]
    fn test_create_edge_links_both_groups() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();
        let b = engine.create_vertex(0, Vec::new()).unwrap();

        let edge = engine
            .create_edge(a.id(), 7, b.id(), 0, Vec::new())
            .unwrap()
            .expect("both endpoints live");
        let edge_id = edge.id();

        let av = a.as_vertex().unwrap();
        let bv = b.as_vertex().unwrap();
        assert_eq!(av.out_edges_of_type(7).unwrap(), vec![edge_id]);
        assert_eq!(bv.in_edges_of_type(7).unwrap(), vec![edge_id]);
        assert_eq!(engine.edge_count(), 1);
    }

    #[test]
    fn test_create_edge_with_missing_endpoint_is_no_edge() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();
        assert!(engine
            .create_edge(a.id(), 7, 12345, 0, Vec::new())
            .unwrap()
            .is_none());
        assert!(engine
            .create_edge(54321, 7, a.id(), 0, Vec::new())
            .unwrap()
            .is_none());
        assert_eq!(engine.edge_count(), 0);
    }

    #[test]
    fn test_edge_endpoint_must_be_vertex() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();
        let b = engine.create_vertex(0, Vec::new()).unwrap();
        let e = engine
            .create_edge(a.id(), 7, b.id(), 0, Vec::new())
            .unwrap()
            .unwrap();
        // An edge id is not a valid endpoint.
        assert!(engine
            .create_edge(a.id(), 7, e.id(), 0, Vec::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_remove_edge_is_local() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();
        let b = engine.create_vertex(0, Vec::new()).unwrap();
        let c = engine.create_vertex(0, Vec::new()).unwrap();

        let e1 = engine
            .create_edge(a.id(), 7, b.id(), 0, Vec::new())
            .unwrap()
            .unwrap();
        let _e2 = engine
            .create_edge(a.id(), 7, c.id(), 0, Vec::new())
            .unwrap()
            .unwrap();

        assert!(engine.remove_element(e1.id()).unwrap());
        assert_eq!(engine.edge_count(), 1);
        assert_eq!(engine.out_degree(a.id()).unwrap(), Some(1));
        assert_eq!(engine.in_degree(b.id()).unwrap(), Some(0));
        assert_eq!(engine.in_degree(c.id()).unwrap(), Some(1));
        assert!(engine.get_element(e1.id()).unwrap().is_none());
    }

    #[test]
    fn test_remove_vertex_cascades() {
        // A holds the first id, B the second; one edge of type 7; removing A
        // must take the edge with it and empty B's incoming group.
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();
        let b = engine.create_vertex(0, Vec::new()).unwrap();
        assert_eq!(a.id(), i32::MIN);

        let edge = engine
            .create_edge(a.id(), 7, b.id(), 0, Vec::new())
            .unwrap()
            .unwrap();

        assert!(engine.remove_element(a.id()).unwrap());
        assert!(engine.get_element(edge.id()).unwrap().is_none());
        assert_eq!(
            b.as_vertex().unwrap().in_edges_of_type(7).unwrap(),
            Vec::<ElementId>::new()
        );
        assert_eq!(engine.vertex_count(), 1);
        assert_eq!(engine.edge_count(), 0);
    }

    #[test]
    fn test_remove_vertex_with_self_loop() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();
        let loop_edge = engine
            .create_edge(a.id(), 3, a.id(), 0, Vec::new())
            .unwrap()
            .unwrap();

        assert!(engine.remove_element(a.id()).unwrap());
        assert!(engine.get_element(loop_edge.id()).unwrap().is_none());
        assert_eq!(engine.vertex_count(), 0);
        assert_eq!(engine.edge_count(), 0);
    }

    #[test]
    fn test_remove_missing_element_is_false() {
        let engine = GraphEngine::new();
        assert!(!engine.remove_element(9999).unwrap());
    }

    #[test]
    fn test_property_entry_points() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, Vec::new()).unwrap();

        assert_eq!(
            engine.try_add_property(a.id(), 1, "x".into(), 10).unwrap(),
            Some(false)
        );
        assert_eq!(
            engine.try_add_property(a.id(), 1, "y".into(), 20).unwrap(),
            Some(true)
        );
        assert_eq!(
            engine.try_remove_property(a.id(), 1, 30).unwrap(),
            Some(true)
        );
        assert_eq!(
            engine.try_remove_property(a.id(), 1, 40).unwrap(),
            Some(false)
        );
        // Missing element: None, not an error.
        assert_eq!(engine.try_add_property(777, 1, "z".into(), 50).unwrap(), None);
    }

    #[test]
    fn test_graph_scan() {
        let engine = GraphEngine::new();
        for age in [25i64, 30, 35, 40] {
            engine.create_vertex(0, vec![(2, age.into())]).unwrap();
        }
        // One element without the property and one with a different type.
        engine.create_vertex(0, Vec::new()).unwrap();
        engine.create_vertex(0, vec![(2, "thirty".into())]).unwrap();

        let literal = PropertyValue::from(30i64);
        let hits = engine
            .graph_scan(2, &literal, ComparisonOperator::GreaterOrEquals)
            .unwrap();
        assert_eq!(hits.len(), 3);

        let exact = engine
            .graph_scan(2, &literal, ComparisonOperator::Equals)
            .unwrap();
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn test_trim_keeps_graph_intact() {
        let engine = GraphEngine::new();
        let a = engine.create_vertex(0, vec![(1, "a".into())]).unwrap();
        let b = engine.create_vertex(0, Vec::new()).unwrap();
        engine
            .create_edge(a.id(), 7, b.id(), 0, Vec::new())
            .unwrap()
            .unwrap();
        engine.remove_element(b.id()).unwrap();

        engine.trim().unwrap();
        assert_eq!(engine.vertex_count(), 1);
        assert_eq!(engine.edge_count(), 0);
        assert_eq!(
            engine
                .get_element(a.id())
                .unwrap()
                .unwrap()
                .get_property(1)
                .unwrap()
                .unwrap()
                .as_string(),
            Some("a")
        );
    }

    #[test]
    fn test_tabula_rasa() {
        let engine = GraphEngine::new();
        engine.create_vertex(0, Vec::new()).unwrap();
        engine.create_vertex(0, Vec::new()).unwrap();
        engine.tabula_rasa().unwrap();

        assert_eq!(engine.vertex_count(), 0);
        assert_eq!(engine.edge_count(), 0);
        // The cursor restarted: the next vertex gets the first id again.
        let v = engine.create_vertex(0, Vec::new()).unwrap();
        assert_eq!(v.id(), i32::MIN);
    }
}
