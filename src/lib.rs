//! Anvaya
//!
//! An embedded, in-process property-graph storage engine. The engine keeps
//! the whole graph in memory behind a two-tier spin gate (one engine-wide,
//! one per element), addresses elements by signed 32-bit ids across a
//! sharded store, and persists itself through partitioned snapshot files
//! written and read in parallel.
//!
//! Ids start at `i32::MIN`, grow monotonically, and are never reused;
//! a removed element leaves a tombstone slot behind.
//!
//! ## Example Usage
//!
//! ```rust
//! use anvaya::{GraphEngine, PropertyValue};
//!
//! let engine = GraphEngine::new();
//!
//! // Create vertices with properties.
//! let alice = engine
//!     .create_vertex(0, vec![(1, PropertyValue::from("Alice"))])
//!     .unwrap();
//! let bob = engine
//!     .create_vertex(0, vec![(1, PropertyValue::from("Bob"))])
//!     .unwrap();
//!
//! // Connect them with a typed edge.
//! let knows = engine
//!     .create_edge(alice.id(), 7, bob.id(), 0, Vec::new())
//!     .unwrap();
//! assert!(knows.is_some());
//!
//! assert_eq!(engine.vertex_count(), 2);
//! assert_eq!(engine.edge_count(), 1);
//! assert_eq!(engine.out_degree(alice.id()).unwrap(), Some(1));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod engine;
pub mod gate;
pub mod graph;
pub mod index;
pub mod persistence;
pub mod store;

// Re-export main types for convenience
pub use engine::{EngineState, GraphEngine, GraphError, GraphResult};

pub use gate::{Gate, GateError, GateResult, Gated};

pub use graph::{
    AdjacencyGroups, ComparisonOperator, Edge, EdgeTypeId, ElementId, GraphElement, PropertyId,
    PropertySet, PropertyValue, Vertex,
};

pub use algo::{AlgorithmRegistry, PathAlgorithm};
pub use index::{GraphIndex, IndexRegistry};
pub use persistence::{
    load, save, saved_plugin_files, PersistenceError, PersistenceResult, PluginFileEntry,
};
pub use store::ShardedStore;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.3.0");
    }
}
